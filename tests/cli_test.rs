mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn chapterize() -> Command {
    Command::cargo_bin("chapterize").unwrap()
}

#[test]
fn test_analyze_lists_chapters() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = common::sample_epub(tmp.path());
    chapterize()
        .args(["analyze", book.to_str().unwrap()])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Chapter 1."))
        .stdout(predicate::str::contains("Foreword."))
        .stdout(predicate::str::contains("Illustration 3.").not());
}

#[test]
fn test_analyze_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = common::sample_epub(tmp.path());
    let out = chapterize()
        .args(["analyze", book.to_str().unwrap(), "--json"])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse JSON");
    let chapters = json["chapters"].as_array().expect("chapters array");
    assert_eq!(chapters.len(), 4);
    assert_eq!(chapters[0]["index"], 1);
    assert_eq!(chapters[0]["title"], "Chapter 1.");
    assert_eq!(chapters[0]["words"], 7);
    assert!(json["diagnostics"].is_array());
}

#[test]
fn test_analyze_json_reports_diagnostics() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = tmp.path().join("partial.epub");
    let toc = common::ncx(&[("Chapter 1", "ch1.xhtml"), ("Chapter 2", "gone.xhtml")]);
    let ch1 = common::xhtml("One", "<p>Only chapter.</p>");
    common::write_epub(&book, &[("toc.ncx", toc.as_str()), ("ch1.xhtml", ch1.as_str())]);

    let out = chapterize()
        .args(["analyze", book.to_str().unwrap(), "--json"])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse JSON");
    assert!(json.get("warnings").is_none());
    let diagnostics = json["diagnostics"].as_array().expect("diagnostics array");
    assert!(diagnostics.iter().any(|d| d["level"] == "warning"
        && d["message"].as_str().unwrap_or_default().contains("gone.xhtml")));
}

#[test]
fn test_show_prints_content() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = common::sample_epub(tmp.path());
    chapterize()
        .args(["show", book.to_str().unwrap(), "2"])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Second chapter text."));
}

#[test]
fn test_show_out_of_range() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = common::sample_epub(tmp.path());
    chapterize()
        .args(["show", book.to_str().unwrap(), "0"])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_export_writes_files() {
    let tmp = tempfile::TempDir::new().unwrap();
    let book = common::sample_epub(tmp.path());
    let out_dir = tempfile::TempDir::new().unwrap();
    chapterize()
        .args([
            "export",
            book.to_str().unwrap(),
            "-o",
            out_dir.path().to_str().unwrap(),
        ])
        .env("CHAPTERIZE_SCRATCH_DIR", tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 of 4 chapters"));

    let chapter = out_dir.path().join("sample").join("01-chapter-1.txt");
    let text = std::fs::read_to_string(chapter).unwrap();
    assert_eq!(text, "Chapter 1 The first chapter opens here.");
}

#[test]
fn test_analyze_unsupported_format() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = tmp.path().join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();
    chapterize()
        .args(["analyze", notes.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document type"));
}

#[test]
fn test_clean_removes_leftovers() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("epub_temp_4242")).unwrap();
    std::fs::create_dir(tmp.path().join("keep-me")).unwrap();
    chapterize()
        .args(["clean", "--scratch-dir", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 scratch workspace"));
    assert!(!tmp.path().join("epub_temp_4242").exists());
    assert!(tmp.path().join("keep-me").exists());
}

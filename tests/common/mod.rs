#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Wrap a body fragment in a minimal XHTML document.
pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
    )
}

/// Build an NCX document from `(label, src)` pairs.
pub fn ncx(points: &[(&str, &str)]) -> String {
    let mut nav = String::new();
    for (i, (label, src)) in points.iter().enumerate() {
        nav.push_str(&format!(
            r#"<navPoint id="np{n}" playOrder="{n}"><navLabel><text>{label}</text></navLabel><content src="{src}"/></navPoint>
"#,
            n = i + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
<navMap>
{nav}</navMap>
</ncx>"#
    )
}

/// Write a zip container with the given `(member name, contents)` entries.
pub fn write_epub(path: &Path, members: &[(&str, &str)]) {
    write_container(path, members, zip::CompressionMethod::Deflated);
}

/// Like [`write_epub`], but members are stored uncompressed so their bytes
/// can be located and damaged in place.
pub fn write_stored_epub(path: &Path, members: &[(&str, &str)]) {
    write_container(path, members, zip::CompressionMethod::Stored);
}

fn write_container(path: &Path, members: &[(&str, &str)], method: zip::CompressionMethod) {
    let file = std::fs::File::create(path).expect("create epub");
    let mut zip = ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("mimetype", stored).expect("mimetype");
    zip.write_all(b"application/epub+zip").expect("write mimetype");

    let options = SimpleFileOptions::default().compression_method(method);
    for (name, contents) in members {
        zip.start_file(*name, options).expect("start member");
        zip.write_all(contents.as_bytes()).expect("write member");
    }
    zip.finish().expect("finish epub");
}

/// Flip the case of the first byte of `needle` inside the file at `path`.
pub fn damage_bytes(path: &Path, needle: &str) {
    let mut bytes = std::fs::read(path).expect("read container");
    let at = bytes
        .windows(needle.len())
        .position(|w| w == needle.as_bytes())
        .expect("needle present");
    bytes[at] ^= 0x20;
    std::fs::write(path, bytes).expect("rewrite container");
}

/// A three-chapter book with one duplicated illustration page.
pub fn sample_epub(dir: &Path) -> PathBuf {
    let path = dir.join("sample.epub");
    let toc = ncx(&[
        ("Chapter 2", "Text/chapter2.xhtml"),
        ("Chapter 1", "Text/chapter1.xhtml#start"),
        ("Illustration 3", "Text/plate3.xhtml"),
        ("Chapter 3", "Text/chapter3.xhtml"),
        ("Foreword", "Text/foreword.xhtml"),
    ]);
    let ch1 = xhtml(
        "Chapter 1",
        "<h1 id=\"start\">Chapter 1</h1><p>The first\nchapter opens here.</p>",
    );
    let ch2 = xhtml("Chapter 2", "<h1>Chapter 2</h1><p>Second chapter text.</p>");
    let ch3 = xhtml("Chapter 3", "<h1>Chapter 3</h1><p>Third body.</p>");
    let plate = xhtml("Plate", "<p>Plate three caption here.</p>");
    let foreword = xhtml("Foreword", "<p>Some words before we begin the story proper.</p>");
    write_epub(
        &path,
        &[
            ("OEBPS/toc.ncx", toc.as_str()),
            ("OEBPS/Text/chapter1.xhtml", ch1.as_str()),
            ("OEBPS/Text/chapter2.xhtml", ch2.as_str()),
            ("OEBPS/Text/chapter3.xhtml", ch3.as_str()),
            ("OEBPS/Text/plate3.xhtml", plate.as_str()),
            ("OEBPS/Text/foreword.xhtml", foreword.as_str()),
            ("OEBPS/Styles/style.css", "p { margin: 0 }"),
        ],
    );
    path
}

/// Text-showing operations, one `BT`/`ET` block per `(font size, y, bytes)`.
pub fn text_operations(lines: &[(i64, i64, &[u8])]) -> Vec<Operation> {
    let mut operations = Vec::new();
    for (size, y, text) in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
        operations.push(Operation::new("Td", vec![72.into(), (*y).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

/// Write a one-page PDF; each `(font size, y, text)` becomes one line.
pub fn write_pdf(path: &Path, lines: &[(i64, i64, &str)]) {
    let lines: Vec<(i64, i64, &[u8])> = lines.iter().map(|(s, y, t)| (*s, *y, t.as_bytes())).collect();
    write_pdf_page(path, None, text_operations(&lines), None);
}

/// Write a one-page PDF whose font `F1` declares `encoding`. `form`, when
/// given, becomes Form XObject `Fm1` with the given matrix and operations.
pub fn write_pdf_page(
    path: &Path,
    encoding: Option<&str>,
    operations: Vec<Operation>,
    form: Option<([i64; 6], Vec<Operation>)>,
) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    };
    if let Some(encoding) = encoding {
        font.set("Encoding", Object::Name(encoding.as_bytes().to_vec()));
    }
    let font_id = doc.add_object(font);

    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    if let Some((matrix, form_operations)) = form {
        let body = Content {
            operations: form_operations,
        };
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Matrix" => matrix.iter().map(|&v| v.into()).collect::<Vec<Object>>(),
            },
            body.encode().expect("encode form"),
        ));
        resources.set("XObject", dictionary! { "Fm1" => form_id });
    }
    let resources_id = doc.add_object(resources);

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save pdf");
}

/// Names of scratch workspaces currently under `root`.
pub fn scratch_dirs(root: &Path) -> Vec<String> {
    std::fs::read_dir(root)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|n| n.starts_with(chapterize::scratch::EPUB_SCRATCH_PREFIX))
                .collect()
        })
        .unwrap_or_default()
}

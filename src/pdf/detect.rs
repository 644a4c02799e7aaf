use crate::chapter::Chapter;
use crate::diagnostics::Diagnostics;
use crate::pdf::layout::TextLine;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Chapter|Chapitre|Part|Section|Titre)\s+\d+.*$").expect("valid regex")
});

static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Characters after which a line may keep its hard break.
const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ':', '"', '\''];

/// True when the line reads like `Chapter 3`, `Part II 4`, `Titre 1 ...`.
pub fn is_heading_line(text: &str) -> bool {
    HEADING.is_match(text)
}

/// `ratio` times the largest font size, or `0` when there are no lines.
pub fn font_size_threshold(lines: &[TextLine], ratio: f32) -> f32 {
    lines
        .iter()
        .map(|l| l.font_size)
        .reduce(f32::max)
        .map_or(0.0, |max| max * ratio)
}

/// Re-flow a chapter body into prose.
///
/// A line keeps its trailing line break only when it ends in terminal
/// punctuation and the next line starts with an uppercase letter; every
/// other break becomes a space.
pub fn format_chapter_text(text: &str) -> String {
    let text = BLANK_LINE_RUN.replace_all(text, "\n\n");
    let lines: Vec<&str> = text.split('\n').collect();

    let mut out = String::with_capacity(text.len());
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        let Some(next) = lines.get(i + 1) else {
            continue;
        };
        let next_starts_upper = next
            .trim()
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        if line.ends_with(TERMINAL_PUNCTUATION) && next_starts_upper {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }

    SPACE_RUN.replace_all(&out, " ").trim().to_string()
}

fn close_chapter(title: String, body: &[&str], chapters: &mut Vec<Chapter>) {
    let content = format_chapter_text(&body.join("\n"));
    chapters.push(Chapter::new(title, content));
}

/// Split laid-out PDF lines into chapters.
///
/// A line opens a chapter when it matches the heading pattern or its font
/// size reaches `ratio` of the document maximum. Lines before the first
/// heading are dropped.
pub fn detect_chapters(lines: &[TextLine], ratio: f32, diagnostics: &mut Diagnostics) -> Vec<Chapter> {
    let threshold = font_size_threshold(lines, ratio);
    let mut chapters = Vec::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in lines {
        if is_heading_line(&line.text) || line.font_size >= threshold {
            if let Some(title) = current.take() {
                close_chapter(title, &body, &mut chapters);
                body.clear();
            }
            current = Some(line.text.clone());
        } else if current.is_some() {
            body.push(&line.text);
        }
    }
    if let Some(title) = current {
        close_chapter(title, &body, &mut chapters);
    }

    if chapters.is_empty() {
        diagnostics.info(
            "no chapters detected; no line matched the heading pattern or font-size threshold",
        );
    }
    chapters
}

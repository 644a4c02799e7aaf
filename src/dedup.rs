//! Duplicate removal and numeric ordering of detected chapters.

use crate::chapter::Chapter;
use crate::diagnostics::Diagnostics;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static VALID_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:chapitre|chapter)\s+\d+\.?$").expect("valid regex"));

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// True for titles like `Chapter 12` or `chapitre 3.` and nothing else.
pub fn is_valid_chapter_title(title: &str) -> bool {
    VALID_TITLE.is_match(&title.trim().to_lowercase())
}

/// First integer appearing anywhere in the title.
pub fn chapter_number(title: &str) -> Option<u64> {
    FIRST_NUMBER
        .find(title)
        .and_then(|m| m.as_str().parse().ok())
}

/// Drop accidental duplicates and order chapters by their title number.
///
/// Chapters with the same word count are treated as one duplicate cluster:
/// every member with a valid chapter title survives, or the first member
/// when none has one. Survivors are stably sorted by [`chapter_number`],
/// untitled-by-number chapters last.
pub fn clean_chapters(chapters: Vec<Chapter>, diagnostics: &mut Diagnostics) -> Vec<Chapter> {
    let mut groups: Vec<(usize, Vec<Chapter>)> = Vec::new();
    let mut group_index: HashMap<usize, usize> = HashMap::new();
    for chapter in chapters {
        let words = chapter.word_count();
        let idx = *group_index.entry(words).or_insert_with(|| {
            groups.push((words, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(chapter);
    }

    let mut cleaned = Vec::new();
    for (words, mut group) in groups {
        if group.len() == 1 {
            cleaned.append(&mut group);
            continue;
        }

        let titles: Vec<&str> = group.iter().map(|c| c.title.as_str()).collect();
        diagnostics.info(format!(
            "duplicate chapters detected ({words} words): {titles:?}"
        ));

        if group.iter().any(|c| is_valid_chapter_title(&c.title)) {
            cleaned.extend(group.into_iter().filter(|c| is_valid_chapter_title(&c.title)));
        } else {
            diagnostics.warn(format!(
                "no valid chapter title among duplicates: {titles:?}"
            ));
            cleaned.extend(group.into_iter().next());
        }
    }

    cleaned.sort_by_key(|c| {
        let number = chapter_number(&c.title);
        (number.is_none(), number)
    });
    cleaned
}

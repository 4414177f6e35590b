//! Shared text normalization
//!
//! Both the extractor and the classifier see text through these helpers so
//! that a keyword table and an alias table agree on what a "word" is.

use std::collections::BTreeMap;

/// Map Arabic-Indic (U+0660..) and Extended Arabic-Indic (U+06F0..) digits to ASCII.
pub fn fold_digit(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        _ => c,
    }
}

/// Arabic-script vowel marks; dropped without splitting the word.
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

pub fn is_arabic_script(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Lowercase, fold digits and strip punctuation. Currency symbols survive
/// as their own tokens.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        let c = fold_digit(c);
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            out.push(c);
        } else if matches!(c, '$' | '€' | '£' | '₨') {
            out.push(' ');
            out.push(c);
            out.push(' ');
        } else {
            out.push(' ');
        }
    }
    out
}

/// Clean the text and rewrite spelling variants to their canonical form.
pub fn normalize(text: &str, variants: &BTreeMap<String, String>) -> String {
    clean(text)
        .split_whitespace()
        .map(|token| variants.get(token).map(String::as_str).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word (or whole-phrase) containment on normalized text.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let haystack = format!(" {} ", normalized);
    let needle = format!(" {} ", phrase.trim());
    haystack.contains(&needle)
}

/// Byte offset just past the first whole-phrase match.
pub fn phrase_end(normalized: &str, phrase: &str) -> Option<usize> {
    let haystack = format!(" {} ", normalized);
    let needle = format!(" {} ", phrase.trim());
    haystack
        .find(&needle)
        .map(|start| (start + needle.len()).saturating_sub(2).min(normalized.len()))
}

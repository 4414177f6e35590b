//! Translation layer
//!
//! Decides the reply language for a session and fills in the Urdu text of
//! a SkillResult from the same template the English text came from.

pub mod templates;

pub use templates::{format_amount, BudgetLine, ReplyTemplate, TaskLine};

use crate::config::RouterConfig;
use crate::models::{Language, LanguageHint, SkillResult};
use crate::text;
use std::collections::{BTreeMap, HashSet};

pub const INVESTMENT_DISCLAIMER_EN: &str =
    "This is an illustrative projection, not financial advice.";
pub const INVESTMENT_DISCLAIMER_UR: &str = "یہ صرف ایک اندازہ ہے، مالی مشورہ نہیں۔";

/// Latin-script inputs shorter than this never switch a session to English.
const MIN_ENGLISH_TOKENS: usize = 3;

pub struct Translator {
    roman_urdu_markers: HashSet<String>,
    spelling_variants: BTreeMap<String, String>,
}

impl Translator {
    pub fn new(config: &RouterConfig) -> Self {
        let roman_urdu_markers = config
            .roman_urdu_markers
            .iter()
            .map(|m| text::normalize(m, &config.spelling_variants))
            .collect();

        Self {
            roman_urdu_markers,
            spelling_variants: config.spelling_variants.clone(),
        }
    }

    /// Script detection. `None` when the input is too short to tell.
    pub fn detect(&self, input: &str) -> Option<Language> {
        if input.chars().any(text::is_arabic_script) {
            return Some(Language::Ur);
        }

        let normalized = text::normalize(input, &self.spelling_variants);
        let words: Vec<&str> = normalized
            .split_whitespace()
            .filter(|w| w.chars().all(char::is_alphabetic))
            .collect();

        if words.iter().any(|w| self.roman_urdu_markers.contains(*w)) {
            Some(Language::Ur)
        } else if words.len() >= MIN_ENGLISH_TOKENS {
            Some(Language::En)
        } else {
            None
        }
    }

    /// An explicit hint wins; otherwise detection, falling back to the
    /// session's current language.
    pub fn resolve_language(&self, hint: LanguageHint, input: &str, current: Language) -> Language {
        match hint {
            LanguageHint::En => Language::En,
            LanguageHint::Ur => Language::Ur,
            LanguageHint::Auto => self.detect(input).unwrap_or(current),
        }
    }

    /// Fill the Urdu text when the session speaks Urdu. Results that
    /// already carry Urdu text come back unchanged.
    pub fn render(&self, mut result: SkillResult, language: Language) -> SkillResult {
        if language == Language::Ur && result.reply_text_ur.is_none() {
            result.reply_text_ur = Some(result.reply.render_ur());
        }
        result
    }

    pub fn disclaimer(language: Language) -> &'static str {
        match language {
            Language::En => INVESTMENT_DISCLAIMER_EN,
            Language::Ur => INVESTMENT_DISCLAIMER_UR,
        }
    }
}

//! Entity extraction
//!
//! Pulls amount, currency, category, date and risk level out of raw,
//! bilingual text. Extraction never fails: anything that does not parse is
//! simply left absent.

pub mod amount;
pub mod date;

use crate::config::RouterConfig;
use crate::models::{ExtractedEntities, LanguageHint, RiskLevel, Slot, TransactionKind};
use crate::text::{self, fold_digit};
use amount::Token;
use chrono::NaiveDate;
use date::RelativeDateRules;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

lazy_static! {
    /// "rs500", "rs.500", "pkr1,500"
    static ref PREFIXED_CURRENCY: Regex =
        Regex::new(r"^(rs\.?|pkr|usd)(\d[\d,]*(?:\.\d+)?)$").unwrap();
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '₨'];

/// Bilingual entity extractor. Lookup tables are prepared once from config.
pub struct EntityExtractor {
    config: Arc<RouterConfig>,
    /// (normalized alias, canonical category), longest alias first
    category_aliases: Vec<(String, String)>,
    currency_aliases: HashMap<String, String>,
    past_markers: HashSet<String>,
    expense_markers: HashSet<String>,
    income_markers: HashSet<String>,
    task_triggers: Vec<String>,
}

impl EntityExtractor {
    pub fn new(config: Arc<RouterConfig>) -> Self {
        let variants = &config.spelling_variants;

        let mut category_aliases: Vec<(String, String)> = config
            .category_aliases
            .iter()
            .flat_map(|(category, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (text::normalize(alias, variants), category.clone()))
            })
            .filter(|(alias, _)| !alias.is_empty())
            .collect();
        category_aliases.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        let currency_aliases = config
            .currency_aliases
            .iter()
            .flat_map(|(code, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (alias.to_lowercase(), code.clone()))
            })
            .collect();

        let normalize_set = |words: &[String]| -> HashSet<String> {
            words.iter().map(|w| text::normalize(w, variants)).collect()
        };

        let mut task_triggers: Vec<String> = config
            .task_triggers
            .iter()
            .map(|t| text::normalize(t, variants))
            .collect();
        task_triggers.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            past_markers: normalize_set(&config.past_tense_markers),
            expense_markers: normalize_set(&config.expense_markers),
            income_markers: normalize_set(&config.income_markers),
            category_aliases,
            currency_aliases,
            task_triggers,
            config,
        }
    }

    /// Extract every recognizable entity. `today` anchors relative dates.
    pub fn extract(&self, raw: &str, hint: LanguageHint, today: NaiveDate) -> ExtractedEntities {
        let normalized = text::normalize(raw, &self.config.spelling_variants);
        let tokens = self.tokenize(raw);
        let mut entities = ExtractedEntities::default();

        // Dates first so their digits are not read as amounts.
        let mut date_tokens = Vec::new();
        for (index, token) in tokens.iter().enumerate() {
            if let Some(date) = date::parse_absolute(&token.text) {
                if entities.date.is_none() {
                    entities.date = Some(date);
                    entities.raw_spans.insert("date".into(), token.text.clone());
                }
                date_tokens.push(index);
            }
        }
        if entities.date.is_none() {
            let rules = RelativeDateRules {
                past_markers: &self.past_markers,
                default_direction: self.config.locale.relative_day_default,
                urdu_terms: hint != LanguageHint::En,
            };
            if let Some(found) = date::parse_relative(&normalized, today, &rules) {
                if found.low_confidence {
                    warn!(
                        span = %found.span,
                        resolved = %found.date,
                        "Ambiguous relative day resolved by default direction"
                    );
                }
                entities.date = Some(found.date);
                entities.date_is_relative = found.relative;
                entities.date_low_confidence = found.low_confidence;
                entities.raw_spans.insert("date".into(), found.span);
            }
        }
        entities.period = date::parse_period(&normalized);

        let (amount, horizon) = amount::find_amount(&tokens, &date_tokens);
        if let Some(found) = amount {
            entities.amount = Some(found.value);
            entities.raw_spans.insert("amount".into(), found.span);
        }
        entities.horizon_months = horizon;

        if let Some((alias, code)) = self.find_currency(&tokens) {
            entities.currency = Some(code);
            entities.raw_spans.insert("currency".into(), alias);
        }

        if let Some((alias, category)) = self
            .category_aliases
            .iter()
            .find(|(alias, _)| text::contains_phrase(&normalized, alias))
        {
            entities.category = Some(category.clone());
            entities.raw_spans.insert("category".into(), alias.clone());
        }

        if let Some((word, level)) = self.find_risk(&normalized) {
            entities.risk_level = Some(level);
            entities.raw_spans.insert("risk_level".into(), word);
        }

        entities.transaction_kind = normalized.split_whitespace().find_map(|token| {
            if self.expense_markers.contains(token) {
                Some(TransactionKind::Expense)
            } else if self.income_markers.contains(token) {
                Some(TransactionKind::Income)
            } else {
                None
            }
        });

        entities.title = self.find_title(&normalized);

        debug!(
            amount = ?entities.amount,
            category = ?entities.category,
            date = ?entities.date,
            "Entities extracted"
        );

        entities
    }

    /// Lowercase, fold digits, split currency prefixes and trim edge
    /// punctuation, keeping separators inside numerals.
    fn tokenize(&self, raw: &str) -> Vec<Token> {
        let folded: String = raw
            .chars()
            .flat_map(char::to_lowercase)
            .map(fold_digit)
            .collect();

        let mut tokens = Vec::new();
        for piece in folded.split_whitespace() {
            let mut piece = piece.trim_matches(|c: char| {
                !(c.is_alphanumeric() || c == '%' || CURRENCY_SYMBOLS.contains(&c))
            });

            if let Some(symbol) = piece.chars().next().filter(|c| CURRENCY_SYMBOLS.contains(c)) {
                tokens.push(Token {
                    text: symbol.to_string(),
                    percent: false,
                });
                piece = &piece[symbol.len_utf8()..];
            }

            let percent = piece.ends_with('%');
            let piece = piece.trim_end_matches('%');
            if piece.is_empty() {
                if percent {
                    tokens.push(Token {
                        text: "%".into(),
                        percent: false,
                    });
                }
                continue;
            }

            if let Some(caps) = PREFIXED_CURRENCY.captures(piece) {
                tokens.push(Token {
                    text: caps[1].trim_end_matches('.').to_string(),
                    percent: false,
                });
                tokens.push(Token {
                    text: caps[2].to_string(),
                    percent,
                });
                continue;
            }

            let text = self
                .config
                .spelling_variants
                .get(piece)
                .cloned()
                .unwrap_or_else(|| piece.to_string());
            tokens.push(Token { text, percent });
        }
        tokens
    }

    fn find_currency(&self, tokens: &[Token]) -> Option<(String, String)> {
        tokens.iter().find_map(|token| {
            let word = token.text.trim_end_matches('.');
            self.currency_aliases
                .get(word)
                .map(|code| (word.to_string(), code.clone()))
        })
    }

    fn find_risk(&self, normalized: &str) -> Option<(String, RiskLevel)> {
        normalized.split_whitespace().find_map(|token| {
            self.config
                .risk_synonyms
                .get(token)
                .map(|level| (token.to_string(), *level))
        })
    }

    /// Extract from an answer to a clarifying question. A bare answer to
    /// "what is the task title?" is the title itself.
    pub fn extract_answer(
        &self,
        raw: &str,
        hint: LanguageHint,
        today: NaiveDate,
        awaited: &[Slot],
    ) -> ExtractedEntities {
        let mut entities = self.extract(raw, hint, today);
        if entities.title.is_none() && awaited.contains(&Slot::Title) {
            let normalized = text::normalize(raw, &self.config.spelling_variants);
            let title = clean_title(&normalized);
            if !title.is_empty() {
                debug!(title = %title, "Answer taken as task title");
                entities.title = Some(title);
            }
        }
        entities
    }

    /// Text after a task trigger ("remind me to ..."), or before it when the
    /// trigger ends the sentence ("... yaad dilana").
    fn find_title(&self, normalized: &str) -> Option<String> {
        for trigger in &self.task_triggers {
            let Some(end) = text::phrase_end(normalized, trigger) else {
                continue;
            };
            let start = end - trigger.len();

            let after = clean_title(&normalized[end..]);
            if !after.is_empty() {
                return Some(after);
            }
            let before = clean_title(&normalized[..start]);
            if !before.is_empty() {
                return Some(before);
            }
        }
        None
    }
}

/// Drop day words and filler from a task title.
fn clean_title(fragment: &str) -> String {
    const FILLER: &[&str] = &["to", "ka", "ki", "ke", "mujhe", "me", "please"];
    let words: Vec<&str> = fragment
        .split_whitespace()
        .filter(|word| !date::is_day_word(word))
        .collect();

    let start = words.iter().position(|w| !FILLER.contains(w)).unwrap_or(words.len());
    let end = words
        .iter()
        .rposition(|w| !FILLER.contains(w))
        .map(|i| i + 1)
        .unwrap_or(start);

    if start >= end {
        return String::new();
    }
    words[start..end].join(" ")
}

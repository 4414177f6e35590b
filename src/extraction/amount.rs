//! Amount and horizon parsing
//!
//! Works on pre-split tokens so that numerals, number words and magnitude
//! words can be combined across token boundaries ("50 hazar", "do lakh",
//! "2 lakh 50 hazar", "fifty-five thousand").

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMERAL: Regex =
        Regex::new(r"^\d{1,3}(?:,\d{2,3})+(?:\.\d+)?$|^\d+(?:\.\d+)?$").unwrap();
    static ref SUFFIXED: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(k|m)$").unwrap();
}

/// Magnitude words and their multipliers.
const MAGNITUDES: &[(&str, f64)] = &[
    ("hundred", 1e2),
    ("sau", 1e2),
    ("سو", 1e2),
    ("thousand", 1e3),
    ("hazar", 1e3),
    ("ہزار", 1e3),
    ("k", 1e3),
    ("lakh", 1e5),
    ("لاکھ", 1e5),
    ("million", 1e6),
    ("m", 1e6),
    ("crore", 1e7),
    ("کروڑ", 1e7),
];

const UNITS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Roman-Urdu number words; only trusted in front of a magnitude word.
const URDU_NUMBERS: &[(&str, f64)] = &[
    ("aadha", 0.5),
    ("ek", 1.0),
    ("do", 2.0),
    ("teen", 3.0),
    ("char", 4.0),
    ("chaar", 4.0),
    ("paanch", 5.0),
    ("panch", 5.0),
    ("chay", 6.0),
    ("chhe", 6.0),
    ("saat", 7.0),
    ("aath", 8.0),
    ("nau", 9.0),
    ("das", 10.0),
    ("bees", 20.0),
    ("pachees", 25.0),
    ("tees", 30.0),
    ("chalees", 40.0),
    ("pachas", 50.0),
    ("sau", 100.0),
];

const PERCENT_WORDS: &[&str] = &["%", "percent", "pct", "fisad", "فیصد"];

const YEAR_UNITS: &[&str] = &["year", "years", "yr", "yrs", "saal", "baras", "سال"];
const MONTH_UNITS: &[&str] = &["month", "months", "mahine", "maah", "ماہ", "مہینے"];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// The token carried a trailing '%'.
    pub percent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmountMatch {
    pub value: f64,
    pub span: String,
}

pub fn magnitude(word: &str) -> Option<f64> {
    MAGNITUDES
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, multiplier)| *multiplier)
}

pub fn parse_numeral(token: &str) -> Option<f64> {
    if NUMERAL.is_match(token) {
        return token.replace(',', "").parse::<f64>().ok();
    }
    None
}

/// English number words 0–100. Returns the value and tokens consumed.
pub fn parse_number_words(tokens: &[Token], start: usize) -> Option<(f64, usize)> {
    let word = tokens.get(start)?.text.as_str();

    if word == "hundred" {
        return None;
    }
    if let Some(pos) = UNITS.iter().position(|u| *u == word) {
        return Some((pos as f64, 1));
    }
    if word == "a" {
        // "a hundred", "a thousand"
        return tokens
            .get(start + 1)
            .and_then(|next| magnitude(&next.text))
            .map(|_| (1.0, 1));
    }

    if let Some((tens_word, unit_word)) = word.split_once('-') {
        let tens = TENS.iter().find(|(t, _)| *t == tens_word)?.1;
        let unit = UNITS.iter().position(|u| *u == unit_word).filter(|u| (1..10).contains(u))?;
        return Some(((tens + unit as u32) as f64, 1));
    }

    let tens = TENS.iter().find(|(t, _)| *t == word)?.1;
    let unit = tokens
        .get(start + 1)
        .and_then(|next| UNITS.iter().position(|u| *u == next.text))
        .filter(|u| (1..10).contains(u));

    match unit {
        Some(u) => Some(((tens + u as u32) as f64, 2)),
        None => Some((tens as f64, 1)),
    }
}

fn urdu_number(word: &str) -> Option<f64> {
    URDU_NUMBERS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, value)| *value)
}

fn is_percent(tokens: &[Token], index: usize) -> bool {
    tokens[index].percent
        || tokens
            .get(index + 1)
            .map(|next| PERCENT_WORDS.contains(&next.text.as_str()))
            .unwrap_or(false)
}

fn time_unit_months(word: &str) -> Option<u32> {
    if YEAR_UNITS.contains(&word) {
        Some(12)
    } else if MONTH_UNITS.contains(&word) {
        Some(1)
    } else {
        None
    }
}

/// A bare number at `start`: numeral, English words, or a Roman-Urdu word
/// followed by a magnitude.
fn number_at(tokens: &[Token], start: usize) -> Option<(f64, usize)> {
    let word = tokens.get(start)?.text.as_str();

    if let Some(value) = parse_numeral(word) {
        return Some((value, 1));
    }
    if let Some(found) = parse_number_words(tokens, start) {
        return Some(found);
    }
    if let Some(value) = urdu_number(word) {
        let followed_by_magnitude = tokens
            .get(start + 1)
            .map(|next| magnitude(&next.text).is_some())
            .unwrap_or(false);
        if followed_by_magnitude {
            return Some((value, 1));
        }
    }
    None
}

/// Read one "number [magnitude]" group.
fn group_at(tokens: &[Token], start: usize) -> Option<(f64, Option<f64>, usize)> {
    let (value, used) = number_at(tokens, start)?;
    let next = start + used;
    match tokens.get(next).and_then(|t| magnitude(&t.text)) {
        Some(multiplier) => Some((value, Some(multiplier), used + 1)),
        None => Some((value, None, used)),
    }
}

/// Find the first monetary amount. Percentages and durations are skipped;
/// durations are returned separately as months.
pub fn find_amount(tokens: &[Token], skip: &[usize]) -> (Option<AmountMatch>, Option<u32>) {
    let mut horizon = None;
    let mut i = 0;

    while i < tokens.len() {
        if skip.contains(&i) {
            i += 1;
            continue;
        }

        // "50k", "2m"
        if let Some(caps) = SUFFIXED.captures(&tokens[i].text) {
            let value = caps[1].parse::<f64>().ok();
            let multiplier = magnitude(&caps[2]);
            if let (Some(value), Some(multiplier)) = (value, multiplier) {
                if !is_percent(tokens, i) {
                    return (
                        Some(AmountMatch {
                            value: value * multiplier,
                            span: tokens[i].text.clone(),
                        }),
                        horizon,
                    );
                }
            }
        }

        let Some((value, multiplier, used)) = group_at(tokens, i) else {
            i += 1;
            continue;
        };
        let last = i + used - 1;

        if is_percent(tokens, last) {
            i += used;
            continue;
        }
        if let Some(months) = tokens.get(last + 1).and_then(|t| time_unit_months(&t.text)) {
            if horizon.is_none() {
                horizon = Some((value * multiplier.unwrap_or(1.0) * months as f64).round() as u32);
            }
            i += used + 1;
            continue;
        }

        let mut total = value * multiplier.unwrap_or(1.0);
        let mut end = i + used;
        let mut last_multiplier = multiplier;

        // "2 lakh 50 hazar", "two thousand five hundred", "1 hazar 500"
        while let Some(current) = last_multiplier {
            match group_at(tokens, end) {
                Some((next_value, Some(next_multiplier), next_used))
                    if next_multiplier < current =>
                {
                    total += next_value * next_multiplier;
                    end += next_used;
                    last_multiplier = Some(next_multiplier);
                }
                Some((next_value, None, next_used))
                    if next_value < current
                        && !is_percent(tokens, end + next_used - 1)
                        && tokens
                            .get(end + next_used)
                            .and_then(|t| time_unit_months(&t.text))
                            .is_none() =>
                {
                    total += next_value;
                    end += next_used;
                    last_multiplier = None;
                }
                _ => break,
            }
        }

        let span = tokens[i..end]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        // Keep scanning for a horizon after the amount.
        let mut j = end;
        while j < tokens.len() && horizon.is_none() {
            if let Some((v, m, used)) = group_at(tokens, j) {
                let last = j + used - 1;
                if let Some(months) = tokens.get(last + 1).and_then(|t| time_unit_months(&t.text)) {
                    horizon = Some((v * m.unwrap_or(1.0) * months as f64).round() as u32);
                }
                j += used;
            } else {
                j += 1;
            }
        }

        return (Some(AmountMatch { value: total, span }), horizon);
    }

    (None, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|t| Token {
                text: t.trim_end_matches('%').to_string(),
                percent: t.ends_with('%'),
            })
            .collect()
    }

    fn amount(text: &str) -> Option<f64> {
        find_amount(&tokens(text), &[]).0.map(|m| m.value)
    }

    #[test]
    fn test_numeral_with_magnitude() {
        assert_eq!(amount("50 hazar"), Some(50_000.0));
        assert_eq!(amount("2 lakh"), Some(200_000.0));
        assert_eq!(amount("1.5 lakh"), Some(150_000.0));
        assert_eq!(amount("3 crore"), Some(30_000_000.0));
        assert_eq!(amount("2 million"), Some(2_000_000.0));
    }

    #[test]
    fn test_number_words() {
        assert_eq!(amount("fifty thousand"), Some(50_000.0));
        assert_eq!(amount("five"), Some(5.0));
        assert_eq!(amount("fifty five"), Some(55.0));
        assert_eq!(amount("fifty-five thousand"), Some(55_000.0));
        assert_eq!(amount("a hundred"), Some(100.0));
        assert_eq!(amount("do lakh"), Some(200_000.0));
    }

    #[test]
    fn test_roman_urdu_word_needs_magnitude() {
        assert_eq!(amount("how do i"), None);
    }

    #[test]
    fn test_separators_and_compound_groups() {
        assert_eq!(amount("1,500"), Some(1_500.0));
        assert_eq!(amount("1,00,000"), Some(100_000.0));
        assert_eq!(amount("2 lakh 50 hazar"), Some(250_000.0));
        assert_eq!(amount("1 hazar 500"), Some(1_500.0));
        assert_eq!(amount("50k"), Some(50_000.0));
    }

    #[test]
    fn test_percent_is_not_an_amount() {
        assert_eq!(amount("guarantee 20% returns"), None);
        assert_eq!(amount("20 percent returns"), None);
    }

    #[test]
    fn test_duration_becomes_horizon() {
        let (found, horizon) = find_amount(&tokens("invest 50 hazar for 5 years"), &[]);
        assert_eq!(found.map(|m| m.value), Some(50_000.0));
        assert_eq!(horizon, Some(60));

        let (found, horizon) = find_amount(&tokens("6 mahine 10000"), &[]);
        assert_eq!(found.map(|m| m.value), Some(10_000.0));
        assert_eq!(horizon, Some(6));
    }
}

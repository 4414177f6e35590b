//! Router configuration
//!
//! Every lookup table the extractor and classifier consult lives here, so
//! the matching logic itself carries no vocabulary. Tables ship with
//! built-in defaults and can be replaced from a TOML file.

mod defaults;

use crate::error::RouterError;
use crate::models::{Intent, RiskLevel};
use crate::safety::CLARIFICATION_THRESHOLD;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Direction "kal"/"parson" resolve to when no tense marker settles it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelativeDayDefault {
    Future,
    Past,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedKeyword {
    pub phrase: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentKeywords {
    pub intent: Intent,
    pub keywords: Vec<WeightedKeyword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
    /// Maximum turns kept per session (N_max).
    pub context_window: usize,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 1800,
            context_window: 20,
            sweep_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub timeout_ms: u64,
    pub ledger_base_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            ledger_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Best score below this yields UNKNOWN.
    pub min_confidence: f32,
    /// Ceiling for an intent whose required slots are not all filled.
    pub missing_slot_cap: f32,
    pub completeness_bonus: f32,
    /// Confidence of a continuation that completes the pending intent.
    pub continuation_confidence: f32,
    pub greeting_max_tokens: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.35,
            missing_slot_cap: 0.45,
            completeness_bonus: 0.2,
            continuation_confidence: 0.9,
            greeting_max_tokens: 4,
        }
    }
}

/// Annual return used for illustrative projections, per risk level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskReturnTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskReturnTable {
    fn default() -> Self {
        Self {
            low: 0.05,
            medium: 0.10,
            high: 0.16,
        }
    }
}

impl RiskReturnTable {
    pub fn annual_rate(&self, risk: RiskLevel) -> f64 {
        match risk {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub default_currency: String,
    pub relative_day_default: RelativeDayDefault,
    pub default_horizon_months: u32,
    pub default_category: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_currency: "PKR".to_string(),
            relative_day_default: RelativeDayDefault::Future,
            default_horizon_months: 12,
            default_category: "Other".to_string(),
        }
    }
}

/// Top-level router configuration (from router.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub session: SessionConfig,
    pub gateway: GatewayConfig,
    pub classifier: ClassifierConfig,
    pub locale: LocaleConfig,
    pub risk_returns: RiskReturnTable,
    /// Canonical category → surface forms.
    pub category_aliases: BTreeMap<String, Vec<String>>,
    /// ISO currency code → surface forms.
    pub currency_aliases: BTreeMap<String, Vec<String>>,
    pub risk_synonyms: BTreeMap<String, RiskLevel>,
    /// Roman-Urdu spelling variant → canonical spelling.
    pub spelling_variants: BTreeMap<String, String>,
    pub greetings: Vec<String>,
    pub intent_keywords: Vec<IntentKeywords>,
    /// OFF_TOPIC keywords that mark the request as advice-seeking.
    pub advice_keywords: Vec<String>,
    pub past_tense_markers: Vec<String>,
    pub expense_markers: Vec<String>,
    pub income_markers: Vec<String>,
    pub task_triggers: Vec<String>,
    /// Words that mark Latin-script input as Roman Urdu.
    pub roman_urdu_markers: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            gateway: GatewayConfig::default(),
            classifier: ClassifierConfig::default(),
            locale: LocaleConfig::default(),
            risk_returns: RiskReturnTable::default(),
            category_aliases: defaults::category_aliases(),
            currency_aliases: defaults::currency_aliases(),
            risk_synonyms: defaults::risk_synonyms(),
            spelling_variants: defaults::spelling_variants(),
            greetings: defaults::greetings(),
            intent_keywords: defaults::intent_keywords(),
            advice_keywords: defaults::advice_keywords(),
            past_tense_markers: defaults::past_tense_markers(),
            expense_markers: defaults::expense_markers(),
            income_markers: defaults::income_markers(),
            task_triggers: defaults::task_triggers(),
            roman_urdu_markers: defaults::roman_urdu_markers(),
        }
    }
}

impl RouterConfig {
    /// Parse a TOML document. Tables it omits keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: RouterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading router config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build from `ROUTER_CONFIG` (if set) plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("ROUTER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load_from_path(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Some(ttl) = env_parse::<u64>("SESSION_TTL_SECONDS")? {
            config.session.ttl_seconds = ttl;
        }
        if let Some(window) = env_parse::<usize>("CONTEXT_WINDOW")? {
            config.session.context_window = window;
        }
        if let Some(timeout) = env_parse::<u64>("TOOL_TIMEOUT_MS")? {
            config.gateway.timeout_ms = timeout;
        }
        if let Ok(currency) = env::var("DEFAULT_CURRENCY") {
            config.locale.default_currency = currency.to_uppercase();
        }
        if let Ok(url) = env::var("LEDGER_BASE_URL") {
            if !url.trim().is_empty() {
                config.gateway.ledger_base_url = Some(url);
            }
        }

        config.validate()?;
        info!(
            ttl_seconds = config.session.ttl_seconds,
            context_window = config.session.context_window,
            categories = config.category_aliases.len(),
            "Router config loaded"
        );
        Ok(config)
    }

    /// Startup integrity check. A broken table here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.session.context_window == 0 {
            return Err(config_error("session.context_window must be at least 1"));
        }
        if self.session.ttl_seconds == 0 {
            return Err(config_error("session.ttl_seconds must be positive"));
        }
        if self.session.sweep_interval_seconds == 0 {
            return Err(config_error("session.sweep_interval_seconds must be positive"));
        }
        if self.gateway.timeout_ms == 0 {
            return Err(config_error("gateway.timeout_ms must be positive"));
        }

        let c = &self.classifier;
        if !(0.0..1.0).contains(&c.min_confidence) {
            return Err(config_error("classifier.min_confidence must be in [0, 1)"));
        }
        if c.missing_slot_cap >= CLARIFICATION_THRESHOLD {
            return Err(config_error(format!(
                "classifier.missing_slot_cap ({}) must stay below the clarification threshold ({})",
                c.missing_slot_cap, CLARIFICATION_THRESHOLD
            )));
        }
        if c.continuation_confidence < CLARIFICATION_THRESHOLD || c.continuation_confidence > 1.0 {
            return Err(config_error(
                "classifier.continuation_confidence must be in [0.5, 1]",
            ));
        }

        if self.category_aliases.is_empty() {
            return Err(config_error("category_aliases is empty"));
        }
        for (category, aliases) in &self.category_aliases {
            if category.trim().is_empty() || aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(config_error(format!(
                    "category_aliases entry '{}' has a blank name or alias",
                    category
                )));
            }
        }

        let covered: HashSet<Intent> = self
            .intent_keywords
            .iter()
            .filter(|entry| !entry.keywords.is_empty())
            .map(|entry| entry.intent)
            .collect();
        for intent in Intent::SCORED {
            if !covered.contains(&intent) {
                return Err(config_error(format!(
                    "intent_keywords has no keywords for {}",
                    intent
                )));
            }
        }
        for entry in &self.intent_keywords {
            for keyword in &entry.keywords {
                let weight_ok = keyword.weight > 0.0 && keyword.weight <= 1.0;
                if keyword.phrase.trim().is_empty() || !weight_ok {
                    return Err(config_error(format!(
                        "intent_keywords for {} has an invalid keyword '{}' (weight {})",
                        entry.intent, keyword.phrase, keyword.weight
                    )));
                }
            }
        }

        let rates = &self.risk_returns;
        if [rates.low, rates.medium, rates.high]
            .iter()
            .any(|r| !r.is_finite() || *r < 0.0)
        {
            return Err(config_error("risk_returns must be finite and non-negative"));
        }

        if self.greetings.is_empty() {
            return Err(config_error("greetings is empty"));
        }

        Ok(())
    }

    pub fn keywords_for(&self, intent: Intent) -> impl Iterator<Item = &WeightedKeyword> {
        self.intent_keywords
            .iter()
            .filter(move |entry| entry.intent == intent)
            .flat_map(|entry| entry.keywords.iter())
    }
}

fn config_error(message: impl Into<String>) -> RouterError {
    RouterError::Config(message.into())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| config_error(format!("{} is not a valid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::with_locked_env;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.context_window, 20);
        assert_eq!(config.risk_returns.annual_rate(RiskLevel::High), 0.16);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RouterConfig::from_toml_str(
            r#"
            [session]
            ttl_seconds = 60
            context_window = 4

            [category_aliases]
            Food = ["food", "khana"]
            "#,
        )
        .unwrap();

        assert_eq!(config.session.ttl_seconds, 60);
        assert_eq!(config.category_aliases.len(), 1);
        assert!(!config.intent_keywords.is_empty());
    }

    #[test]
    fn test_missing_intent_keywords_is_fatal() {
        let mut config = RouterConfig::default();
        config
            .intent_keywords
            .retain(|entry| entry.intent != Intent::SetBudget);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SET_BUDGET"));
    }

    #[test]
    fn test_slot_cap_must_stay_below_threshold() {
        let mut config = RouterConfig::default();
        config.classifier.missing_slot_cap = 0.5;
        assert!(matches!(config.validate(), Err(RouterError::Config(_))));
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let mut config = RouterConfig::default();
        config.session.sweep_interval_seconds = 0;
        assert!(matches!(config.validate(), Err(RouterError::Config(_))));

        let parsed = RouterConfig::from_toml_str("[session]\nsweep_interval_seconds = 0\n");
        assert!(matches!(parsed, Err(RouterError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        with_locked_env(
            &[
                ("ROUTER_CONFIG", None),
                ("SESSION_TTL_SECONDS", Some("90")),
                ("CONTEXT_WINDOW", Some("5")),
                ("TOOL_TIMEOUT_MS", None),
                ("DEFAULT_CURRENCY", Some("usd")),
                ("LEDGER_BASE_URL", None),
            ],
            || {
                let config = RouterConfig::from_env().unwrap();
                assert_eq!(config.session.ttl_seconds, 90);
                assert_eq!(config.session.context_window, 5);
                assert_eq!(config.locale.default_currency, "USD");
            },
        );
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        with_locked_env(
            &[("ROUTER_CONFIG", None), ("CONTEXT_WINDOW", Some("many"))],
            || {
                assert!(RouterConfig::from_env().is_err());
            },
        );
    }
}

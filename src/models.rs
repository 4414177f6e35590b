//! Core data models for the intent router

use crate::translation::ReplyTemplate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHint {
    #[default]
    Auto,
    En,
    Ur,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ur,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Text,
    Voice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
}

/// A named field an intent needs (or accepts) before it can run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Amount,
    Category,
    Date,
    RiskLevel,
    Title,
    Period,
    Horizon,
}

//
// ================= Utterance =================
//

/// One raw input unit. Consumed within a single router pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    #[serde(default)]
    pub language_hint: LanguageHint,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub voice_confidence: Option<f32>,
}

impl Utterance {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language_hint: LanguageHint::Auto,
            modality: Modality::Text,
            voice_confidence: None,
        }
    }

    pub fn voice(text: impl Into<String>, voice_confidence: f32) -> Self {
        Self {
            text: text.into(),
            language_hint: LanguageHint::Auto,
            modality: Modality::Voice,
            voice_confidence: Some(voice_confidence),
        }
    }

    pub fn with_language(mut self, hint: LanguageHint) -> Self {
        self.language_hint = hint;
        self
    }
}

//
// ================= Entities =================
//

/// Structured fields pulled out of raw text. Absence is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub date_is_relative: bool,
    /// "kal"/"parson" resolved by the default direction, not by a tense marker.
    #[serde(default)]
    pub date_low_confidence: bool,
    pub risk_level: Option<RiskLevel>,
    pub transaction_kind: Option<TransactionKind>,
    pub period: Option<Period>,
    pub horizon_months: Option<u32>,
    pub title: Option<String>,
    #[serde(default)]
    pub raw_spans: BTreeMap<String, String>,
}

impl ExtractedEntities {
    pub fn has(&self, slot: Slot) -> bool {
        match slot {
            Slot::Amount => self.amount.is_some(),
            Slot::Category => self.category.is_some(),
            Slot::Date => self.date.is_some(),
            Slot::RiskLevel => self.risk_level.is_some(),
            Slot::Title => self.title.is_some(),
            Slot::Period => self.period.is_some(),
            Slot::Horizon => self.horizon_months.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [
            Slot::Amount,
            Slot::Category,
            Slot::Date,
            Slot::RiskLevel,
            Slot::Title,
            Slot::Period,
            Slot::Horizon,
        ]
        .iter()
        .all(|slot| !self.has(*slot))
            && self.currency.is_none()
            && self.transaction_kind.is_none()
    }

    /// Fields present in `self` win; the rest are taken from `base`.
    pub fn merged_over(&self, base: &ExtractedEntities) -> ExtractedEntities {
        let mut raw_spans = base.raw_spans.clone();
        raw_spans.extend(self.raw_spans.clone());

        let (date, date_is_relative, date_low_confidence) = if self.date.is_some() {
            (self.date, self.date_is_relative, self.date_low_confidence)
        } else {
            (base.date, base.date_is_relative, base.date_low_confidence)
        };

        ExtractedEntities {
            amount: self.amount.or(base.amount),
            currency: self.currency.clone().or_else(|| base.currency.clone()),
            category: self.category.clone().or_else(|| base.category.clone()),
            date,
            date_is_relative,
            date_low_confidence,
            risk_level: self.risk_level.or(base.risk_level),
            transaction_kind: self.transaction_kind.or(base.transaction_kind),
            period: self.period.or(base.period),
            horizon_months: self.horizon_months.or(base.horizon_months),
            title: self.title.clone().or_else(|| base.title.clone()),
            raw_spans,
        }
    }
}

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    AddTransaction,
    QuerySpending,
    SetBudget,
    QueryBudgetStatus,
    SimulateInvestment,
    CreateTask,
    ListTasks,
    HealthScore,
    Greeting,
    OffTopic,
    Unknown,
}

impl Intent {
    /// Scored intents in tie-break order, most constrained first.
    pub const SCORED: [Intent; 9] = [
        Intent::AddTransaction,
        Intent::SetBudget,
        Intent::QueryBudgetStatus,
        Intent::SimulateInvestment,
        Intent::CreateTask,
        Intent::ListTasks,
        Intent::HealthScore,
        Intent::QuerySpending,
        Intent::OffTopic,
    ];

    pub fn required_slots(&self) -> &'static [Slot] {
        match self {
            Intent::AddTransaction => &[Slot::Amount],
            Intent::SetBudget => &[Slot::Category, Slot::Amount],
            Intent::SimulateInvestment => &[Slot::Amount],
            Intent::CreateTask => &[Slot::Title],
            _ => &[],
        }
    }

    /// Every slot the intent accepts; a follow-up supplying one of these
    /// can continue the intent.
    pub fn accepted_slots(&self) -> &'static [Slot] {
        match self {
            Intent::AddTransaction => &[Slot::Amount, Slot::Category, Slot::Date],
            Intent::QuerySpending => &[Slot::Category, Slot::Period, Slot::Date],
            Intent::SetBudget => &[Slot::Category, Slot::Amount, Slot::Period],
            Intent::QueryBudgetStatus => &[Slot::Category, Slot::Period],
            Intent::SimulateInvestment => &[Slot::Amount, Slot::RiskLevel, Slot::Horizon],
            Intent::CreateTask => &[Slot::Title, Slot::Date],
            _ => &[],
        }
    }

    pub fn missing_slots(&self, entities: &ExtractedEntities) -> Vec<Slot> {
        self.required_slots()
            .iter()
            .copied()
            .filter(|slot| !entities.has(*slot))
            .collect()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::AddTransaction => "ADD_TRANSACTION",
            Intent::QuerySpending => "QUERY_SPENDING",
            Intent::SetBudget => "SET_BUDGET",
            Intent::QueryBudgetStatus => "QUERY_BUDGET_STATUS",
            Intent::SimulateInvestment => "SIMULATE_INVESTMENT",
            Intent::CreateTask => "CREATE_TASK",
            Intent::ListTasks => "LIST_TASKS",
            Intent::HealthScore => "HEALTH_SCORE",
            Intent::Greeting => "GREETING",
            Intent::OffTopic => "OFF_TOPIC",
            Intent::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OffTopicKind {
    AdviceSeeking,
    Unrelated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: ExtractedEntities,
    #[serde(default)]
    pub missing_slots: Vec<Slot>,
    #[serde(default)]
    pub continuation: bool,
    #[serde(default)]
    pub off_topic: Option<OffTopicKind>,
}

impl IntentResult {
    pub fn new(intent: Intent, confidence: f32, entities: ExtractedEntities) -> Self {
        let missing_slots = intent.missing_slots(&entities);
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            entities,
            missing_slots,
            continuation: false,
            off_topic: None,
        }
    }

    pub fn unknown(confidence: f32, entities: ExtractedEntities) -> Self {
        Self::new(Intent::Unknown, confidence, entities)
    }
}

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Monotonic per-session counter, assigned on append.
    pub seq: u64,
    /// Generation of the router pass that produced this turn.
    pub generation: u64,
    pub role: Role,
    pub content: String,
    pub intent: Option<IntentResult>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(
        content: impl Into<String>,
        intent: IntentResult,
        generation: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            seq: 0,
            generation,
            role: Role::User,
            content: content.into(),
            intent: Some(intent),
            timestamp,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        generation: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            seq: 0,
            generation,
            role: Role::Assistant,
            content: content.into(),
            intent: None,
            timestamp,
        }
    }
}

//
// ================= Skill Result =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Transport,
    LowConfidence,
    UnsupportedRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillResult {
    pub success: bool,
    pub reply_text_en: String,
    pub reply_text_ur: Option<String>,
    pub structured_payload: Option<Value>,
    pub disclaimer_required: bool,
    pub error: Option<ErrorKind>,
    /// Template the reply text was rendered from.
    pub reply: ReplyTemplate,
    /// The ledger had nothing for the requested period or category.
    #[serde(default)]
    pub no_data: bool,
    #[serde(default)]
    pub tool_calls: Vec<String>,
}

impl SkillResult {
    pub fn ok(reply: ReplyTemplate, payload: Value) -> Self {
        Self {
            success: true,
            reply_text_en: reply.render_en(),
            reply_text_ur: None,
            structured_payload: Some(payload),
            disclaimer_required: false,
            error: None,
            reply,
            no_data: false,
            tool_calls: Vec::new(),
        }
    }

    pub fn no_data(topic: impl Into<String>) -> Self {
        let reply = ReplyTemplate::NoData { topic: topic.into() };
        Self {
            success: true,
            reply_text_en: reply.render_en(),
            reply_text_ur: None,
            structured_payload: None,
            disclaimer_required: false,
            error: None,
            reply,
            no_data: true,
            tool_calls: Vec::new(),
        }
    }

    pub fn failure(kind: ErrorKind) -> Self {
        let reply = ReplyTemplate::for_error(kind);
        Self {
            success: false,
            reply_text_en: reply.render_en(),
            reply_text_ur: None,
            structured_payload: None,
            disclaimer_required: false,
            error: Some(kind),
            reply,
            no_data: false,
            tool_calls: Vec::new(),
        }
    }

    /// Non-dispatched replies: greetings, redirects, clarifications.
    pub fn message(reply: ReplyTemplate) -> Self {
        Self {
            success: true,
            reply_text_en: reply.render_en(),
            reply_text_ur: None,
            structured_payload: None,
            disclaimer_required: false,
            error: None,
            reply,
            no_data: false,
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(mut self, tool_name: &str) -> Self {
        self.tool_calls.push(tool_name.to_string());
        self
    }

    /// Swap the reply template and re-render English; clears any Urdu text.
    pub fn set_reply(&mut self, reply: ReplyTemplate) {
        self.reply_text_en = reply.render_en();
        self.reply_text_ur = None;
        self.reply = reply;
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Map::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    pub fn arg_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.arg(key, v),
            None => self,
        }
    }
}

//
// ================= Final Reply =================
//

/// How a router pass ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Dispatched,
    Greeted,
    Redirected,
    Clarified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterReply {
    pub session_id: String,
    pub reply_en: String,
    pub reply_ur: Option<String>,
    pub structured_payload: Option<Value>,
    pub disclaimer: Option<String>,
    pub intent: Intent,
    pub confidence: f32,
    /// The router asked a clarifying question instead of dispatching.
    pub clarification: bool,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Slot::Amount => "amount",
            Slot::Category => "category",
            Slot::Date => "date",
            Slot::RiskLevel => "risk level",
            Slot::Title => "task title",
            Slot::Period => "period",
            Slot::Horizon => "time horizon",
        };
        write!(f, "{}", s)
    }
}

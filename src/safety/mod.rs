//! Safety guard
//!
//! Fixed policy applied around every dispatch. The pre-check decides
//! whether a request may reach a skill at all; the post-check rewrites the
//! skill's result so that no reply carries a number the ledger did not
//! supply and every projection carries its disclaimer.

use crate::models::{ErrorKind, Intent, IntentResult, OffTopicKind, SkillResult};
use crate::translation::ReplyTemplate;
use tracing::{debug, info};

/// Below this confidence the router asks instead of acting.
pub const CLARIFICATION_THRESHOLD: f32 = 0.5;

/// Outcome of the pre-dispatch check.
#[derive(Debug, Clone, PartialEq)]
pub enum PreCheck {
    Dispatch,
    Greet(SkillResult),
    Redirect(SkillResult),
    Clarify(SkillResult),
}

impl PreCheck {
    pub fn is_clarification(&self) -> bool {
        matches!(self, PreCheck::Clarify(_))
    }
}

/// One post-dispatch rule. Returns true when it changed the result.
pub trait SafetyRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, intent: Intent, result: &mut SkillResult) -> bool;
}

pub struct SafetyGuard {
    rules: Vec<Box<dyn SafetyRule>>,
}

impl SafetyGuard {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Guard with the standard post-dispatch rules, in order.
    pub fn standard() -> Self {
        let mut guard = Self::new();
        guard.add_rule(Box::new(FailedResultRule));
        guard.add_rule(Box::new(UnbackedFiguresRule));
        guard.add_rule(Box::new(NoDataRule));
        guard.add_rule(Box::new(InvestmentDisclaimerRule));
        guard
    }

    pub fn add_rule(&mut self, rule: Box<dyn SafetyRule>) {
        self.rules.push(rule);
    }

    pub fn pre_check(&self, result: &IntentResult) -> PreCheck {
        match result.intent {
            Intent::OffTopic => {
                let advice_seeking = result.off_topic == Some(OffTopicKind::AdviceSeeking);
                info!(advice_seeking, "Off-topic request redirected");
                let mut reply =
                    SkillResult::message(ReplyTemplate::OffTopicRedirect { advice_seeking });
                reply.disclaimer_required = advice_seeking;
                PreCheck::Redirect(reply)
            }
            Intent::Greeting => PreCheck::Greet(SkillResult::message(ReplyTemplate::Greeting)),
            Intent::Unknown => PreCheck::Clarify(clarification(result)),
            _ if result.confidence < CLARIFICATION_THRESHOLD => {
                debug!(
                    intent = %result.intent,
                    confidence = result.confidence,
                    missing = ?result.missing_slots,
                    "Confidence below threshold, asking for clarification"
                );
                PreCheck::Clarify(clarification(result))
            }
            _ => PreCheck::Dispatch,
        }
    }

    pub fn post_check(&self, mut result: SkillResult, intent: Intent) -> SkillResult {
        for rule in &self.rules {
            if rule.apply(intent, &mut result) {
                debug!(rule = rule.name(), intent = %intent, "Safety rule rewrote result");
            }
        }
        result
    }
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::standard()
    }
}

fn clarification(result: &IntentResult) -> SkillResult {
    let reply = if result.intent == Intent::Unknown || result.missing_slots.is_empty() {
        ReplyTemplate::Rephrase
    } else {
        ReplyTemplate::Clarify {
            intent: result.intent,
            missing: result.missing_slots.clone(),
        }
    };
    let mut clarify = SkillResult::message(reply);
    clarify.error = Some(ErrorKind::LowConfidence);
    clarify
}

//
// ================= Rules =================
//

/// Failed results keep no payload and speak only the generic template.
pub struct FailedResultRule;

impl SafetyRule for FailedResultRule {
    fn name(&self) -> &'static str {
        "failed_result"
    }

    fn apply(&self, _intent: Intent, result: &mut SkillResult) -> bool {
        if result.success {
            return false;
        }
        let kind = result.error.unwrap_or(ErrorKind::Validation);
        let generic = ReplyTemplate::for_error(kind);
        let changed = result.structured_payload.is_some() || result.reply != generic;

        result.error = Some(kind);
        result.structured_payload = None;
        if result.reply != generic {
            result.set_reply(generic);
        }
        changed
    }
}

/// A reply quoting figures must come from a tool call.
pub struct UnbackedFiguresRule;

impl SafetyRule for UnbackedFiguresRule {
    fn name(&self) -> &'static str {
        "unbacked_figures"
    }

    fn apply(&self, _intent: Intent, result: &mut SkillResult) -> bool {
        if !result.success || !result.reply.carries_figures() || !result.tool_calls.is_empty() {
            return false;
        }
        *result = SkillResult::failure(ErrorKind::Validation);
        true
    }
}

/// Empty ledger answers are reported as such, never filled in.
pub struct NoDataRule;

impl SafetyRule for NoDataRule {
    fn name(&self) -> &'static str {
        "no_data"
    }

    fn apply(&self, _intent: Intent, result: &mut SkillResult) -> bool {
        if !result.no_data {
            return false;
        }
        let topic = match &result.reply {
            ReplyTemplate::NoData { topic } => topic.clone(),
            _ => "this request".to_string(),
        };
        let changed = result.structured_payload.is_some()
            || !matches!(result.reply, ReplyTemplate::NoData { .. });

        result.structured_payload = None;
        if !matches!(result.reply, ReplyTemplate::NoData { .. }) {
            result.set_reply(ReplyTemplate::NoData { topic });
        }
        changed
    }
}

/// Every investment result carries the disclaimer, success or failure.
pub struct InvestmentDisclaimerRule;

impl SafetyRule for InvestmentDisclaimerRule {
    fn name(&self) -> &'static str {
        "investment_disclaimer"
    }

    fn apply(&self, intent: Intent, result: &mut SkillResult) -> bool {
        if intent != Intent::SimulateInvestment || result.disclaimer_required {
            return false;
        }
        result.disclaimer_required = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedEntities, Slot};
    use serde_json::json;

    fn intent(intent: Intent, confidence: f32) -> IntentResult {
        IntentResult::new(intent, confidence, ExtractedEntities::default())
    }

    #[test]
    fn test_low_confidence_asks_for_missing_slots() {
        let guard = SafetyGuard::standard();
        let result = intent(Intent::SetBudget, 0.45);
        assert_eq!(result.missing_slots, vec![Slot::Category, Slot::Amount]);

        match guard.pre_check(&result) {
            PreCheck::Clarify(reply) => {
                assert_eq!(reply.error, Some(ErrorKind::LowConfidence));
                assert!(reply.reply_text_en.contains("category and amount"));
            }
            other => panic!("expected clarification, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_boundary_dispatches() {
        let guard = SafetyGuard::standard();
        let mut entities = ExtractedEntities::default();
        entities.amount = Some(500.0);
        let result = IntentResult::new(Intent::AddTransaction, CLARIFICATION_THRESHOLD, entities);
        assert_eq!(guard.pre_check(&result), PreCheck::Dispatch);
    }

    #[test]
    fn test_off_topic_redirect_has_no_figures() {
        let guard = SafetyGuard::standard();
        let mut result = intent(Intent::OffTopic, 0.9);
        result.off_topic = Some(OffTopicKind::AdviceSeeking);

        let PreCheck::Redirect(reply) = guard.pre_check(&result) else {
            panic!("expected redirect");
        };
        assert!(reply.disclaimer_required);
        assert!(reply.structured_payload.is_none());
        assert!(!reply.reply_text_en.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_unknown_gets_generic_prompt() {
        let guard = SafetyGuard::standard();
        let unknown = IntentResult::unknown(0.1, ExtractedEntities::default());
        let PreCheck::Clarify(reply) = guard.pre_check(&unknown) else {
            panic!("expected clarification");
        };
        assert_eq!(reply.reply, ReplyTemplate::Rephrase);
    }

    #[test]
    fn test_investment_disclaimer_on_failure_too() {
        let guard = SafetyGuard::standard();
        let failed = guard.post_check(
            SkillResult::failure(ErrorKind::Transport),
            Intent::SimulateInvestment,
        );
        assert!(failed.disclaimer_required);
        assert!(!failed.success);

        let other =
            guard.post_check(SkillResult::failure(ErrorKind::Transport), Intent::AddTransaction);
        assert!(!other.disclaimer_required);
    }

    #[test]
    fn test_failure_drops_payload() {
        let guard = SafetyGuard::standard();
        let mut result = SkillResult::failure(ErrorKind::Transport);
        result.structured_payload = Some(json!({"total": 12345}));

        let checked = guard.post_check(result, Intent::QuerySpending);
        assert!(checked.structured_payload.is_none());
        assert_eq!(checked.reply, ReplyTemplate::ServiceUnavailable);
    }

    #[test]
    fn test_no_data_forces_template() {
        let guard = SafetyGuard::standard();
        let mut result = SkillResult::no_data("spending");
        result.structured_payload = Some(json!({"total": 0}));

        let checked = guard.post_check(result, Intent::QuerySpending);
        assert!(checked.structured_payload.is_none());
        assert_eq!(checked.reply_text_en, "No data available for spending yet.");
    }

    #[test]
    fn test_figures_without_tool_call_are_rejected() {
        let guard = SafetyGuard::standard();
        let invented = SkillResult::ok(
            ReplyTemplate::HealthScore {
                score: 99.0,
                grade: "A".into(),
            },
            json!({"score": 99}),
        );

        let checked = guard.post_check(invented, Intent::HealthScore);
        assert!(!checked.success);
        assert!(checked.structured_payload.is_none());
    }
}

//! Router - one pass per utterance
//!
//! INPUT → EXTRACT → CLASSIFY → PRE-CHECK → DISPATCH → POST-CHECK → TRANSLATE → COMMIT
//!
//! A turn never fails: every error is already a SkillResult by the time it
//! reaches this loop. The only outside await point is the gateway call.

use crate::audit::{compute_text_hash, AuditLog, AuditRecord};
use crate::classifier::{ClassifierContext, IntentClassifier};
use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::dispatcher::SkillDispatcher;
use crate::extraction::EntityExtractor;
use crate::ledger::Ledger;
use crate::memory::{ConversationStore, DialogueState, Exchange};
use crate::models::{
    Intent, IntentResult, Language, RouterReply, SkillResult, Turn, TurnOutcome, Utterance,
};
use crate::safety::{PreCheck, SafetyGuard};
use crate::skills::SkillContext;
use crate::tools::ToolGateway;
use crate::translation::Translator;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The intent router
pub struct Router {
    config: Arc<RouterConfig>,
    extractor: EntityExtractor,
    classifier: IntentClassifier,
    store: Arc<ConversationStore>,
    guard: SafetyGuard,
    dispatcher: SkillDispatcher,
    translator: Translator,
    audit_log: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
}

impl Router {
    /// Fails only on a broken configuration or tool table.
    pub fn new(
        config: RouterConfig,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let gateway = Arc::new(ToolGateway::from_config(&config, ledger)?);

        info!(
            tools = gateway.schemas().tool_names().len(),
            ttl_seconds = config.session.ttl_seconds,
            context_window = config.session.context_window,
            "Router initialized"
        );

        Ok(Self {
            extractor: EntityExtractor::new(config.clone()),
            classifier: IntentClassifier::new(config.clone()),
            store: Arc::new(ConversationStore::new(
                clock.clone(),
                config.session.ttl_seconds,
                config.session.context_window,
            )),
            guard: SafetyGuard::standard(),
            dispatcher: SkillDispatcher::new(gateway, config.clone()),
            translator: Translator::new(&config),
            audit_log: Arc::new(AuditLog::new()),
            clock,
            config,
        })
    }

    pub fn store(&self) -> Arc<ConversationStore> {
        self.store.clone()
    }

    pub fn audit_log(&self) -> Arc<AuditLog> {
        self.audit_log.clone()
    }

    /// Handle one utterance for a session.
    pub async fn handle_message(&self, session_id: &str, utterance: Utterance) -> RouterReply {
        let start_time = Instant::now();

        // === INPUT ===
        let snapshot = self.store.begin_turn(session_id).await;
        let language = self.translator.resolve_language(
            utterance.language_hint,
            &utterance.text,
            snapshot.language,
        );
        let today = self.clock.today();

        // === EXTRACT / CLASSIFY ===
        let awaited = match &snapshot.state {
            DialogueState::AwaitingClarification { intent, entities } => {
                intent.missing_slots(entities)
            }
            DialogueState::Idle => Vec::new(),
        };
        let entities = self.extractor.extract_answer(
            &utterance.text,
            utterance.language_hint,
            today,
            &awaited,
        );
        let context = ClassifierContext {
            state: snapshot.state.clone(),
            last_user_intent: snapshot.last_user_intent.clone(),
        };
        let intent = self
            .classifier
            .classify_utterance(&utterance, &entities, &context);

        info!(
            session_id,
            generation = snapshot.generation,
            intent = %intent.intent,
            confidence = intent.confidence,
            continuation = intent.continuation,
            language = ?language,
            "Utterance classified"
        );

        // === PRE-CHECK / DISPATCH / POST-CHECK ===
        let (result, outcome) = match self.guard.pre_check(&intent) {
            PreCheck::Dispatch => {
                let skill_context = SkillContext {
                    currency: intent
                        .entities
                        .currency
                        .clone()
                        .unwrap_or_else(|| self.config.locale.default_currency.clone()),
                    entities: intent.entities.clone(),
                    language,
                    today,
                };
                let result = self.dispatcher.dispatch(&intent, &skill_context).await;
                (result, TurnOutcome::Dispatched)
            }
            PreCheck::Greet(result) => (result, TurnOutcome::Greeted),
            PreCheck::Redirect(result) => (result, TurnOutcome::Redirected),
            PreCheck::Clarify(result) => (result, TurnOutcome::Clarified),
        };
        let result = self.guard.post_check(result, intent.intent);

        // === TRANSLATE ===
        let result = self.translator.render(result, language);
        let disclaimer = result
            .disclaimer_required
            .then(|| Translator::disclaimer(language).to_string());

        // === COMMIT ===
        let clarification = outcome == TurnOutcome::Clarified;
        let next_state = next_state(&intent, clarification);
        let now = self.clock.now();
        let exchange = Exchange {
            generation: snapshot.generation,
            language,
            user: Turn::user(utterance.text.clone(), intent.clone(), snapshot.generation, now),
            assistant: Turn::assistant(
                reply_text(&result, language),
                snapshot.generation,
                now,
            ),
            state: next_state,
        };
        let committed = self.store.commit_exchange(session_id, exchange).await;

        self.write_audit(session_id, snapshot.generation, &utterance, &intent, &result, outcome)
            .await;

        debug!(
            session_id,
            outcome = ?outcome,
            committed,
            tool_calls = ?result.tool_calls,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Turn complete"
        );

        RouterReply {
            session_id: session_id.to_string(),
            reply_en: result.reply_text_en,
            reply_ur: result.reply_text_ur,
            structured_payload: result.structured_payload,
            disclaimer,
            intent: intent.intent,
            confidence: intent.confidence,
            clarification,
        }
    }

    /// Drop a session's history and state. Returns false if it did not exist.
    pub async fn reset_session(&self, session_id: &str) -> bool {
        let existed = self.store.reset(session_id).await;
        if !existed {
            warn!(session_id, "Reset requested for unknown session");
        }
        existed
    }

    async fn write_audit(
        &self,
        session_id: &str,
        generation: u64,
        utterance: &Utterance,
        intent: &IntentResult,
        result: &SkillResult,
        outcome: TurnOutcome,
    ) {
        let record = AuditRecord {
            audit_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            generation,
            intent: intent.intent,
            confidence: intent.confidence,
            tool_calls: result.tool_calls.clone(),
            outcome,
            clarification: outcome == TurnOutcome::Clarified,
            date_low_confidence: intent.entities.date_low_confidence,
            text_hash: compute_text_hash(&utterance.text),
            created_at: self.clock.now(),
        };
        self.audit_log.record(record).await;
    }
}

/// A clarification on a known intent waits for the missing slots; anything
/// else returns to idle.
fn next_state(intent: &IntentResult, clarification: bool) -> DialogueState {
    if clarification && intent.intent != Intent::Unknown {
        DialogueState::AwaitingClarification {
            intent: intent.intent,
            entities: intent.entities.clone(),
        }
    } else {
        DialogueState::Idle
    }
}

fn reply_text(result: &SkillResult, language: Language) -> String {
    match (language, &result.reply_text_ur) {
        (Language::Ur, Some(ur)) => ur.clone(),
        _ => result.reply_text_en.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::LanguageHint;
    use crate::test_support::SpyLedger;
    use crate::translation::INVESTMENT_DISCLAIMER_EN;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn router(spy: Arc<SpyLedger>) -> Router {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
        ));
        Router::new(RouterConfig::default(), spy, clock).unwrap()
    }

    #[tokio::test]
    async fn test_english_expense_records_one_transaction() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let reply = router
            .handle_message("s1", Utterance::text("add 500 expense food"))
            .await;
        assert_eq!(reply.intent, Intent::AddTransaction);
        assert!(reply.confidence >= 0.5);
        assert!(!reply.clarification);

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "add_transaction");
        assert_eq!(calls[0].arguments["amount"], json!(500.0));
        assert_eq!(calls[0].arguments["category"], json!("Food"));
        assert_eq!(calls[0].arguments["type"], json!("expense"));
    }

    #[tokio::test]
    async fn test_roman_urdu_expense_records_same_transaction() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let reply = router
            .handle_message("s1", Utterance::text("khana 500 kharch hua"))
            .await;
        assert_eq!(reply.intent, Intent::AddTransaction);

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["amount"], json!(500.0));
        assert_eq!(calls[0].arguments["category"], json!("Food"));
        assert_eq!(calls[0].arguments["type"], json!("expense"));

        let ur = reply.reply_ur.expect("urdu reply");
        assert!(ur.contains("500 روپے"));
    }

    #[tokio::test]
    async fn test_advice_seeking_is_redirected_without_figures() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let reply = router
            .handle_message("s1", Utterance::text("can you guarantee 20% returns?"))
            .await;
        assert_eq!(reply.intent, Intent::OffTopic);
        assert!(spy.calls().is_empty());
        assert!(!reply.reply_en.chars().any(|c| c.is_ascii_digit()));
        assert!(reply.structured_payload.is_none());
        assert!(reply.disclaimer.is_some());
    }

    #[tokio::test]
    async fn test_clarification_then_follow_up_sets_budget() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let first = router.handle_message("s1", Utterance::text("set a budget")).await;
        assert!(first.clarification);
        assert_eq!(
            first.reply_en,
            "I need a bit more detail. What is the category and amount?"
        );
        assert!(spy.calls().is_empty());

        let second = router.handle_message("s1", Utterance::text("food 1000")).await;
        assert_eq!(second.intent, Intent::SetBudget);
        assert!(second.confidence >= 0.9);
        assert!(!second.clarification);

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "create_budget");
        assert_eq!(calls[0].arguments["category"], json!("Food"));
        assert_eq!(calls[0].arguments["limit"], json!(1000.0));
    }

    #[tokio::test]
    async fn test_no_tool_call_below_threshold() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        for text in ["set a budget", "purple elephant dancing", "", "invest"] {
            let reply = router.handle_message("s-low", Utterance::text(text)).await;
            assert!(reply.confidence < 0.5 || reply.clarification, "{}", text);
        }
        assert!(spy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_low_voice_confidence_asks_instead_of_acting() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let reply = router
            .handle_message("s1", Utterance::voice("add 500 expense food", 0.3))
            .await;
        assert!(reply.clarification);
        assert!(spy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_investment_always_carries_disclaimer() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let reply = router
            .handle_message(
                "s1",
                Utterance::text("invest 1 lakh aggressive for 3 years")
                    .with_language(LanguageHint::En),
            )
            .await;
        assert_eq!(reply.intent, Intent::SimulateInvestment);
        assert_eq!(reply.disclaimer.as_deref(), Some(INVESTMENT_DISCLAIMER_EN));

        let payload = reply.structured_payload.expect("projection payload");
        assert_eq!(payload["months"], 36);
        assert_eq!(payload["principal"], 100_000.0);
        // Compute tool, the ledger is never asked.
        assert!(spy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_investment_horizon_asks_for_shorter_period() {
        let router = router(Arc::new(SpyLedger::new()));

        let reply = router
            .handle_message(
                "s1",
                Utterance::text("invest 1 lakh for 60 years").with_language(LanguageHint::En),
            )
            .await;
        assert_eq!(reply.intent, Intent::SimulateInvestment);
        assert!(reply.reply_en.contains("at most 50 years"));
        assert!(reply.structured_payload.is_none());
        assert!(reply.disclaimer.is_some());
    }

    #[tokio::test]
    async fn test_ledger_outage_yields_generic_reply() {
        let spy = Arc::new(SpyLedger::new().unreachable());
        let router = router(spy);

        let reply = router
            .handle_message("s1", Utterance::text("add 500 expense food"))
            .await;
        assert!(reply.reply_en.contains("trouble connecting"));
        assert!(reply.structured_payload.is_none());
    }

    #[tokio::test]
    async fn test_empty_ledger_reports_no_data() {
        let router = router(Arc::new(SpyLedger::new()));
        let reply = router
            .handle_message("s1", Utterance::text("how much did I spend on food this month"))
            .await;
        assert_eq!(reply.reply_en, "No data available for spending yet.");
        assert!(reply.structured_payload.is_none());
    }

    #[tokio::test]
    async fn test_session_language_sticks_for_short_inputs() {
        let router = router(Arc::new(SpyLedger::new()));

        let first = router
            .handle_message("s1", Utterance::text("khana 500 kharch hua"))
            .await;
        assert!(first.reply_ur.is_some());

        // Too short to switch the session back to English.
        let second = router.handle_message("s1", Utterance::text("ok")).await;
        assert!(second.reply_ur.is_some());
    }

    #[tokio::test]
    async fn test_superseded_turn_is_not_committed() {
        let spy = Arc::new(SpyLedger::new().with_delay(Duration::from_millis(200)));
        let router = router(spy);

        let slow = router.handle_message("s1", Utterance::text("add 500 expense food"));
        let fast = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            router.handle_message("s1", Utterance::text("hello")).await
        };
        let (slow_reply, fast_reply) = tokio::join!(slow, fast);

        assert_eq!(slow_reply.intent, Intent::AddTransaction);
        assert_eq!(fast_reply.intent, Intent::Greeting);

        let turns = router.store().get_context("s1").await;
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t.generation == 2));
    }

    #[tokio::test]
    async fn test_audit_record_per_turn() {
        let router = router(Arc::new(SpyLedger::new()));
        router
            .handle_message("s1", Utterance::text("add 500 expense food"))
            .await;
        router.handle_message("s1", Utterance::text("set a budget")).await;

        let records = router.audit_log().list_for_session("s1").await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tool_calls, vec!["add_transaction"]);
        assert_eq!(records[0].outcome, TurnOutcome::Dispatched);
        assert!(records[1].clarification);
        assert!(records[1].tool_calls.is_empty());
        assert_eq!(records[0].text_hash, compute_text_hash("add 500 expense food"));
    }

    #[tokio::test]
    async fn test_follow_up_never_replays_a_recorded_expense() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        router
            .handle_message("s1", Utterance::text("add 500 expense food"))
            .await;
        let reply = router.handle_message("s1", Utterance::text("transport")).await;

        assert_ne!(reply.intent, Intent::AddTransaction);
        assert_eq!(spy.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_task_title_clarification_completes() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        let first = router.handle_message("s1", Utterance::text("remind me")).await;
        assert_eq!(first.intent, Intent::CreateTask);
        assert!(first.clarification);
        assert!(spy.calls().is_empty());

        let second = router.handle_message("s1", Utterance::text("pay the rent")).await;
        assert_eq!(second.intent, Intent::CreateTask);
        assert!(!second.clarification);

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "create_task");
        assert_eq!(calls[0].arguments["title"], json!("pay the rent"));
    }

    #[tokio::test]
    async fn test_budget_answer_with_spending_word_stays_a_budget() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        router.handle_message("s1", Utterance::text("set a budget")).await;
        let reply = router
            .handle_message("s1", Utterance::text("khana ke liye 5000 kharch"))
            .await;
        assert_eq!(reply.intent, Intent::SetBudget);

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "create_budget");
        assert_eq!(calls[0].arguments["category"], json!("Food"));
        assert_eq!(calls[0].arguments["limit"], json!(5000.0));
    }

    #[tokio::test]
    async fn test_turn_in_flight_during_reset_writes_nothing() {
        let spy = Arc::new(SpyLedger::new().with_delay(Duration::from_millis(200)));
        let router = router(spy);

        router.handle_message("s1", Utterance::text("hello")).await;
        let slow = router.handle_message("s1", Utterance::text("add 500 expense food"));
        let reset = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            router.reset_session("s1").await
        };
        let (_, existed) = tokio::join!(slow, reset);

        assert!(existed);
        assert!(router.store().get_context("s1").await.is_empty());
        assert_eq!(router.store().session_count().await, 0);
    }

    #[tokio::test]
    async fn test_reset_clears_pending_clarification() {
        let spy = Arc::new(SpyLedger::new());
        let router = router(spy.clone());

        router.handle_message("s1", Utterance::text("set a budget")).await;
        assert!(router.reset_session("s1").await);
        assert!(!router.reset_session("missing").await);

        let reply = router.handle_message("s1", Utterance::text("food 1000")).await;
        assert_ne!(reply.intent, Intent::SetBudget);
        assert!(spy.calls().is_empty());
    }
}

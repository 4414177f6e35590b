//! Intent Classifier
//!
//! Weighted-keyword scoring over normalized text, adjusted by how complete
//! the extracted entities are for each intent. Multi-turn follow-ups
//! ("food 1000" after "set a budget") are resolved against the session's
//! dialogue state before scoring.

use crate::config::RouterConfig;
use crate::memory::DialogueState;
use crate::models::{ExtractedEntities, Intent, IntentResult, OffTopicKind, Utterance};
use crate::safety::CLARIFICATION_THRESHOLD;
use crate::text;
use std::sync::Arc;
use tracing::debug;

/// What the classifier may know about the conversation so far.
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    pub state: DialogueState,
    /// Intent of the most recent user turn, if any.
    pub last_user_intent: Option<IntentResult>,
}

/// Raw keyword evidence for one intent.
#[derive(Debug, Clone, Copy)]
struct KeywordScore {
    intent: Intent,
    score: f32,
    matches: usize,
}

/// Intent classifier
pub struct IntentClassifier {
    config: Arc<RouterConfig>,
    greetings: Vec<String>,
    advice_keywords: Vec<String>,
}

impl IntentClassifier {
    pub fn new(config: Arc<RouterConfig>) -> Self {
        let variants = &config.spelling_variants;
        let greetings = config
            .greetings
            .iter()
            .map(|g| text::normalize(g, variants))
            .collect();
        let advice_keywords = config
            .advice_keywords
            .iter()
            .map(|k| text::normalize(k, variants))
            .collect();

        Self {
            greetings,
            advice_keywords,
            config,
        }
    }

    /// Classify an utterance; voice input is discounted by its
    /// recognition confidence.
    pub fn classify_utterance(
        &self,
        utterance: &Utterance,
        entities: &ExtractedEntities,
        context: &ClassifierContext,
    ) -> IntentResult {
        let mut result = self.classify(&utterance.text, entities, context);
        if let Some(voice) = utterance.voice_confidence {
            result.confidence = (result.confidence * voice.clamp(0.0, 1.0)).clamp(0.0, 1.0);
        }
        result
    }

    /// Never fails; unclassifiable input is UNKNOWN.
    pub fn classify(
        &self,
        raw: &str,
        entities: &ExtractedEntities,
        context: &ClassifierContext,
    ) -> IntentResult {
        let cfg = &self.config.classifier;
        let normalized = text::normalize(raw, &self.config.spelling_variants);
        let token_count = normalized.split_whitespace().count();

        let raw_scores: Vec<KeywordScore> = Intent::SCORED
            .iter()
            .map(|intent| self.keyword_score(*intent, &normalized))
            .collect();
        let any_keyword = raw_scores.iter().any(|s| s.score > 0.0);

        if token_count > 0
            && token_count <= cfg.greeting_max_tokens
            && !any_keyword
            && self
                .greetings
                .iter()
                .any(|g| text::contains_phrase(&normalized, g))
        {
            return IntentResult::new(Intent::Greeting, 1.0, entities.clone());
        }

        // Pending clarification: a turn supplying a missing slot continues it.
        // Only a complete request for another intent, phrased with more than
        // one keyword, takes over ("khana 5000 kharch" still answers a budget).
        if let DialogueState::AwaitingClarification {
            intent: pending,
            entities: pending_entities,
        } = &context.state
        {
            let supplies_missing = pending
                .missing_slots(pending_entities)
                .iter()
                .any(|slot| entities.has(*slot));
            let takes_over = raw_scores.iter().any(|s| {
                s.intent != *pending
                    && s.matches > 1
                    && s.intent.missing_slots(entities).is_empty()
                    && self.adjust_for_slots(s.intent, s.score, entities) >= CLARIFICATION_THRESHOLD
            });

            if supplies_missing && !takes_over {
                return self.continuation(*pending, entities, pending_entities);
            }
        }

        // Idle follow-up with no keyword of its own ("and transport?"). Only
        // read intents are inherited; a completed write is never replayed.
        if !any_keyword && context.state == DialogueState::Idle {
            if let Some(previous) = &context.last_user_intent {
                let inherits = previous.intent.required_slots().is_empty()
                    && previous
                        .intent
                        .accepted_slots()
                        .iter()
                        .any(|slot| entities.has(*slot));
                if inherits {
                    return self.continuation(previous.intent, entities, &previous.entities);
                }
            }
        }

        let mut best: Option<(Intent, f32)> = None;
        for raw in &raw_scores {
            let score = self.adjust_for_slots(raw.intent, raw.score, entities);
            debug!(intent = %raw.intent, raw_score = raw.score, score, "Intent scored");
            // Strictly greater: earlier intents win ties.
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((raw.intent, score));
            }
        }

        let (intent, confidence) = best.unwrap_or((Intent::Unknown, 0.0));
        if confidence < cfg.min_confidence {
            return IntentResult::unknown(confidence, entities.clone());
        }

        let mut result = IntentResult::new(intent, confidence, entities.clone());
        if intent == Intent::OffTopic {
            let advice = self
                .advice_keywords
                .iter()
                .any(|k| text::contains_phrase(&normalized, k));
            result.off_topic = Some(if advice {
                OffTopicKind::AdviceSeeking
            } else {
                OffTopicKind::Unrelated
            });
        }
        result
    }

    fn keyword_score(&self, intent: Intent, normalized: &str) -> KeywordScore {
        // Folded from +0.0: an empty f32 sum is -0.0.
        let (score, matches) = self
            .config
            .keywords_for(intent)
            .filter(|k| text::contains_phrase(normalized, &k.phrase))
            .fold((0.0_f32, 0), |(score, matches), k| (score + k.weight, matches + 1));

        KeywordScore {
            intent,
            score: score.min(1.0),
            matches,
        }
    }

    fn adjust_for_slots(
        &self,
        intent: Intent,
        raw_score: f32,
        entities: &ExtractedEntities,
    ) -> f32 {
        let cfg = &self.config.classifier;
        if raw_score <= 0.0 || intent.required_slots().is_empty() {
            return raw_score;
        }
        if intent.missing_slots(entities).is_empty() {
            (raw_score + cfg.completeness_bonus).min(1.0)
        } else {
            raw_score.min(cfg.missing_slot_cap)
        }
    }

    fn continuation(
        &self,
        intent: Intent,
        entities: &ExtractedEntities,
        base: &ExtractedEntities,
    ) -> IntentResult {
        let cfg = &self.config.classifier;
        let merged = entities.merged_over(base);
        let confidence = if intent.missing_slots(&merged).is_empty() {
            cfg.continuation_confidence
        } else {
            cfg.missing_slot_cap
        };

        debug!(intent = %intent, confidence, "Continuing previous intent");
        let mut result = IntentResult::new(intent, confidence, merged);
        result.continuation = true;
        result
    }
}

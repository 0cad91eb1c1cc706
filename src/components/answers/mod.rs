//! Answers to free-form questions.
//!
//! The resolver asks the primary service first and falls back to a short
//! encyclopedia lookup. It always produces something to say.

mod openai;
mod wikipedia;

pub use openai::OpenAiClient;
pub use wikipedia::WikipediaClient;

use crate::error::AssistantResult;
use async_trait::async_trait;
use rust_i18n::t;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Primary answering service
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn complete(&self, query: &str) -> AssistantResult<String>;
}

/// Why the secondary lookup found nothing usable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no matching topic")]
    NotFound,
    #[error("topic is ambiguous: {0}")]
    Ambiguous(String),
    #[error("lookup failed: {0}")]
    Provider(String),
}

/// Secondary lookup service
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn summarize(&self, query: &str, max_sentences: u32) -> Result<String, LookupError>;
}

/// Which step of the fallback chain produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Primary,
    Secondary,
    None,
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub source: AnswerSource,
    pub text: String,
    /// Error reported by the primary service, if it was tried and failed
    pub primary_failure: Option<String>,
    /// Error reported by the secondary service, if it was tried and failed
    pub secondary_failure: Option<LookupError>,
}

/// What the primary service made of a question
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryOutcome {
    Answered(Answer),
    /// The lookup should be tried next
    Failed(String),
}

/// Two-step fallback chain over the answer services
#[derive(Clone)]
pub struct AnswerResolver {
    primary: Arc<dyn AnswerService>,
    secondary: Arc<dyn LookupService>,
    max_sentences: u32,
}

impl AnswerResolver {
    pub fn new(
        primary: Arc<dyn AnswerService>,
        secondary: Arc<dyn LookupService>,
        max_sentences: u32,
    ) -> Self {
        Self {
            primary,
            secondary,
            max_sentences,
        }
    }

    /// Text to say for `query`
    pub async fn resolve(&self, query: &str) -> String {
        self.resolve_tagged(query).await.text
    }

    /// Resolve `query`, keeping track of which step answered
    pub async fn resolve_tagged(&self, query: &str) -> Answer {
        match self.ask_primary(query).await {
            PrimaryOutcome::Answered(answer) => answer,
            PrimaryOutcome::Failed(primary_failure) => self.look_up(query, primary_failure).await,
        }
    }

    /// First step of the chain. Empty questions are answered here without any service.
    pub async fn ask_primary(&self, query: &str) -> PrimaryOutcome {
        let query = query.trim();
        if query.is_empty() {
            debug!("Empty question, nothing to look up");
            return PrimaryOutcome::Answered(Answer {
                source: AnswerSource::None,
                text: no_answer(),
                primary_failure: None,
                secondary_failure: None,
            });
        }

        let primary_failure = match self.primary.complete(query).await {
            Ok(text) if !text.trim().is_empty() => {
                return PrimaryOutcome::Answered(Answer {
                    source: AnswerSource::Primary,
                    text: text.trim().to_string(),
                    primary_failure: None,
                    secondary_failure: None,
                });
            }
            Ok(_) => "empty answer".to_string(),
            Err(e) => e.to_string(),
        };
        warn!("Primary answer service failed: {}", primary_failure);

        PrimaryOutcome::Failed(primary_failure)
    }

    /// Second step, run after the primary service failed with `primary_failure`
    pub async fn look_up(&self, query: &str, primary_failure: String) -> Answer {
        match self.secondary.summarize(query.trim(), self.max_sentences).await {
            Ok(summary) => {
                info!("Answered from lookup service");
                Answer {
                    source: AnswerSource::Secondary,
                    text: summary,
                    primary_failure: Some(primary_failure),
                    secondary_failure: None,
                }
            }
            Err(e) => {
                warn!("Lookup service failed: {}", e);
                Answer {
                    source: AnswerSource::None,
                    text: no_answer(),
                    primary_failure: Some(primary_failure),
                    secondary_failure: Some(e),
                }
            }
        }
    }
}

fn no_answer() -> String {
    t!("no_answer").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::provider_error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPrimary(Option<&'static str>);

    #[async_trait]
    impl AnswerService for FixedPrimary {
        async fn complete(&self, _query: &str) -> AssistantResult<String> {
            self.0
                .map(|s| s.to_string())
                .ok_or_else(|| provider_error("quota exceeded"))
        }
    }

    #[derive(Default)]
    struct CountingLookup {
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LookupService for CountingLookup {
        async fn summarize(&self, _query: &str, _max: u32) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map(|s| s.to_string()).ok_or(LookupError::NotFound)
        }
    }

    fn resolver(
        primary: Option<&'static str>,
        lookup: Arc<CountingLookup>,
    ) -> AnswerResolver {
        AnswerResolver::new(Arc::new(FixedPrimary(primary)), lookup, 2)
    }

    #[tokio::test]
    async fn primary_success_skips_lookup() {
        let lookup = Arc::new(CountingLookup::default());
        let answer = resolver(Some("Y"), lookup.clone()).resolve_tagged("q").await;
        assert_eq!(answer.source, AnswerSource::Primary);
        assert_eq!(answer.text, "Y");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back() {
        let lookup = Arc::new(CountingLookup {
            answer: Some("X"),
            ..Default::default()
        });
        let answer = resolver(None, lookup).resolve_tagged("q").await;
        assert_eq!(answer.source, AnswerSource::Secondary);
        assert_eq!(answer.text, "X");
        assert!(answer.primary_failure.unwrap().contains("quota"));
    }

    #[tokio::test]
    async fn both_failing_gives_apology() {
        let lookup = Arc::new(CountingLookup::default());
        let answer = resolver(None, lookup).resolve_tagged("q").await;
        assert_eq!(answer.source, AnswerSource::None);
        assert_eq!(answer.text, "Sorry, I couldn't find an answer.");
        assert_eq!(answer.secondary_failure, Some(LookupError::NotFound));
    }

    #[tokio::test]
    async fn failed_primary_leaves_lookup_to_the_caller() {
        let lookup = Arc::new(CountingLookup {
            answer: Some("X"),
            ..Default::default()
        });
        let resolver = resolver(None, lookup.clone());

        let PrimaryOutcome::Failed(reason) = resolver.ask_primary("q").await else {
            panic!("primary should have failed");
        };
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);

        let answer = resolver.look_up("q", reason).await;
        assert_eq!(answer.text, "X");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_question_is_answered_without_services() {
        let lookup = Arc::new(CountingLookup::default());
        let text = resolver(Some("Y"), lookup.clone()).resolve("").await;
        assert_eq!(text, "Sorry, I couldn't find an answer.");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }
}

//! Fact-extraction critics.
//!
//! Every critic satisfies one contract: resume text in, a validated `FactBag` or a typed
//! `PipelineError` out, bounded by a timeout. Which provider sits behind a critic is a
//! registry concern; the orchestrator never assumes a particular one succeeds.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::analysis::error::PipelineError;
use crate::analysis::facts::FactBag;
use crate::analysis::prompts::{FACT_SYSTEM_TEMPLATE, FACT_USER_TEMPLATE};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{extract_json_object, ChatModel, ChatRequest, LlmError};

const CRITIC_MAX_TOKENS: u32 = 900;
const CRITIC_TEMPERATURE: f32 = 0.1;

#[async_trait]
pub trait FactExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_facts(&self, resume: &str) -> Result<FactBag, PipelineError>;
}

/// Races `call` against `limit`. On expiry the call future is dropped, which aborts the
/// in-flight request, and the stage is reported as a `Timeout`.
pub async fn with_timeout<T, F>(call: F, limit: Duration, stage: &str) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(PipelineError::from),
        Err(_) => Err(PipelineError::Timeout {
            stage: stage.to_string(),
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Parses raw critic output into a validated `FactBag`.
pub fn parse_fact_bag(raw: &str) -> Result<FactBag, PipelineError> {
    let json = extract_json_object(raw)?;
    let bag: FactBag = serde_json::from_str(json)
        .map_err(|e| PipelineError::SchemaViolation(format!("facts json: {e}")))?;
    bag.validate().map_err(PipelineError::SchemaViolation)?;
    Ok(bag)
}

fn fact_system_prompt() -> String {
    FACT_SYSTEM_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
}

/// A critic backed by one upstream chat model.
pub struct LlmCritic {
    name: String,
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl LlmCritic {
    pub fn new(name: impl Into<String>, model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl FactExtractor for LlmCritic {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract_facts(&self, resume: &str) -> Result<FactBag, PipelineError> {
        let system = fact_system_prompt();
        let user = FACT_USER_TEMPLATE.replace("{resume}", resume);
        let request = ChatRequest {
            system: &system,
            user: &user,
            max_tokens: CRITIC_MAX_TOKENS,
            temperature: CRITIC_TEMPERATURE,
            json_mode: true,
        };

        let started = Instant::now();
        let stage = format!("critic {}", self.name);
        let result = with_timeout(self.model.complete(&request), self.timeout, &stage)
            .await
            .and_then(|raw| parse_fact_bag(&raw));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(bag) => info!(
                critic = %self.name,
                provider = self.model.provider().as_str(),
                model = %self.model.model(),
                facts = bag.facts.len(),
                elapsed_ms,
                "critic extracted facts"
            ),
            Err(e) => warn!(
                critic = %self.name,
                provider = self.model.provider().as_str(),
                model = %self.model.model(),
                kind = e.kind(),
                elapsed_ms,
                "critic failed: {e}"
            ),
        }

        result
    }
}

/// Named critics in registration order. The fast critic is picked by name; the rest,
/// in order, form the escalation set.
#[derive(Clone, Default)]
pub struct CriticRegistry {
    critics: Vec<Arc<dyn FactExtractor>>,
}

impl CriticRegistry {
    pub fn new(critics: Vec<Arc<dyn FactExtractor>>) -> Self {
        Self { critics }
    }

    pub fn names(&self) -> Vec<&str> {
        self.critics.iter().map(|c| c.name()).collect()
    }

    /// Returns `(fast, escalation)`. An unknown name falls back to the first critic.
    pub fn split(
        &self,
        fast_name: &str,
    ) -> Option<(Arc<dyn FactExtractor>, Vec<Arc<dyn FactExtractor>>)> {
        let index = match self.critics.iter().position(|c| c.name() == fast_name) {
            Some(i) => i,
            None => {
                warn!(
                    "Unknown fast critic '{fast_name}', falling back to '{}'",
                    self.critics.first()?.name()
                );
                0
            }
        };

        let fast = Arc::clone(self.critics.get(index)?);
        let escalation = self
            .critics
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| Arc::clone(c))
            .collect();
        Some((fast, escalation))
    }
}

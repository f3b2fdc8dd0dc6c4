use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::analysis::critics::{CriticRegistry, FactExtractor, LlmCritic};
use crate::analysis::editor::LlmEditor;
use crate::analysis::orchestrator::AdaptiveOrchestrator;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::llm_client::{
    ChatModel, LlmClient, Provider, CRITIC_A_MODEL, CRITIC_B_MODEL, CRITIC_C_MODEL, EDITOR_MODEL,
};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live analysis pipeline. `None` when credentials are missing, which selects mock mode.
    pub pipeline: Option<Arc<AnalysisPipeline>>,
}

impl AppState {
    /// Builds upstream clients once per process. Without every credential no client is
    /// constructed at all, so mock mode cannot reach a provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (Some(google), Some(openai), Some(anthropic)) = (
            config.google_api_key.clone(),
            config.openai_api_key.clone(),
            config.anthropic_api_key.clone(),
        ) else {
            info!("One or more API keys missing; serving mock scores");
            return Ok(Self { pipeline: None });
        };

        let http = LlmClient::http_client().context("Failed to build HTTP client")?;
        let critic_timeout = Duration::from_millis(config.critic_timeout_ms);

        let critic = |name: &str, model: LlmClient| -> Arc<dyn FactExtractor> {
            Arc::new(LlmCritic::new(name, Arc::new(model), critic_timeout))
        };
        let registry = CriticRegistry::new(vec![
            critic(
                Provider::Gemini.as_str(),
                LlmClient::new(http.clone(), Provider::Gemini, google, CRITIC_A_MODEL),
            ),
            critic(
                Provider::OpenAi.as_str(),
                LlmClient::new(http.clone(), Provider::OpenAi, openai.clone(), CRITIC_B_MODEL),
            ),
            critic(
                Provider::Anthropic.as_str(),
                LlmClient::new(http.clone(), Provider::Anthropic, anthropic, CRITIC_C_MODEL),
            ),
        ]);

        let (fast, escalation) = registry
            .split(&config.fast_critic)
            .context("Critic registry is empty")?;
        info!(
            "Critics registered: {:?}; fast path uses '{}', threshold {}%",
            registry.names(),
            fast.name(),
            config.fast_path_threshold
        );

        let editor_model: Arc<dyn ChatModel> =
            Arc::new(LlmClient::new(http, Provider::OpenAi, openai, EDITOR_MODEL));
        let editor = LlmEditor::new(editor_model, Duration::from_millis(config.editor_timeout_ms));

        let orchestrator =
            AdaptiveOrchestrator::new(fast, escalation, config.fast_path_threshold);

        Ok(Self {
            pipeline: Some(Arc::new(AnalysisPipeline::new(
                orchestrator,
                Arc::new(editor),
            ))),
        })
    }

    pub fn mode(&self) -> &'static str {
        if self.pipeline.is_some() {
            "live"
        } else {
            "mock"
        }
    }
}

use thiserror::Error;

use crate::llm_client::LlmError;

/// Failures the pipeline models and recovers from locally.
/// None of these reach the HTTP boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} timed out after {after_ms}ms")]
    Timeout { stage: String, after_ms: u64 },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("no facts available from any critic")]
    NoFactsAvailable,
}

impl PipelineError {
    /// Short label for logs and notes.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::SchemaViolation(_) => "schema_violation",
            PipelineError::TransportFailure(_) => "transport_failure",
            PipelineError::NoFactsAvailable => "no_facts_available",
        }
    }
}

impl From<LlmError> for PipelineError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Http(_) | LlmError::Api { .. } => {
                PipelineError::TransportFailure(error.to_string())
            }
            LlmError::Parse(_) | LlmError::EmptyContent | LlmError::NoJsonObject => {
                PipelineError::SchemaViolation(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_transport_failures() {
        let err: PipelineError = LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "transport_failure");
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_unparseable_output_is_schema_violation() {
        let parse = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert_eq!(PipelineError::from(LlmError::Parse(parse)).kind(), "schema_violation");
        assert_eq!(PipelineError::from(LlmError::NoJsonObject).kind(), "schema_violation");
        assert_eq!(PipelineError::from(LlmError::EmptyContent).kind(), "schema_violation");
    }

    #[test]
    fn test_timeout_message_names_stage() {
        let err = PipelineError::Timeout {
            stage: "critic gemini".to_string(),
            after_ms: 3500,
        };
        assert_eq!(err.to_string(), "critic gemini timed out after 3500ms");
    }
}

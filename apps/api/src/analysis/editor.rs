//! Constrained rewrite: one editor call that turns merged facts into aligned bullets.
//!
//! The editor sees only the merged facts, the supported phrases and the original resume
//! (for style). Every bullet it returns must cite fact ids; the provenance check
//! downstream drops anything that does not.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::critics::with_timeout;
use crate::analysis::error::PipelineError;
use crate::analysis::facts::FactBag;
use crate::analysis::prompts::{EDITOR_SYSTEM_TEMPLATE, EDITOR_USER_TEMPLATE};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{extract_json_object, ChatModel, ChatRequest};

const EDITOR_MAX_TOKENS: u32 = 1500;
const EDITOR_TEMPERATURE: f32 = 0.2;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedBullet {
    pub bullet: String,
    pub source_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorOutput {
    #[serde(rename = "fitScore")]
    pub fit_score: u32,
    pub missing_keywords: Vec<String>,
    pub key_gaps: Vec<String>,
    pub aligned_resume: Vec<AlignedBullet>,
    pub rationale: String,
}

/// Wire shape as the model returns it. Arrays and rationale may be omitted.
#[derive(Debug, Deserialize)]
struct RawEditorOutput {
    #[serde(rename = "fitScore")]
    fit_score: f64,
    #[serde(default)]
    missing_keywords: Vec<String>,
    #[serde(default)]
    key_gaps: Vec<String>,
    #[serde(default)]
    aligned_resume: Vec<AlignedBullet>,
    #[serde(default)]
    rationale: String,
}

/// Parses and validates raw editor output.
pub fn parse_editor_output(raw: &str) -> Result<EditorOutput, PipelineError> {
    let json = extract_json_object(raw)?;
    let parsed: RawEditorOutput = serde_json::from_str(json)
        .map_err(|e| PipelineError::SchemaViolation(format!("editor json: {e}")))?;

    if !parsed.fit_score.is_finite() || !(0.0..=100.0).contains(&parsed.fit_score) {
        return Err(PipelineError::SchemaViolation(format!(
            "fitScore {} outside 0..=100",
            parsed.fit_score
        )));
    }
    if let Some(pos) = parsed
        .aligned_resume
        .iter()
        .position(|b| b.bullet.trim().is_empty() || b.source_ids.is_empty())
    {
        return Err(PipelineError::SchemaViolation(format!(
            "aligned_resume[{pos}] needs a bullet and at least one source id"
        )));
    }

    Ok(EditorOutput {
        fit_score: parsed.fit_score.round() as u32,
        missing_keywords: parsed.missing_keywords,
        key_gaps: parsed.key_gaps,
        aligned_resume: parsed.aligned_resume,
        rationale: parsed.rationale,
    })
}

/// Inputs to one rewrite. The resume is a style reference, not a source of claims.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    pub facts: &'a FactBag,
    pub resume: &'a str,
    pub supported: &'a [String],
    pub unsupported: &'a [String],
}

#[async_trait]
pub trait ResumeEditor: Send + Sync {
    async fn rewrite(&self, request: RewriteRequest<'_>) -> Result<EditorOutput, PipelineError>;
}

fn editor_system_prompt() -> String {
    EDITOR_SYSTEM_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
}

fn build_editor_prompt(request: RewriteRequest<'_>) -> Result<String, PipelineError> {
    let to_json = |value: serde_json::Result<String>| {
        value.map_err(|e| PipelineError::SchemaViolation(format!("editor input: {e}")))
    };
    let facts_json = to_json(serde_json::to_string_pretty(request.facts))?;
    let supported_json = to_json(serde_json::to_string(request.supported))?;
    let unsupported_json = to_json(serde_json::to_string(request.unsupported))?;

    // One pass over the template, so placeholder text inside facts or the resume stays literal.
    let filled = PLACEHOLDER_RE.replace_all(EDITOR_USER_TEMPLATE, |caps: &Captures<'_>| {
        match &caps[1] {
            "facts_json" => facts_json.clone(),
            "supported_json" => supported_json.clone(),
            "unsupported_json" => unsupported_json.clone(),
            "resume" => request.resume.to_string(),
            _ => caps[0].to_string(),
        }
    });
    Ok(filled.into_owned())
}

pub struct LlmEditor {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl LlmEditor {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }
}

#[async_trait]
impl ResumeEditor for LlmEditor {
    async fn rewrite(&self, request: RewriteRequest<'_>) -> Result<EditorOutput, PipelineError> {
        let system = editor_system_prompt();
        let user = build_editor_prompt(request)?;
        let chat = ChatRequest {
            system: &system,
            user: &user,
            max_tokens: EDITOR_MAX_TOKENS,
            temperature: EDITOR_TEMPERATURE,
            json_mode: true,
        };

        let started = Instant::now();
        let result = with_timeout(self.model.complete(&chat), self.timeout, "editor")
            .await
            .and_then(|raw| parse_editor_output(&raw));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(out) => info!(
                provider = self.model.provider().as_str(),
                model = %self.model.model(),
                bullets = out.aligned_resume.len(),
                elapsed_ms,
                "editor rewrite complete"
            ),
            Err(e) => warn!(
                provider = self.model.provider().as_str(),
                model = %self.model.model(),
                kind = e.kind(),
                elapsed_ms,
                "editor failed: {e}"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::facts::{Fact, FactType};
    use crate::llm_client::{LlmError, Provider};

    struct CannedModel(String);

    #[async_trait]
    impl ChatModel for CannedModel {
        fn provider(&self) -> Provider {
            Provider::OpenAi
        }

        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
            assert!(request.user.contains("\"f1\""));
            assert!(request.json_mode);
            Ok(self.0.clone())
        }
    }

    struct SlowModel;

    #[async_trait]
    impl ChatModel for SlowModel {
        fn provider(&self) -> Provider {
            Provider::OpenAi
        }

        fn model(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _request: &ChatRequest<'_>) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(String::new())
        }
    }

    fn facts() -> FactBag {
        FactBag {
            facts: vec![
                Fact::new("f1", FactType::Skill, "Python"),
                Fact::new("f2", FactType::Achievement, "increased CTR by 18%"),
            ],
        }
    }

    fn request<'a>(facts: &'a FactBag, supported: &'a [String]) -> RewriteRequest<'a> {
        RewriteRequest {
            facts,
            resume: "Built a recommendation engine using Python, increased CTR by 18%.",
            supported,
            unsupported: &[],
        }
    }

    #[test]
    fn test_parse_full_editor_output() {
        let raw = r#"{"fitScore": 72.6, "missing_keywords": ["machine learning"],
            "key_gaps": ["No ML experience listed"],
            "aligned_resume": [{"bullet": "Raised CTR 18% with Python", "source_ids": ["f1", "f2"]}],
            "rationale": "Python matches; ML is missing."}"#;
        let out = parse_editor_output(raw).unwrap();
        assert_eq!(out.fit_score, 73);
        assert_eq!(out.aligned_resume.len(), 1);
        assert_eq!(out.aligned_resume[0].source_ids, vec!["f1", "f2"]);
    }

    #[test]
    fn test_parse_defaults_optional_fields() {
        let out = parse_editor_output(r#"{"fitScore": 40}"#).unwrap();
        assert!(out.aligned_resume.is_empty());
        assert!(out.missing_keywords.is_empty());
        assert_eq!(out.rationale, "");
    }

    #[test]
    fn test_parse_rejects_out_of_range_score() {
        assert!(matches!(
            parse_editor_output(r#"{"fitScore": 140}"#),
            Err(PipelineError::SchemaViolation(_))
        ));
        assert!(matches!(
            parse_editor_output(r#"{"fitScore": -1}"#),
            Err(PipelineError::SchemaViolation(_))
        ));
        assert!(parse_editor_output(r#"{"missing_keywords": []}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_uncited_or_blank_bullets() {
        let raw = r#"{"fitScore": 50, "aligned_resume": [{"bullet": "Led ML team", "source_ids": []}]}"#;
        assert!(matches!(
            parse_editor_output(raw),
            Err(PipelineError::SchemaViolation(_))
        ));

        let raw = r#"{"fitScore": 50, "aligned_resume": [{"bullet": "  ", "source_ids": ["f1"]}]}"#;
        assert!(parse_editor_output(raw).is_err());
    }

    #[test]
    fn test_editor_prompt_carries_facts_and_gaps() {
        let facts = facts();
        let supported = vec!["python".to_string()];
        let unsupported = vec!["machine learning".to_string()];
        let prompt = build_editor_prompt(RewriteRequest {
            unsupported: &unsupported,
            ..request(&facts, &supported)
        })
        .unwrap();

        assert!(prompt.contains("\"id\": \"f2\""));
        assert!(prompt.contains("[\"python\"]"));
        assert!(prompt.contains("[\"machine learning\"]"));
        assert!(prompt.contains("recommendation engine"));
        assert!(!prompt.contains("{facts_json}"));
        assert!(!editor_system_prompt().contains("{json_only}"));
    }

    #[test]
    fn test_editor_prompt_keeps_placeholder_text_in_inputs_literal() {
        let facts = FactBag {
            facts: vec![Fact::new("f1", FactType::Skill, "templating with {resume}")],
        };
        let unsupported = vec!["{facts_json}".to_string()];
        let prompt = build_editor_prompt(RewriteRequest {
            facts: &facts,
            resume: "Wrote docs about {unsupported_json} markers",
            supported: &[],
            unsupported: &unsupported,
        })
        .unwrap();

        assert!(prompt.contains("templating with {resume}"));
        assert!(prompt.contains("[\"{facts_json}\"]"));
        assert!(prompt.contains("Wrote docs about {unsupported_json} markers"));
        assert_eq!(prompt.matches("Wrote docs about").count(), 1);
    }

    #[tokio::test]
    async fn test_llm_editor_parses_model_reply() {
        let editor = LlmEditor::new(
            Arc::new(CannedModel(
                "```json\n{\"fitScore\": 80, \"aligned_resume\": [{\"bullet\": \"Python\", \"source_ids\": [\"f1\"]}]}\n```"
                    .to_string(),
            )),
            Duration::from_secs(5),
        );
        let facts = facts();
        let out = editor.rewrite(request(&facts, &[])).await.unwrap();
        assert_eq!(out.fit_score, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_editor_times_out() {
        let editor = LlmEditor::new(Arc::new(SlowModel), Duration::from_secs(20));
        let facts = facts();
        let err = editor.rewrite(request(&facts, &[])).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { after_ms: 20_000, .. }));
    }
}

//! Analysis pipeline: wires the stages together for one request.
//!
//! Flow: extract_requirements → adaptive extraction → supported/unsupported split →
//!       constrained rewrite → provenance filter → report.
//!
//! Infallible by construction: each modelled failure degrades to a lower rung, and the
//! `note`/`rationale` fields say which rung produced the result.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::coverage::{partition_phrases, Coverage};
use crate::analysis::editor::{ResumeEditor, RewriteRequest};
use crate::analysis::error::PipelineError;
use crate::analysis::orchestrator::{
    AdaptiveOrchestrator, CriticFailure, ExtractionOutcome, ExtractionPath,
};
use crate::analysis::provenance::validate_provenance;
use crate::analysis::requirements::extract_requirements;

pub const LIVE_NOTE_PREFIX: &str = "Live pipeline with JD skill map → adaptive routing.";
pub const EDITOR_DEGRADED_NOTE: &str = "Editor degraded to coverage-only.";

/// Response body of a live analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub fit_score: u32,
    pub uncovered_requirements: Vec<String>,
    pub key_gaps: Vec<String>,
    /// Validated bullets, newline-joined.
    pub aligned_resume: String,
    pub rationale: String,
    pub coverage: Coverage,
    pub critics_count: usize,
    pub note: String,
}

pub struct AnalysisPipeline {
    orchestrator: AdaptiveOrchestrator,
    editor: Arc<dyn ResumeEditor>,
}

impl AnalysisPipeline {
    pub fn new(orchestrator: AdaptiveOrchestrator, editor: Arc<dyn ResumeEditor>) -> Self {
        Self {
            orchestrator,
            editor,
        }
    }

    pub async fn analyze(&self, resume: &str, jd: &str) -> AnalysisReport {
        let requirements = extract_requirements(jd);
        info!(
            must_have = requirements.must_have.len(),
            responsibilities = requirements.responsibilities.len(),
            nice_to_have = requirements.nice_to_have.len(),
            "requirements extracted"
        );

        let outcome = self.orchestrator.run(resume, &requirements).await;
        let (supported, unsupported) = partition_phrases(&requirements, &outcome.facts);
        let mut note = format!("{LIVE_NOTE_PREFIX} {}", self.path_note(&outcome));

        let rewrite = if outcome.facts.facts.is_empty() {
            Err(PipelineError::NoFactsAvailable)
        } else {
            self.editor
                .rewrite(RewriteRequest {
                    facts: &outcome.facts,
                    resume,
                    supported: &supported,
                    unsupported: &unsupported,
                })
                .await
        };

        let (fit_score, key_gaps, aligned_resume, rationale) = match rewrite {
            Ok(output) => {
                let output = validate_provenance(output, &outcome.facts);
                let bullets = output
                    .aligned_resume
                    .iter()
                    .map(|b| b.bullet.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                (output.fit_score, output.key_gaps, bullets, output.rationale)
            }
            Err(error) => {
                warn!(kind = error.kind(), "rewrite unavailable, returning coverage only: {error}");
                note.push(' ');
                note.push_str(EDITOR_DEGRADED_NOTE);
                let rationale = format!(
                    "Editor unavailable ({}): coverage-only response. {} of {} requirement phrases appear in resume facts.",
                    error.kind(),
                    supported.len(),
                    requirements.canonical_phrases.len()
                );
                (
                    outcome.coverage.percent(),
                    outcome.coverage.must_have.items_uncovered.clone(),
                    String::new(),
                    rationale,
                )
            }
        };

        AnalysisReport {
            fit_score,
            uncovered_requirements: unsupported,
            key_gaps,
            aligned_resume,
            rationale,
            critics_count: outcome.contributing_critics.len(),
            coverage: outcome.coverage,
            note,
        }
    }

    fn path_note(&self, outcome: &ExtractionOutcome) -> String {
        let pct = outcome.coverage.percent();
        match outcome.path {
            ExtractionPath::Fast => format!(
                "Fast path (critic {} only). Coverage={pct}%",
                outcome
                    .contributing_critics
                    .first()
                    .map(String::as_str)
                    .unwrap_or("fast")
            ),
            ExtractionPath::Escalated => {
                let fast = outcome
                    .fast_coverage_pct
                    .map_or_else(|| "failed".to_string(), |p| format!("{p}%"));
                let mut detail = format!(
                    "{}; {} critics succeeded; fast coverage {fast}",
                    self.orchestrator.critic_names().join("+"),
                    outcome.contributing_critics.len()
                );
                if !outcome.failures.is_empty() {
                    detail.push_str("; failed: ");
                    detail.push_str(&failure_list(&outcome.failures));
                }
                format!("Full path ({detail}). Coverage={pct}%")
            }
            ExtractionPath::TokenFallback => format!(
                "Token fallback (all critics failed: {}). Coverage={pct}%",
                failure_list(&outcome.failures)
            ),
        }
    }
}

/// `openai (timeout), anthropic (transport_failure)`
fn failure_list(failures: &[CriticFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.critic, f.error.kind()))
        .collect::<Vec<_>>()
        .join(", ")
}

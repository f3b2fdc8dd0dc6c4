//! Axum route handlers for the analysis API.

use anyhow::Context;
use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::analysis::mock::{mock_score, MockScore};
use crate::analysis::pipeline::AnalysisReport;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Both fields are optional and default to empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub jd: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Live(AnalysisReport),
    Mock(MockScore),
}

fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalyzeRequest::default());
    }
    let request = serde_json::from_slice(body).context("request body is not valid JSON")?;
    Ok(request)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /analyze
///
/// Liveness probe for the analysis route.
pub async fn handle_analyze_probe() -> Json<Value> {
    Json(json!({ "ok": true, "route": "/analyze" }))
}

/// POST /analyze
///
/// Scores a resume against a job description. Without upstream credentials this returns
/// the deterministic mock score and makes no model calls.
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = parse_request(&body)?;
    let resume = request.resume.unwrap_or_default();
    let jd = request.jd.unwrap_or_default();

    let Some(pipeline) = state.pipeline.as_ref() else {
        info!("Serving mock score");
        return Ok(Json(AnalyzeResponse::Mock(mock_score(&resume, &jd))));
    };

    info!(
        resume_chars = resume.len(),
        jd_chars = jd.len(),
        "Running live analysis"
    );
    let report = pipeline.analyze(&resume, &jd).await;
    info!(
        fit_score = report.fit_score,
        critics = report.critics_count,
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse::Live(report)))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Modelled pipeline failures (timeouts, schema violations, transport errors, missing facts)
/// are recovered inside the pipeline and never reach this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Analysis failed: {0}")]
    Analysis(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::Analysis(e) => {
                tracing::error!("Analysis failed: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };

        let body = Json(json!({
            "error": "analysis_failed",
            "details": details
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_analysis_error_maps_to_500_with_details() {
        let error = AppError::Analysis(anyhow::anyhow!("boom"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "analysis_failed");
        assert_eq!(body["details"], "boom");
    }
}

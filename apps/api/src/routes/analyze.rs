use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::state::PipelineState;
use crate::state::AppState;

const CV_FIELD: &str = "cv_file";
const JOB_FIELD: &str = "job_description";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub report: String,
    pub state: PipelineState,
}

/// POST /api/v1/analyze
/// Multipart form with `cv_file` (PDF or plain text) and `job_description`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut cv_bytes: Option<Bytes> = None;
    let mut job_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(CV_FIELD) => {
                cv_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?,
                );
            }
            Some(JOB_FIELD) => {
                job_text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?,
                );
            }
            _ => {}
        }
    }

    let cv_bytes =
        cv_bytes.ok_or_else(|| AppError::Validation(format!("Missing '{CV_FIELD}' part")))?;
    let job_text =
        job_text.ok_or_else(|| AppError::Validation(format!("Missing '{JOB_FIELD}' part")))?;

    let span = info_span!("analyze", request_id = %Uuid::new_v4());
    let result = async move {
        info!(
            cv_bytes = cv_bytes.len(),
            job_chars = job_text.chars().count(),
            "Analysis requested"
        );
        let result = state.pipeline.run(cv_bytes, &job_text).await;
        info!(match_level = %result.analysis.match_level, "Analysis finished");
        result
    }
    .instrument(span)
    .await;

    Ok(Json(AnalyzeResponse {
        report: result.report.clone(),
        state: result,
    }))
}

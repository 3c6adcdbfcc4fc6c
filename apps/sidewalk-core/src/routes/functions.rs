use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::services::education::{fallback_text, generate, EducationOutcome, EducationRequest};
use crate::services::insights::{analyze, unavailable_report, AnalysisOutcome, InsightReport};
use crate::services::readings::Reading;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct AnalyzeRequest {
    data: Vec<Reading>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct AnalyzeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    analysis: InsightReport,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EducationTextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    education_text: String,
}

#[utoipa::path(
    post,
    path = "/functions/v1/analyze-sidewalk-data",
    tag = "functions",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Generated report, or the aggregate fallback when the reply was not a report", body = AnalyzeResponse),
        (status = 500, description = "Completion or request failure, with a fallback report", body = AnalyzeResponse)
    )
)]
pub(crate) async fn analyze_sidewalk_data(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<AnalyzeResponse>) {
    let request: AnalyzeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!(error = %err, "unreadable analyze-sidewalk-data request");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeResponse {
                    error: Some(err.to_string()),
                    analysis: unavailable_report(),
                }),
            );
        }
    };

    match analyze(&state.completions, &request.data).await {
        AnalysisOutcome::CompletionFailed { error, report } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AnalyzeResponse {
                error: Some(error.to_string()),
                analysis: report,
            }),
        ),
        outcome => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                error: None,
                analysis: outcome.into_report(),
            }),
        ),
    }
}

#[utoipa::path(
    post,
    path = "/functions/v1/generate-education-text",
    tag = "functions",
    request_body = EducationRequest,
    responses(
        (status = 200, description = "Generated education text", body = EducationTextResponse),
        (status = 500, description = "Completion or request failure, with fallback text", body = EducationTextResponse)
    )
)]
pub(crate) async fn generate_education_text(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<EducationTextResponse>) {
    let request: EducationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!(error = %err, "unreadable generate-education-text request");
            // Name the location if the body got that far.
            let location = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|value| value.get("lokasi").and_then(Value::as_str).map(str::to_string));
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(EducationTextResponse {
                    error: Some(err.to_string()),
                    education_text: fallback_text(location.as_deref()),
                }),
            );
        }
    };

    match generate(&state.completions, &request).await {
        EducationOutcome::Generated(text) => (
            StatusCode::OK,
            Json(EducationTextResponse {
                error: None,
                education_text: text,
            }),
        ),
        EducationOutcome::Fallback { error, text } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EducationTextResponse {
                error: Some(error.to_string()),
                education_text: text,
            }),
        ),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/analyze-sidewalk-data",
            post(analyze_sidewalk_data),
        )
        .route(
            "/functions/v1/generate-education-text",
            post(generate_education_text),
        )
}

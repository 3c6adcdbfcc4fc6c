use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::map_fetch_error;
use crate::services::completion::CompletionClient;
use crate::services::education::{generate, EducationRequest};
use crate::services::readings::ReadingSource;
use crate::state::AppState;
use crate::views::education::EducationPage;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct EducationQuery {
    /// Location name as printed on the sidewalk's QR code.
    location: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/education",
    tag = "education",
    params(EducationQuery),
    responses(
        (status = 200, description = "Public education page for one location", body = EducationPage),
        (status = 400, description = "Missing location"),
        (status = 404, description = "No readings for the location")
    )
)]
pub(crate) async fn education_page_handler(
    State(state): State<AppState>,
    Query(query): Query<EducationQuery>,
) -> Result<Json<EducationPage>, (StatusCode, String)> {
    let location = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "location is required".to_string()))?;
    let page = education_page(state.readings.as_ref(), &state.completions, location).await?;
    Ok(Json(page))
}

pub(crate) async fn education_page<S: ReadingSource>(
    source: &S,
    client: &CompletionClient,
    location: &str,
) -> Result<EducationPage, (StatusCode, String)> {
    let reading = source
        .latest_for_location(location)
        .await
        .map_err(map_fetch_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("No readings for {location}"),
            )
        })?;
    let text = generate(client, &EducationRequest::from(&reading))
        .await
        .into_text();
    Ok(EducationPage::new(&reading, text))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/education", get(education_page_handler))
}

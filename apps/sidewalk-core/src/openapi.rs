use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{analysis, dashboard, education, functions, health, readings, views};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "sidewalk-core",
        description = "Piezoelectric sidewalk monitoring API"
    ),
    paths(
        health::healthz_handler,
        readings::list_readings,
        readings::create_reading,
        readings::live_readings,
        dashboard::dashboard_summary_handler,
        views::locations,
        views::regions,
        views::map,
        views::energy_chart,
        analysis::run_analysis,
        education::education_page_handler,
        functions::analyze_sidewalk_data,
        functions::generate_education_text,
    ),
    components(schemas(
        health::HealthResponse,
        crate::services::readings::Reading,
        crate::services::readings::NewReading,
        crate::services::insights::InsightReport,
        crate::services::insights::Trends,
        crate::services::insights::Trend,
        crate::services::insights::Priority,
        crate::services::insights::ActionPlan,
        crate::services::education::EducationRequest,
        crate::views::education::EducationPage,
        crate::views::education::EnergyEquivalent,
        crate::views::stats::BatchSummary,
        crate::views::cards::ReportTones,
        crate::views::status::Tone,
        crate::views::status::SiteStatus,
        analysis::AnalysisPanelResponse,
        functions::AnalyzeRequest,
        functions::AnalyzeResponse,
        functions::EducationTextResponse,
    )),
    tags(
        (name = "readings", description = "Stored readings and the live feed"),
        (name = "dashboard", description = "Summary cards"),
        (name = "views", description = "Seeded dashboard views"),
        (name = "analysis", description = "Dashboard insight panel"),
        (name = "education", description = "Public education page"),
        (name = "functions", description = "Hosted function endpoints")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to serialize OpenAPI document");
        serde_json::Value::Null
    })
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

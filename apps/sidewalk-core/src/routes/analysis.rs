use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use crate::services::completion::CompletionClient;
use crate::services::insights::{analyze, panel_fallback_report, AnalysisOutcome, InsightReport};
use crate::services::readings::{ReadingSource, RecentQuery};
use crate::state::AppState;
use crate::views::cards::ReportTones;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct AnalysisPanelResponse {
    analysis: InsightReport,
    tones: ReportTones,
    record_count: usize,
    /// Set only when a report was produced from the current batch.
    last_update: Option<DateTime<Utc>>,
}

impl AnalysisPanelResponse {
    fn new(
        analysis: InsightReport,
        record_count: usize,
        last_update: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            tones: ReportTones::from(&analysis),
            analysis,
            record_count,
            last_update,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/analysis",
    tag = "analysis",
    responses(
        (status = 200, description = "Insight report for the most recent batch; a fixed report when analysis is unavailable", body = AnalysisPanelResponse)
    )
)]
pub(crate) async fn run_analysis(State(state): State<AppState>) -> Json<AnalysisPanelResponse> {
    Json(
        analysis_panel(
            state.readings.as_ref(),
            &state.completions,
            state.config.analysis_batch_limit,
        )
        .await,
    )
}

/// Loads the latest batch and runs the insight generator over it. Neither a
/// failed load nor a failed completion is surfaced as an error.
pub(crate) async fn analysis_panel<S: ReadingSource>(
    source: &S,
    client: &CompletionClient,
    batch_limit: i64,
) -> AnalysisPanelResponse {
    let rows = match source.fetch_recent(&RecentQuery::latest(batch_limit)).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(error = %err, "failed to load readings for analysis");
            return AnalysisPanelResponse::new(panel_fallback_report(), 0, None);
        }
    };

    match analyze(client, &rows).await {
        AnalysisOutcome::CompletionFailed { .. } => {
            AnalysisPanelResponse::new(panel_fallback_report(), rows.len(), None)
        }
        outcome => AnalysisPanelResponse::new(outcome.into_report(), rows.len(), Some(Utc::now())),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/analysis", post(run_analysis))
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::map_fetch_error;
use crate::services::readings::{ReadingSource, RecentQuery};
use crate::state::AppState;
use crate::views::cards::{dashboard_summary, DashboardSummary};

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "dashboard",
    responses(
        (status = 200, description = "Summary cards over the most recent batch", body = serde_json::Value),
        (status = 503, description = "Reading source unavailable")
    )
)]
pub(crate) async fn dashboard_summary_handler(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, (StatusCode, String)> {
    let summary = build_summary(
        state.readings.as_ref(),
        state.config.analysis_batch_limit,
        state.config.daily_energy_target_kwh,
    )
    .await?;
    Ok(Json(summary))
}

pub(crate) async fn build_summary<S: ReadingSource>(
    source: &S,
    batch_limit: i64,
    energy_target_kwh: f64,
) -> Result<DashboardSummary, (StatusCode, String)> {
    let rows = source
        .fetch_recent(&RecentQuery::latest(batch_limit))
        .await
        .map_err(map_fetch_error)?;
    Ok(dashboard_summary(&rows, energy_target_kwh))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/summary", get(dashboard_summary_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{reading, MemoryReadingSource};

    #[tokio::test]
    async fn summary_covers_the_latest_batch() {
        let source = MemoryReadingSource::new(vec![
            reading("Jl. Ahmad Yani", 1.0, 90.0, 100, 0),
            reading("Jl. Sudirman", 2.0, 80.0, 200, 1),
            reading("Jl. Ahmad Yani", 3.0, 70.0, 300, 2),
        ]);
        let summary = build_summary(&source, 50, 4.0).await.expect("summary");
        assert_eq!(summary.summary.total_energy_kwh, 6.0);
        assert_eq!(summary.summary.avg_efficiency_percent, 80.0);
        assert_eq!(summary.summary.total_pedestrians, 600);
        assert_eq!(summary.active_locations, 2);
        assert_eq!(summary.target_progress_percent, 150.0);
        assert_eq!(summary.target_bar, 100.0);
        assert_eq!(summary.recent[0].location, "Jl. Ahmad Yani");
    }

    #[tokio::test]
    async fn batch_limit_bounds_the_summary() {
        let rows = (0..8)
            .map(|n| reading(&format!("site-{n}"), 0.5, 80.0, 10, n))
            .collect();
        let source = MemoryReadingSource::new(rows);
        let summary = build_summary(&source, 5, 10.0).await.expect("summary");
        assert_eq!(summary.summary.reading_count, 5);
        assert_eq!(summary.recent[0].location, "site-7");
    }

    #[tokio::test]
    async fn unavailable_source_is_service_unavailable() {
        let source = MemoryReadingSource::new(Vec::new());
        source.set_failing(true);
        let (status, _) = build_summary(&source, 50, 10.0).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}

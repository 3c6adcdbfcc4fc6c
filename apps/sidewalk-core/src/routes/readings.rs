use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::future::ready;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;

use crate::error::map_fetch_error;
use crate::services::live::{LiveSnapshot, LiveView, WorkingSet};
use crate::services::readings::{NewReading, Reading, ReadingSource, RecentQuery};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct RecentReadingsQuery {
    #[param(minimum = 1, maximum = 500)]
    limit: Option<i64>,
    location: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct LiveReadingsQuery {
    location: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/readings",
    tag = "readings",
    params(RecentReadingsQuery),
    responses(
        (status = 200, description = "Most recent readings, newest first", body = Vec<Reading>),
        (status = 503, description = "Reading source unavailable")
    )
)]
pub(crate) async fn list_readings(
    State(state): State<AppState>,
    Query(query): Query<RecentReadingsQuery>,
) -> Result<Json<Vec<Reading>>, (StatusCode, String)> {
    let recent = RecentQuery::latest(query.limit.unwrap_or(state.config.recent_readings_limit))
        .at_location(query.location);
    let rows = state
        .readings
        .fetch_recent(&recent)
        .await
        .map_err(map_fetch_error)?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/readings",
    tag = "readings",
    request_body = NewReading,
    responses(
        (status = 201, description = "Stored reading", body = Reading),
        (status = 400, description = "Invalid reading")
    )
)]
pub(crate) async fn create_reading(
    State(state): State<AppState>,
    Json(payload): Json<NewReading>,
) -> Result<(StatusCode, Json<Reading>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;
    let stored = state
        .readings
        .insert(&payload)
        .await
        .map_err(map_fetch_error)?;
    tracing::info!(
        id = %stored.id,
        lokasi = %stored.location,
        energi_harian = stored.daily_energy_kwh,
        "stored sidewalk reading"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    get,
    path = "/api/readings/live",
    tag = "readings",
    params(LiveReadingsQuery),
    responses(
        (status = 200, description = "Server-sent live snapshots; the event name is replace, prepend or error", body = String, content_type = "text/event-stream")
    )
)]
pub(crate) async fn live_readings(
    State(state): State<AppState>,
    Query(query): Query<LiveReadingsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let view = LiveView::new(
        state.readings.clone(),
        state.live.clone(),
        RecentQuery::latest(state.config.recent_readings_limit).at_location(query.location),
        WorkingSet::new(
            state.config.live_working_set_cap,
            state.config.live_dedupe_by_id,
        ),
    );
    let events = live_updates(view).map(|(kind, snapshot)| {
        let event = Event::default()
            .event(kind)
            .json_data(&snapshot)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "failed to encode live snapshot");
                Event::default().event("error").data("snapshot unavailable")
            });
        Ok(event)
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Drives a live view from its own event stream, yielding the kind of every
/// applied event with the snapshot after it. Inserts already in the loaded
/// batch produce nothing. The view is dropped, and its subscription
/// released, when the stream is.
pub(crate) fn live_updates<S: ReadingSource>(
    view: LiveView<S>,
) -> impl Stream<Item = (&'static str, LiveSnapshot)> + Send + 'static {
    let events = view.events();
    events
        .scan(view, |view, item| {
            let update = match view.handle(item) {
                "duplicate" => None,
                kind => Some((kind, view.snapshot())),
            };
            ready(Some(update))
        })
        .filter_map(ready)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/readings", get(list_readings).post(create_reading))
        .route("/readings/live", get(live_readings))
}

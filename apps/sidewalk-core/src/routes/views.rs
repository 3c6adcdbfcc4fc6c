use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::views::cards::{
    locations_page, seeded_energy_chart, seeded_map, seeded_regions, EnergyChartView, LocationRow,
    MapView, RegionsView,
};
use crate::views::catalog::SIDEWALK_LOCATIONS;
use crate::views::pagination::Page;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct LocationsQuery {
    /// 1-based page; out-of-range values are clamped.
    page: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/views/locations",
    tag = "views",
    params(LocationsQuery),
    responses((status = 200, description = "One page of the sidewalk location table", body = serde_json::Value))
)]
pub(crate) async fn locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Json<Page<LocationRow>> {
    Json(locations_page(
        &SIDEWALK_LOCATIONS,
        state.config.locations_page_size,
        query.page.unwrap_or(1),
    ))
}

#[utoipa::path(
    get,
    path = "/api/views/regions",
    tag = "views",
    responses((status = 200, description = "Region cards and totals", body = serde_json::Value))
)]
pub(crate) async fn regions() -> Json<RegionsView> {
    Json(seeded_regions())
}

#[utoipa::path(
    get,
    path = "/api/views/map",
    tag = "views",
    responses((status = 200, description = "Map sites with status badges", body = serde_json::Value))
)]
pub(crate) async fn map() -> Json<MapView> {
    Json(seeded_map())
}

#[utoipa::path(
    get,
    path = "/api/views/energy-chart",
    tag = "views",
    responses((status = 200, description = "Hourly energy production", body = serde_json::Value))
)]
pub(crate) async fn energy_chart() -> Json<EnergyChartView> {
    Json(seeded_energy_chart())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/views/locations", get(locations))
        .route("/views/regions", get(regions))
        .route("/views/map", get(map))
        .route("/views/energy-chart", get(energy_chart))
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> Value {
        let resp = crate::routes::router(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn location_pages_are_clamped() {
        let last = get_json("/api/views/locations?page=7").await;
        assert_eq!(last["page"], 6);
        assert_eq!(last["total_pages"], 6);
        assert_eq!(last["items"].as_array().unwrap().len(), 1);
        assert_eq!(last["has_next"], false);

        let first = get_json("/api/views/locations?page=0").await;
        assert_eq!(first["page"], 1);
        assert_eq!(first["items"].as_array().unwrap().len(), 5);

        let default = get_json("/api/views/locations").await;
        assert_eq!(default["page"], 1);
    }

    #[tokio::test]
    async fn seeded_views_are_served() {
        let regions = get_json("/api/views/regions").await;
        assert_eq!(regions["total_sidewalks"], 26);

        let map = get_json("/api/views/map").await;
        assert_eq!(map["sites"].as_array().unwrap().len(), 6);

        let chart = get_json("/api/views/energy-chart").await;
        assert_eq!(chart["points"].as_array().unwrap().len(), 12);
        assert_eq!(chart["peak"]["time"], "18:00");
    }
}

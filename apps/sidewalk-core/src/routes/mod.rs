pub mod analysis;
pub mod dashboard;
pub mod education;
pub mod functions;
pub mod health;
pub mod readings;
pub mod views;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderName;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Browser clients call from any origin with the headers hosted function
/// clients send.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(readings::router())
                .merge(dashboard::router())
                .merge(views::router())
                .merge(analysis::router())
                .merge(education::router())
                .merge(crate::openapi::router()),
        )
        .merge(functions::router())
        .layer(cors_layer())
        .with_state(state)
}

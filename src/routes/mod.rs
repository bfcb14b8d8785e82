use axum::Router;

use crate::state::SharedState;

/// `POST /actions`.
pub mod actions;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Running games.
pub mod games;
/// `GET /healthcheck`.
pub mod health;
/// `GET /sse/events`.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(actions::router())
        .merge(games::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

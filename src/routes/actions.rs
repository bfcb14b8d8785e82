use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::action::{ActionRequest, ActionResponse},
    error::AppError,
    services::action_service,
    state::SharedState,
};

/// Inbound half of the chat session: clients relay user actions here.
pub fn router() -> Router<SharedState> {
    Router::new().route("/actions", post(relay_action))
}

/// Relay a button press, form submission or command to the game engine.
///
/// Answers to the actor are published on the event stream, tagged with the
/// returned token.
#[utoipa::path(
    post,
    path = "/actions",
    tag = "actions",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action accepted", body = ActionResponse),
        (status = 400, description = "Malformed identifiers or payload")
    )
)]
pub async fn relay_action(
    State(state): State<SharedState>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(action_service::relay_action(&state, payload).await?))
}

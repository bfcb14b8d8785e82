use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use validator::Validate;

use crate::{
    dto::game::{GameOptionsRequest, GameOptionsView, GameView},
    error::AppError,
    services::game_service,
    state::{SharedState, session::Scope},
};

/// Endpoints exposing and steering running games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/games/{guild_id}/{channel_id}",
            get(get_game).delete(stop_game),
        )
        .route("/games/{guild_id}/{channel_id}/options", put(update_options))
}

#[utoipa::path(
    get,
    path = "/games/{guild_id}/{channel_id}",
    tag = "games",
    params(
        ("guild_id" = String, Path, description = "Guild the game runs in"),
        ("channel_id" = String, Path, description = "Channel the game runs in")
    ),
    responses(
        (status = 200, description = "Current game", body = GameView),
        (status = 404, description = "No game in this channel")
    )
)]
/// Return the public state of the game running in a channel.
pub async fn get_game(
    State(state): State<SharedState>,
    Path((guild_id, channel_id)): Path<(String, String)>,
) -> Result<Json<GameView>, AppError> {
    let scope = Scope::new(guild_id, channel_id);
    Ok(Json(game_service::game_view(&state, &scope).await?))
}

#[utoipa::path(
    delete,
    path = "/games/{guild_id}/{channel_id}",
    tag = "games",
    params(
        ("guild_id" = String, Path, description = "Guild the game runs in"),
        ("channel_id" = String, Path, description = "Channel the game runs in")
    ),
    responses(
        (status = 202, description = "Stop requested"),
        (status = 404, description = "No game in this channel"),
        (status = 409, description = "Game already shutting down")
    )
)]
/// Stop the game running in a channel.
pub async fn stop_game(
    State(state): State<SharedState>,
    Path((guild_id, channel_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let scope = Scope::new(guild_id, channel_id);
    game_service::stop_game(&state, &scope).await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    put,
    path = "/games/{guild_id}/{channel_id}/options",
    tag = "games",
    params(
        ("guild_id" = String, Path, description = "Guild the game runs in"),
        ("channel_id" = String, Path, description = "Channel the game runs in")
    ),
    request_body = GameOptionsRequest,
    responses(
        (status = 200, description = "Options applied from the next phase", body = GameOptionsView),
        (status = 400, description = "Out-of-range values or no matching words"),
        (status = 404, description = "No game in this channel"),
        (status = 409, description = "Game already shutting down")
    )
)]
/// Change the options of the game running in a channel.
pub async fn update_options(
    State(state): State<SharedState>,
    Path((guild_id, channel_id)): Path<(String, String)>,
    Json(payload): Json<GameOptionsRequest>,
) -> Result<Json<GameOptionsView>, AppError> {
    payload.validate()?;
    let scope = Scope::new(guild_id, channel_id);
    Ok(Json(
        game_service::update_options(&state, &scope, payload).await?,
    ))
}

use tracing::info;

use crate::{
    dto::game::{GameOptionsRequest, GameOptionsView, GameView},
    error::ServiceError,
    state::{SharedState, session::Scope},
};

fn not_running(scope: &Scope) -> ServiceError {
    ServiceError::NotFound(format!("no game running in {scope}"))
}

/// Public view of the game running in `scope`.
pub async fn game_view(state: &SharedState, scope: &Scope) -> Result<GameView, ServiceError> {
    state
        .engine()
        .snapshot(scope)
        .await
        .map(GameView::from)
        .ok_or_else(|| not_running(scope))
}

/// Merge `request` into the options of the game of `scope`.
///
/// The running phase keeps its countdown; the new options apply from the next phase.
pub async fn update_options(
    state: &SharedState,
    scope: &Scope,
    request: GameOptionsRequest,
) -> Result<GameOptionsView, ServiceError> {
    let engine = state.engine();
    let mut options = engine
        .snapshot(scope)
        .await
        .ok_or_else(|| not_running(scope))?
        .options;
    request.apply_to(&mut options);

    if engine.words().candidates(&options).next().is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "no words in pools {:?} for language `{}`",
            options.wordpools, options.language
        )));
    }

    let view = GameOptionsView::from(&options);
    engine.configure(scope, options)?;
    info!(%scope, "game options replaced");
    Ok(view)
}

/// Ask the game of `scope` to stop.
pub async fn stop_game(state: &SharedState, scope: &Scope) -> Result<(), ServiceError> {
    let engine = state.engine();
    if engine.snapshot(scope).await.is_none() {
        return Err(not_running(scope));
    }
    engine.stop_game(scope)?;
    info!(%scope, "game stop requested");
    Ok(())
}

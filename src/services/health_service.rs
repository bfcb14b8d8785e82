use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the number of running games and stream clients.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.engine().active_games(), state.events().subscribers())
}

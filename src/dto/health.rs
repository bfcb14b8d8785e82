use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the server answers.
    pub status: String,
    /// Number of games currently registered.
    pub active_games: usize,
    /// Number of clients connected to the event stream.
    pub subscribers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(active_games: usize, subscribers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_games,
            subscribers,
        }
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::session::SessionError;

/// Errors raised while a game handles an action or changes phase.
#[derive(Debug, Error)]
pub enum GameError {
    /// The actor may not do this right now; only they are told why.
    #[error("{0}")]
    Rejected(String),
    /// The game reached a state the phase machine never produces.
    #[error("invariant violated: {0}")]
    Invariant(String),
    /// No word matches the configured pools and language.
    #[error("no words available in pools {pools:?} for language `{language}`")]
    EmptyWordPool {
        /// Pools enabled in the game options.
        pools: Vec<String>,
        /// Language enabled in the game options.
        language: String,
    },
    /// The chat session refused an outward call.
    #[error("chat session failure: {0}")]
    Session(#[from] SessionError),
    /// The chat session refused a call the phase change depends on.
    #[error("phase transition failed: {0}")]
    Transition(#[source] SessionError),
}

impl GameError {
    /// Shorthand for a [`GameError::Rejected`] with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        GameError::Rejected(reason.into())
    }

    /// Whether the error must abort the game.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::Invariant(_) | GameError::EmptyWordPool { .. } | GameError::Transition(_)
        )
    }

    /// Escalate session failures: during a phase change they are fatal.
    pub fn in_transition(self) -> Self {
        match self {
            GameError::Session(source) => GameError::Transition(source),
            other => other,
        }
    }
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Rejected(reason) => ServiceError::InvalidState(reason),
            other => ServiceError::InvalidState(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_state_corruption_is_fatal() {
        assert!(GameError::Invariant("x".into()).is_fatal());
        assert!(
            GameError::EmptyWordPool {
                pools: vec!["classic".into()],
                language: "en".into()
            }
            .is_fatal()
        );
        assert!(!GameError::rejected("nope").is_fatal());

        let session = GameError::from(SessionError::UnknownNotification(uuid::Uuid::nil()));
        assert!(!session.is_fatal());
        assert!(session.in_transition().is_fatal());
    }

    #[test]
    fn service_errors_map_to_http_statuses() {
        let response = AppError::from(ServiceError::NotFound("game".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(ServiceError::from(GameError::rejected("busy"))).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

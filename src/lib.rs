//! Library crate for just-one-back, exposing modules for binaries and tests.

/// Server configuration and game option defaults.
pub mod config;
/// Request, response and event payloads.
pub mod dto;
/// Game, service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Operations behind the routes and the SSE chat session.
pub mod services;
/// Game engine and shared application state.
pub mod state;

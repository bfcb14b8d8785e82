/// Inbound chat actions.
pub mod action_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Read-only game views.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Chat session published over Server-Sent Events.
pub mod sse_session;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Inbound chat actions.
pub mod action;
/// Public game views and option updates.
pub mod game;
/// Health check payload.
pub mod health;
/// Events published on the SSE stream.
pub mod sse;
/// Custom validators.
pub mod validation;

fn format_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

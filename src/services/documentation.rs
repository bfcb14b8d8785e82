use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Just One Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::actions::relay_action,
        crate::routes::games::get_game,
        crate::routes::games::stop_game,
        crate::routes::games::update_options,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::action::ActionRequest,
            crate::dto::action::ActorInput,
            crate::dto::action::ActionKindInput,
            crate::dto::action::ActionResponse,
            crate::dto::game::GameView,
            crate::dto::game::ParticipantView,
            crate::dto::game::GameOptionsView,
            crate::dto::game::GameOptionsRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::NotificationEvent,
            crate::dto::sse::NotificationDeletedEvent,
            crate::dto::sse::SelectionPromptEvent,
            crate::dto::sse::TextPromptEvent,
            crate::dto::sse::ReplyEvent,
            crate::dto::sse::ReplyUpdatedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "actions", description = "Inbound chat actions"),
        (name = "games", description = "Running games"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/events",
            "/actions",
            "/games/{guild_id}/{channel_id}",
            "/games/{guild_id}/{channel_id}/options",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

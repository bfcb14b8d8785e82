//! Payloads of the `/actions` endpoint, the inbound half of the chat session.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::validate_snowflake,
    state::{
        ActionOutcome,
        session::{
            ActionKind, ActionPayload, InboundAction, InteractionContext, Participant, Scope,
        },
    },
};

/// UI element that produced the action.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKindInput {
    /// Button press.
    Button,
    /// Values picked in a select menu.
    Selection,
    /// Text form submission.
    TextSubmit,
    /// Slash command.
    Command,
}

impl From<ActionKindInput> for ActionKind {
    fn from(kind: ActionKindInput) -> Self {
        match kind {
            ActionKindInput::Button => ActionKind::Button,
            ActionKindInput::Selection => ActionKind::Selection,
            ActionKindInput::TextSubmit => ActionKind::TextSubmit,
            ActionKindInput::Command => ActionKind::Command,
        }
    }
}

/// Who performed the action.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ActorInput {
    /// Platform identifier of the user.
    #[validate(custom(function = "validate_snowflake"))]
    pub id: String,
    /// Display name of the user.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// One user action relayed by a chat client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ActionRequest {
    /// Guild the action happened in.
    #[validate(custom(function = "validate_snowflake"))]
    pub guild_id: String,
    /// Channel the action happened in.
    #[validate(custom(function = "validate_snowflake"))]
    pub channel_id: String,
    /// UI element behind the action.
    pub kind: ActionKindInput,
    /// Button id, form id or command name (`start`, `stop`).
    #[validate(length(min = 1, max = 100))]
    pub action_id: String,
    /// User who acted.
    #[validate(nested)]
    pub actor: ActorInput,
    /// Interaction token echoed on private events. Generated when omitted.
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub token: Option<String>,
    /// Picked values, for `selection` actions.
    #[serde(default)]
    pub values: Vec<String>,
    /// Entered text, for `text_submit` actions.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub text: Option<String>,
}

impl ActionRequest {
    /// Interaction token of the request, generating one when the client sent none.
    pub fn interaction_token(&self) -> String {
        self.token
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
    }
}

impl From<ActionRequest> for InboundAction {
    fn from(request: ActionRequest) -> Self {
        let token = request.interaction_token();
        let scope = Scope::new(request.guild_id, request.channel_id);
        let kind = ActionKind::from(request.kind);
        let payload = match kind {
            ActionKind::Selection => ActionPayload::Selected(request.values),
            ActionKind::TextSubmit => ActionPayload::Text(request.text.unwrap_or_default()),
            ActionKind::Button | ActionKind::Command => ActionPayload::Empty,
        };
        InboundAction {
            context: InteractionContext {
                token,
                scope: scope.clone(),
            },
            scope,
            kind,
            action_id: request.action_id,
            actor: Participant::new(request.actor.id, request.actor.name),
            payload,
        }
    }
}

/// What became of a relayed action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// `delivered`, `handled`, `rejected` or `unhandled`.
    pub status: String,
    /// Token to match private events with this action.
    pub token: String,
    /// Answer sent to the actor, when the engine produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    /// Response describing `outcome` for the action carrying `token`.
    pub fn new(token: String, outcome: ActionOutcome) -> Self {
        let (status, message) = match outcome {
            ActionOutcome::Delivered => ("delivered", None),
            ActionOutcome::Handled(message) => ("handled", Some(message)),
            ActionOutcome::Rejected(message) => ("rejected", Some(message)),
            ActionOutcome::Unhandled => ("unhandled", None),
        };
        Self {
            status: status.to_string(),
            token,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: ActionKindInput) -> ActionRequest {
        ActionRequest {
            guild_id: "1".into(),
            channel_id: "2".into(),
            kind,
            action_id: "guess-form".into(),
            actor: ActorInput {
                id: "42".into(),
                name: "Ada".into(),
            },
            token: Some("tok".into()),
            values: vec!["7".into()],
            text: Some(" Banana ".into()),
        }
    }

    #[test]
    fn payload_follows_the_kind() {
        let action = InboundAction::from(request(ActionKindInput::TextSubmit));
        assert_eq!(action.payload, ActionPayload::Text(" Banana ".into()));
        assert_eq!(action.context.token, "tok");
        assert_eq!(action.scope, Scope::new("1", "2"));

        let action = InboundAction::from(request(ActionKindInput::Selection));
        assert_eq!(action.payload.selected(), ["7".to_string()]);

        let action = InboundAction::from(request(ActionKindInput::Button));
        assert_eq!(action.payload, ActionPayload::Empty);
    }

    #[test]
    fn missing_token_is_generated() {
        let mut request = request(ActionKindInput::Button);
        request.token = None;
        assert!(!request.interaction_token().is_empty());
    }

    #[test]
    fn ids_must_be_snowflakes() {
        assert!(request(ActionKindInput::Button).validate().is_ok());

        let mut bad = request(ActionKindInput::Button);
        bad.guild_id = "guild".into();
        assert!(bad.validate().is_err());

        let mut bad = request(ActionKindInput::Button);
        bad.actor.id = String::new();
        assert!(bad.validate().is_err());
    }
}

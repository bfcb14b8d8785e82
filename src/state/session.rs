//! Boundary between the game engine and the chat platform that carries it.
//!
//! The engine never talks to a transport directly: everything it needs from the
//! chat platform goes through [`ChatSession`], and everything the platform
//! delivers arrives as an [`InboundAction`].

use std::{error::Error, fmt};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::state::timer::Countdown;

/// Result alias for chat session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error raised by a chat session regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The notification is unknown to the session (deleted or never posted).
    #[error("unknown notification `{0}`")]
    UnknownNotification(Uuid),
    /// The platform refused or failed to deliver the request.
    #[error("chat session unavailable: {message}")]
    Unavailable {
        /// What the session was trying to do.
        message: String,
        /// Transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl SessionError {
    /// Construct an unavailable error from any transport failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        SessionError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Platform identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat user taking part in a game.
///
/// Equality and hashing only look at [`Participant::id`]; the display name is
/// informational and may change between two actions of the same user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Stable platform identifier.
    pub id: ParticipantId,
    /// Display name at the time of the last action.
    pub name: String,
}

impl Participant {
    /// Build a participant handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id.into()),
            name: name.into(),
        }
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Participant {}

impl std::hash::Hash for Participant {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Guild/channel pair a game lives in. At most one game exists per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Identifier of the guild (server).
    pub guild_id: String,
    /// Identifier of the channel inside the guild.
    pub channel_id: String,
}

impl Scope {
    /// Build a scope from its two identifiers.
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.guild_id, self.channel_id)
    }
}

/// Handle on a message posted by the engine, used to edit or delete it later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationHandle {
    /// Session-assigned identifier of the message.
    pub id: Uuid,
    /// Channel the message was posted in.
    pub scope: Scope,
}

/// In-flight UI context of one interaction (button press, form submission, ...).
///
/// The engine keeps these around to push follow-up prompts to a participant
/// without posting a new public message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionContext {
    /// Platform token identifying the interaction.
    pub token: String,
    /// Channel the interaction happened in.
    pub scope: Scope,
}

/// Kind of inbound action delivered by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A button press.
    Button,
    /// A submitted select menu.
    Selection,
    /// A submitted text form.
    TextSubmit,
    /// A slash command.
    Command,
}

/// Kind-specific data attached to an inbound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    /// Nothing beyond the action itself (buttons, commands).
    Empty,
    /// Values picked in a select menu.
    Selected(Vec<String>),
    /// Text entered in a form.
    Text(String),
}

impl ActionPayload {
    /// Submitted text, or an empty string for other payloads.
    pub fn text(&self) -> &str {
        match self {
            ActionPayload::Text(text) => text,
            _ => "",
        }
    }

    /// Selected values, or an empty slice for other payloads.
    pub fn selected(&self) -> &[String] {
        match self {
            ActionPayload::Selected(values) => values,
            _ => &[],
        }
    }
}

/// One user action delivered by the chat platform.
#[derive(Debug, Clone)]
pub struct InboundAction {
    /// Channel the action happened in.
    pub scope: Scope,
    /// What kind of UI element produced the action.
    pub kind: ActionKind,
    /// Identifier of the UI element (button id, form id, command name).
    pub action_id: String,
    /// Who performed the action.
    pub actor: Participant,
    /// Context used to answer the actor.
    pub context: InteractionContext,
    /// Kind-specific data.
    pub payload: ActionPayload,
}

/// Clickable control attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Action identifier reported back when the control is used.
    pub action_id: String,
    /// Label shown to users.
    pub label: String,
}

impl Control {
    /// Build a control from an action id and a label.
    pub fn new(action_id: &str, label: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
            label: label.to_string(),
        }
    }
}

/// Transport-agnostic content of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline of the message.
    pub title: String,
    /// Body, one entry per line.
    pub lines: Vec<String>,
    /// Countdown to display, if the message is timed.
    pub countdown: Option<Countdown>,
    /// Controls attached to the message.
    pub controls: Vec<Control>,
}

/// One entry of a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Text shown to the user.
    pub label: String,
    /// Value reported back when picked.
    pub value: String,
}

/// Select menu pushed to a single participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPrompt {
    /// Action identifier reported back on submission.
    pub action_id: String,
    /// Explanation shown above the menu.
    pub lines: Vec<String>,
    /// Entries of the menu.
    pub options: Vec<SelectOption>,
    /// Minimum number of picks.
    pub min_values: usize,
    /// Maximum number of picks.
    pub max_values: usize,
    /// Countdown to display next to the menu.
    pub countdown: Option<Countdown>,
}

/// Text form pushed to a single participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPrompt {
    /// Action identifier reported back on submission.
    pub action_id: String,
    /// Title of the form.
    pub title: String,
    /// Label of the single input field.
    pub label: String,
    /// Minimum accepted length.
    pub min_length: usize,
    /// Maximum accepted length.
    pub max_length: usize,
    /// Pre-filled value, used when editing a previous entry.
    pub initial: Option<String>,
}

/// Capabilities the engine needs from the chat platform.
pub trait ChatSession: Send + Sync {
    /// Post a public message in `scope`.
    fn post_notification(
        &self,
        scope: Scope,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<NotificationHandle>>;
    /// Replace the content of a posted message.
    fn edit_notification(
        &self,
        handle: NotificationHandle,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>>;
    /// Delete a posted message.
    fn delete_notification(&self, handle: NotificationHandle) -> BoxFuture<'_, SessionResult<()>>;
    /// Show a select menu to the participant behind `context`.
    fn prompt_selection(
        &self,
        context: InteractionContext,
        prompt: SelectionPrompt,
    ) -> BoxFuture<'_, SessionResult<()>>;
    /// Show a text form to the participant behind `context`.
    fn prompt_text_entry(
        &self,
        context: InteractionContext,
        prompt: TextPrompt,
    ) -> BoxFuture<'_, SessionResult<()>>;
    /// Answer the participant behind `context` privately.
    fn reply(&self, context: InteractionContext, message: String)
    -> BoxFuture<'_, SessionResult<()>>;
    /// Re-render the private view previously shown through `context`.
    fn update_reply(
        &self,
        context: InteractionContext,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>>;
}

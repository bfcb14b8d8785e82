use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_time,
    state::{
        session::{
            Control, InteractionContext, Notification, NotificationHandle, Scope, SelectOption,
            SelectionPrompt, TextPrompt,
        },
        timer::Countdown,
    },
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name, `message` when absent.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Number of games running when the client connected.
    pub active_games: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Countdown attached to a message: a deadline, or `elapsed` once over.
pub struct CountdownView {
    /// RFC 3339 deadline while the countdown runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    /// Whether the countdown is over.
    pub elapsed: bool,
}

impl From<Countdown> for CountdownView {
    fn from(countdown: Countdown) -> Self {
        match countdown {
            Countdown::EndsAt(at) => Self {
                ends_at: Some(format_time(at)),
                elapsed: false,
            },
            Countdown::Elapsed => Self {
                ends_at: None,
                elapsed: true,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Button rendered under a message.
pub struct ControlView {
    /// Action id to relay when pressed.
    pub action_id: String,
    /// Button text.
    pub label: String,
}

impl From<&Control> for ControlView {
    fn from(control: &Control) -> Self {
        Self {
            action_id: control.action_id.clone(),
            label: control.label.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Renderable content of a public message or private view.
pub struct NotificationView {
    /// Headline.
    pub title: String,
    /// Body, one entry per line.
    pub lines: Vec<String>,
    /// Countdown of the phase, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownView>,
    /// Buttons, in display order.
    pub controls: Vec<ControlView>,
}

impl From<&Notification> for NotificationView {
    fn from(content: &Notification) -> Self {
        Self {
            title: content.title.clone(),
            lines: content.lines.clone(),
            countdown: content.countdown.map(CountdownView::from),
            controls: content.controls.iter().map(ControlView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a public message is posted or edited.
pub struct NotificationEvent {
    /// Identifier to use for later edits and deletion.
    pub id: Uuid,
    /// Guild of the message.
    pub guild_id: String,
    /// Channel of the message.
    pub channel_id: String,
    /// What the message shows.
    #[serde(flatten)]
    pub content: NotificationView,
}

impl NotificationEvent {
    /// Event for `handle` now showing `content`.
    pub fn new(handle: &NotificationHandle, content: &Notification) -> Self {
        Self {
            id: handle.id,
            guild_id: handle.scope.guild_id.clone(),
            channel_id: handle.scope.channel_id.clone(),
            content: NotificationView::from(content),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a public message is removed.
pub struct NotificationDeletedEvent {
    /// Identifier of the removed message.
    pub id: Uuid,
    /// Guild of the message.
    pub guild_id: String,
    /// Channel of the message.
    pub channel_id: String,
}

impl From<&NotificationHandle> for NotificationDeletedEvent {
    fn from(handle: &NotificationHandle) -> Self {
        Self {
            id: handle.id,
            guild_id: handle.scope.guild_id.clone(),
            channel_id: handle.scope.channel_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Addressee of a private event: the interaction it answers.
pub struct Recipient {
    /// Interaction token the client sent with its action.
    pub token: String,
    /// Guild of the interaction.
    pub guild_id: String,
    /// Channel of the interaction.
    pub channel_id: String,
}

impl From<&InteractionContext> for Recipient {
    fn from(context: &InteractionContext) -> Self {
        let Scope {
            guild_id,
            channel_id,
        } = &context.scope;
        Self {
            token: context.token.clone(),
            guild_id: guild_id.clone(),
            channel_id: channel_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Entry of a selection prompt.
pub struct SelectOptionView {
    /// Text shown to the user.
    pub label: String,
    /// Value relayed when picked.
    pub value: String,
}

impl From<&SelectOption> for SelectOptionView {
    fn from(option: &SelectOption) -> Self {
        Self {
            label: option.label.clone(),
            value: option.value.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Select menu to show to one participant.
pub struct SelectionPromptEvent {
    /// Interaction answered.
    #[serde(flatten)]
    pub recipient: Recipient,
    /// Action id to relay with the picked values.
    pub action_id: String,
    /// Explanation shown above the menu.
    pub lines: Vec<String>,
    /// Entries to pick from.
    pub options: Vec<SelectOptionView>,
    /// Fewest values the user may pick.
    pub min_values: usize,
    /// Most values the user may pick.
    pub max_values: usize,
    /// Countdown of the phase, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownView>,
}

impl SelectionPromptEvent {
    /// Event showing `prompt` to the participant behind `context`.
    pub fn new(context: &InteractionContext, prompt: &SelectionPrompt) -> Self {
        Self {
            recipient: Recipient::from(context),
            action_id: prompt.action_id.clone(),
            lines: prompt.lines.clone(),
            options: prompt.options.iter().map(SelectOptionView::from).collect(),
            min_values: prompt.min_values,
            max_values: prompt.max_values,
            countdown: prompt.countdown.map(CountdownView::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Single-field text form to show to one participant.
pub struct TextPromptEvent {
    /// Interaction answered.
    #[serde(flatten)]
    pub recipient: Recipient,
    /// Action id to relay with the entered text.
    pub action_id: String,
    /// Form title.
    pub title: String,
    /// Label of the text field.
    pub label: String,
    /// Shortest accepted text.
    pub min_length: usize,
    /// Longest accepted text.
    pub max_length: usize,
    /// Text prefilled in the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
}

impl TextPromptEvent {
    /// Event showing `prompt` to the participant behind `context`.
    pub fn new(context: &InteractionContext, prompt: &TextPrompt) -> Self {
        Self {
            recipient: Recipient::from(context),
            action_id: prompt.action_id.clone(),
            title: prompt.title.clone(),
            label: prompt.label.clone(),
            min_length: prompt.min_length,
            max_length: prompt.max_length,
            initial: prompt.initial.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Private text answer to one participant.
pub struct ReplyEvent {
    /// Interaction answered.
    #[serde(flatten)]
    pub recipient: Recipient,
    /// Text of the answer.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Re-rendered private view of one participant.
pub struct ReplyUpdatedEvent {
    /// Interaction answered.
    #[serde(flatten)]
    pub recipient: Recipient,
    /// New content of the view.
    pub content: NotificationView,
}

//! In-memory [`ChatSession`] double and action builders for tests.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use futures::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use crate::state::session::{
    ActionKind, ActionPayload, ChatSession, InboundAction, InteractionContext, Notification,
    NotificationHandle, Participant, Scope, SelectionPrompt, SessionError, SessionResult,
    TextPrompt,
};

/// One outward call observed by [`RecordingSession`].
#[derive(Debug, Clone)]
pub enum SessionCall {
    Posted {
        handle: NotificationHandle,
        content: Notification,
    },
    Edited {
        handle: NotificationHandle,
        content: Notification,
    },
    Deleted {
        handle: NotificationHandle,
    },
    SelectionPrompted {
        context: InteractionContext,
        prompt: SelectionPrompt,
    },
    TextPrompted {
        context: InteractionContext,
        prompt: TextPrompt,
    },
    Replied {
        context: InteractionContext,
        message: String,
    },
    ReplyUpdated {
        context: InteractionContext,
        content: Notification,
    },
}

/// Session that records every call and fails edits of unknown notifications.
#[derive(Debug, Default)]
pub struct RecordingSession {
    calls: Mutex<Vec<SessionCall>>,
    live: Mutex<HashSet<Uuid>>,
}

impl RecordingSession {
    fn record(&self, call: SessionCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn is_live(&self, handle: &NotificationHandle) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&handle.id)
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&SessionCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    /// Titles of every posted or edited notification, in order.
    pub fn titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::Posted { content, .. } | SessionCall::Edited { content, .. } => {
                    Some(content.title)
                }
                _ => None,
            })
            .collect()
    }

    /// Private replies sent to `actor`, in order.
    pub fn replies_to(&self, actor: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::Replied { context, message } if actor_of(&context) == actor => {
                    Some(message)
                }
                _ => None,
            })
            .collect()
    }
}

impl ChatSession for RecordingSession {
    fn post_notification(
        &self,
        scope: Scope,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<NotificationHandle>> {
        let handle = NotificationHandle {
            id: Uuid::new_v4(),
            scope,
        };
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id);
        self.record(SessionCall::Posted {
            handle: handle.clone(),
            content,
        });
        async move { Ok(handle) }.boxed()
    }

    fn edit_notification(
        &self,
        handle: NotificationHandle,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = if self.is_live(&handle) {
            self.record(SessionCall::Edited { handle, content });
            Ok(())
        } else {
            Err(SessionError::UnknownNotification(handle.id))
        };
        async move { result }.boxed()
    }

    fn delete_notification(&self, handle: NotificationHandle) -> BoxFuture<'_, SessionResult<()>> {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id);
        let result = if removed {
            self.record(SessionCall::Deleted { handle });
            Ok(())
        } else {
            Err(SessionError::UnknownNotification(handle.id))
        };
        async move { result }.boxed()
    }

    fn prompt_selection(
        &self,
        context: InteractionContext,
        prompt: SelectionPrompt,
    ) -> BoxFuture<'_, SessionResult<()>> {
        self.record(SessionCall::SelectionPrompted { context, prompt });
        async { Ok(()) }.boxed()
    }

    fn prompt_text_entry(
        &self,
        context: InteractionContext,
        prompt: TextPrompt,
    ) -> BoxFuture<'_, SessionResult<()>> {
        self.record(SessionCall::TextPrompted { context, prompt });
        async { Ok(()) }.boxed()
    }

    fn reply(
        &self,
        context: InteractionContext,
        message: String,
    ) -> BoxFuture<'_, SessionResult<()>> {
        self.record(SessionCall::Replied { context, message });
        async { Ok(()) }.boxed()
    }

    fn update_reply(
        &self,
        context: InteractionContext,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>> {
        self.record(SessionCall::ReplyUpdated { context, content });
        async { Ok(()) }.boxed()
    }
}

fn actor_of(context: &InteractionContext) -> &str {
    context.token.split('/').next().unwrap_or_default()
}

/// Participant whose name is its id in upper case.
pub fn participant(id: &str) -> Participant {
    Participant::new(id, id.to_uppercase())
}

/// Action without payload performed by `actor` in `scope`.
pub fn action(scope: &Scope, kind: ActionKind, action_id: &str, actor: &str) -> InboundAction {
    action_with(scope, kind, action_id, actor, ActionPayload::Empty)
}

/// Action carrying `payload`. The interaction token starts with the actor id.
pub fn action_with(
    scope: &Scope,
    kind: ActionKind,
    action_id: &str,
    actor: &str,
    payload: ActionPayload,
) -> InboundAction {
    InboundAction {
        scope: scope.clone(),
        kind,
        action_id: action_id.to_string(),
        actor: participant(actor),
        context: InteractionContext {
            token: format!("{actor}/{action_id}/{}", Uuid::new_v4()),
            scope: scope.clone(),
        },
        payload,
    }
}

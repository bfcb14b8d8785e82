//! [`ChatSession`] backed by the SSE stream: every outward call becomes a
//! named event that connected chat clients render.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::sse::{
        NotificationDeletedEvent, NotificationEvent, NotificationView, Recipient, ReplyEvent,
        ReplyUpdatedEvent, SelectionPromptEvent, ServerEvent, TextPromptEvent,
    },
    state::{
        SseHub,
        session::{
            ChatSession, InteractionContext, Notification, NotificationHandle, Scope,
            SelectionPrompt, SessionError, SessionResult, TextPrompt,
        },
    },
};

/// Chat session that publishes to an [`SseHub`].
pub struct SseSession {
    hub: Arc<SseHub>,
    live: DashMap<Uuid, Scope>,
}

impl SseSession {
    /// Session publishing on `hub`.
    pub fn new(hub: Arc<SseHub>) -> Self {
        Self {
            hub,
            live: DashMap::new(),
        }
    }

    /// Number of public messages that were posted and not deleted yet.
    pub fn live_notifications(&self) -> usize {
        self.live.len()
    }

    fn publish<T: Serialize>(&self, name: &str, payload: &T) -> SessionResult<()> {
        let event = ServerEvent::json(Some(name.to_string()), payload).map_err(|err| {
            SessionError::unavailable(format!("failed to encode `{name}` event"), err)
        })?;
        debug!(event = name, "publishing session event");
        self.hub.broadcast(event);
        Ok(())
    }

    fn ensure_live(&self, handle: &NotificationHandle) -> SessionResult<()> {
        if self.live.contains_key(&handle.id) {
            Ok(())
        } else {
            Err(SessionError::UnknownNotification(handle.id))
        }
    }
}

impl ChatSession for SseSession {
    fn post_notification(
        &self,
        scope: Scope,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<NotificationHandle>> {
        let handle = NotificationHandle {
            id: Uuid::new_v4(),
            scope,
        };
        let result = self
            .publish(
                "notification.posted",
                &NotificationEvent::new(&handle, &content),
            )
            .map(|()| {
                self.live.insert(handle.id, handle.scope.clone());
                handle
            });
        async move { result }.boxed()
    }

    fn edit_notification(
        &self,
        handle: NotificationHandle,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = self.ensure_live(&handle).and_then(|()| {
            self.publish(
                "notification.edited",
                &NotificationEvent::new(&handle, &content),
            )
        });
        async move { result }.boxed()
    }

    fn delete_notification(&self, handle: NotificationHandle) -> BoxFuture<'_, SessionResult<()>> {
        let result = match self.live.remove(&handle.id) {
            Some(_) => self.publish(
                "notification.deleted",
                &NotificationDeletedEvent::from(&handle),
            ),
            None => Err(SessionError::UnknownNotification(handle.id)),
        };
        async move { result }.boxed()
    }

    fn prompt_selection(
        &self,
        context: InteractionContext,
        prompt: SelectionPrompt,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = self.publish(
            "prompt.selection",
            &SelectionPromptEvent::new(&context, &prompt),
        );
        async move { result }.boxed()
    }

    fn prompt_text_entry(
        &self,
        context: InteractionContext,
        prompt: TextPrompt,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = self.publish("prompt.text", &TextPromptEvent::new(&context, &prompt));
        async move { result }.boxed()
    }

    fn reply(
        &self,
        context: InteractionContext,
        message: String,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = self.publish(
            "reply",
            &ReplyEvent {
                recipient: Recipient::from(&context),
                message,
            },
        );
        async move { result }.boxed()
    }

    fn update_reply(
        &self,
        context: InteractionContext,
        content: Notification,
    ) -> BoxFuture<'_, SessionResult<()>> {
        let result = self.publish(
            "reply.updated",
            &ReplyUpdatedEvent {
                recipient: Recipient::from(&context),
                content: NotificationView::from(&content),
            },
        );
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::state::{session::Control, timer::Countdown};

    fn session() -> (SseSession, Receiver<ServerEvent>) {
        let hub = Arc::new(SseHub::new(16));
        let receiver = hub.subscribe();
        (SseSession::new(hub), receiver)
    }

    fn content(title: &str) -> Notification {
        Notification {
            title: title.into(),
            lines: vec!["line".into()],
            countdown: Some(Countdown::Elapsed),
            controls: vec![Control::new("join", "Join")],
        }
    }

    fn next(receiver: &mut Receiver<ServerEvent>) -> (String, Value) {
        let event = receiver.try_recv().unwrap();
        let data = serde_json::from_str(&event.data).unwrap();
        (event.event.unwrap(), data)
    }

    #[tokio::test]
    async fn notifications_are_published_until_deleted() {
        let (session, mut receiver) = session();
        let scope = Scope::new("1", "2");

        let handle = session
            .post_notification(scope.clone(), content("Lobby"))
            .await
            .unwrap();
        let (name, data) = next(&mut receiver);
        assert_eq!(name, "notification.posted");
        assert_eq!(data["id"], handle.id.to_string());
        assert_eq!(data["channel_id"], "2");
        assert_eq!(data["title"], "Lobby");
        assert_eq!(data["countdown"]["elapsed"], true);
        assert_eq!(data["controls"][0]["action_id"], "join");

        session
            .edit_notification(handle.clone(), content("Round 1"))
            .await
            .unwrap();
        assert_eq!(next(&mut receiver).1["title"], "Round 1");

        session.delete_notification(handle.clone()).await.unwrap();
        assert_eq!(next(&mut receiver).0, "notification.deleted");
        assert_eq!(session.live_notifications(), 0);

        assert!(matches!(
            session.edit_notification(handle.clone(), content("late")).await,
            Err(SessionError::UnknownNotification(_))
        ));
        assert!(matches!(
            session.delete_notification(handle).await,
            Err(SessionError::UnknownNotification(_))
        ));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn private_events_carry_the_interaction_token() {
        let (session, mut receiver) = session();
        let context = InteractionContext {
            token: "tok-1".into(),
            scope: Scope::new("1", "2"),
        };

        session
            .reply(context.clone(), "You joined the game.".into())
            .await
            .unwrap();
        let (name, data) = next(&mut receiver);
        assert_eq!(name, "reply");
        assert_eq!(data["token"], "tok-1");
        assert_eq!(data["message"], "You joined the game.");

        session
            .prompt_text_entry(
                context,
                TextPrompt {
                    action_id: "hint-form".into(),
                    title: "Your hint".into(),
                    label: "Hint".into(),
                    min_length: 1,
                    max_length: 40,
                    initial: None,
                },
            )
            .await
            .unwrap();
        let (name, data) = next(&mut receiver);
        assert_eq!(name, "prompt.text");
        assert_eq!(data["action_id"], "hint-form");
        assert!(data.get("initial").is_none());
    }
}

//! Routing of inbound actions to the game whose active phase claims them.

use dashmap::DashMap;
use tokio::sync::mpsc::error::SendError;
use tracing::{debug, trace};

use crate::state::{
    game::{GameCommand, GameInbox},
    session::{ActionKind, InboundAction, Scope},
};

/// Action a phase is able to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    /// Kind of UI element the action comes from.
    pub kind: ActionKind,
    /// Identifier of the UI element.
    pub action_id: &'static str,
}

impl Handler {
    /// Declare a handler for `action_id` actions of the given kind.
    pub const fn new(kind: ActionKind, action_id: &'static str) -> Self {
        Self { kind, action_id }
    }
}

/// A handler registered for one scope, with the inbox of the owning game.
#[derive(Debug, Clone)]
pub struct Registration {
    handler: Handler,
    inbox: GameInbox,
}

impl Registration {
    /// Whether this registration claims `action`.
    pub fn accepts(&self, action: &InboundAction) -> bool {
        self.handler.kind == action.kind && self.handler.action_id == action.action_id
    }

    /// The registered handler.
    pub fn handler(&self) -> Handler {
        self.handler
    }
}

/// Result of [`EventRouter::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// The action was queued to the owning game.
    Delivered,
    /// No live registration matched; the action is handed back.
    Unhandled(InboundAction),
}

/// Per-scope table of the handlers declared by active phases.
#[derive(Debug, Default)]
pub struct EventRouter {
    registrations: DashMap<Scope, Vec<Registration>>,
}

impl EventRouter {
    /// Empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handlers` for `scope`. Handlers already present are kept once.
    pub fn register_handlers(&self, scope: &Scope, handlers: &[Handler], inbox: &GameInbox) {
        let mut entry = self.registrations.entry(scope.clone()).or_default();
        for handler in handlers {
            if entry.iter().any(|registration| registration.handler == *handler) {
                continue;
            }
            entry.push(Registration {
                handler: *handler,
                inbox: inbox.clone(),
            });
        }
        debug!(%scope, count = entry.len(), "handlers registered");
    }

    /// Remove `handlers` from `scope`, dropping the scope once nothing is left.
    pub fn deregister_handlers(&self, scope: &Scope, handlers: &[Handler]) {
        let Some(mut entry) = self.registrations.get_mut(scope) else {
            return;
        };
        entry.retain(|registration| !handlers.contains(&registration.handler));
        let empty = entry.is_empty();
        drop(entry);

        if empty {
            self.registrations
                .remove_if(scope, |_, registrations| registrations.is_empty());
        }
        debug!(%scope, "handlers deregistered");
    }

    /// Handlers currently registered for `scope`.
    pub fn registered(&self, scope: &Scope) -> Vec<Handler> {
        self.registrations
            .get(scope)
            .map(|entry| entry.iter().map(Registration::handler).collect())
            .unwrap_or_default()
    }

    /// Queue `action` to the game that registered a matching handler.
    pub fn dispatch(&self, action: InboundAction) -> Dispatch {
        let inbox = self.registrations.get(&action.scope).and_then(|entry| {
            entry
                .iter()
                .find(|registration| registration.accepts(&action))
                .map(|registration| registration.inbox.clone())
        });

        let Some(inbox) = inbox else {
            trace!(scope = %action.scope, action_id = %action.action_id, "no handler registered");
            return Dispatch::Unhandled(action);
        };

        let Err(SendError(GameCommand::Action(action))) =
            inbox.send(GameCommand::Action(action))
        else {
            return Dispatch::Delivered;
        };
        debug!(scope = %action.scope, action_id = %action.action_id, "game inbox closed");
        Dispatch::Unhandled(action)
    }
}

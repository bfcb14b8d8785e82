//! Registry of running games and entry point for inbound actions.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::GameOptions,
    error::GameError,
    state::{
        game::{Game, GameCommand, GameDeps, GameDirectory, GameHandle, GameSnapshot},
        phase::{START, STOP},
        router::{Dispatch, EventRouter},
        session::{ActionKind, ChatSession, InboundAction, InteractionContext, Participant, Scope},
        words::WordCatalog,
    },
};

const NOT_AVAILABLE: &str = "This action is not available right now.";

/// What became of an inbound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Queued to the game whose phase claims it.
    Delivered,
    /// Command handled by the engine itself.
    Handled(String),
    /// Command refused; the reason was sent to the actor.
    Rejected(String),
    /// Nothing claims the action; the actor was told.
    Unhandled,
}

/// Owner of every game, at most one per channel.
pub struct Engine {
    games: GameDirectory,
    router: Arc<EventRouter>,
    session: Arc<dyn ChatSession>,
    words: Arc<WordCatalog>,
    defaults: GameOptions,
}

impl Engine {
    /// Build an engine talking to `session`, with `defaults` for new games.
    pub fn new(session: Arc<dyn ChatSession>, words: WordCatalog, defaults: GameOptions) -> Self {
        Self {
            games: Arc::new(DashMap::new()),
            router: Arc::new(EventRouter::new()),
            session,
            words: Arc::new(words),
            defaults,
        }
    }

    /// Routing table shared with the games.
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Catalog new words are drawn from.
    pub fn words(&self) -> &WordCatalog {
        &self.words
    }

    /// Number of games currently registered.
    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    /// Start a game in `scope` with `initial` participants. Fails if one already runs there.
    pub fn start_game(&self, scope: Scope, initial: Vec<Participant>) -> Result<Uuid, GameError> {
        match self.games.entry(scope.clone()) {
            Entry::Occupied(_) => Err(GameError::rejected(
                "A game is already running in this channel.",
            )),
            Entry::Vacant(slot) => {
                let (inbox, commands) = mpsc::unbounded_channel();
                let deps = GameDeps {
                    session: Arc::clone(&self.session),
                    router: Arc::clone(&self.router),
                    words: Arc::clone(&self.words),
                    directory: Arc::clone(&self.games),
                };
                let game = Game::new(
                    scope.clone(),
                    initial,
                    self.defaults.clone(),
                    deps,
                    inbox.clone(),
                );
                let id = game.id();
                slot.insert(GameHandle { id, inbox });
                tokio::spawn(game.run(commands));
                info!(game_id = %id, %scope, "game registered");
                Ok(id)
            }
        }
    }

    fn send(&self, scope: &Scope, command: GameCommand) -> Result<(), GameError> {
        let inbox = self
            .games
            .get(scope)
            .map(|handle| handle.inbox.clone())
            .ok_or_else(|| GameError::rejected("No game is running in this channel."))?;
        inbox
            .send(command)
            .map_err(|_| GameError::rejected("The game of this channel is shutting down."))
    }

    /// Ask the game of `scope` to stop.
    pub fn stop_game(&self, scope: &Scope) -> Result<(), GameError> {
        self.send(scope, GameCommand::Stop)
    }

    /// Replace the options of the game of `scope`, effective from its next phase.
    pub fn configure(&self, scope: &Scope, options: GameOptions) -> Result<(), GameError> {
        self.send(scope, GameCommand::Configure(options))
    }

    /// Read-only view of the game of `scope`, if any.
    pub async fn snapshot(&self, scope: &Scope) -> Option<GameSnapshot> {
        let (reply, answer) = oneshot::channel();
        self.send(scope, GameCommand::Inspect(reply)).ok()?;
        answer.await.ok()
    }

    /// Handle one inbound action: commands here, everything else through the router.
    pub async fn handle_action(&self, action: InboundAction) -> ActionOutcome {
        if action.kind == ActionKind::Command {
            return self.handle_command(action).await;
        }

        match self.router.dispatch(action) {
            Dispatch::Delivered => ActionOutcome::Delivered,
            Dispatch::Unhandled(action) => {
                self.reply(&action.context, NOT_AVAILABLE.to_string()).await;
                ActionOutcome::Unhandled
            }
        }
    }

    async fn handle_command(&self, action: InboundAction) -> ActionOutcome {
        let result = match action.action_id.as_str() {
            START => self
                .start_game(action.scope.clone(), vec![action.actor.clone()])
                .map(|_| "Game started! Others can join from the lobby message.".to_string()),
            STOP => self
                .stop_game(&action.scope)
                .map(|()| "Stopping the game.".to_string()),
            _ => {
                self.reply(&action.context, NOT_AVAILABLE.to_string()).await;
                return ActionOutcome::Unhandled;
            }
        };

        match result {
            Ok(message) => {
                self.reply(&action.context, message.clone()).await;
                ActionOutcome::Handled(message)
            }
            Err(err) => {
                let reason = err.to_string();
                self.reply(&action.context, reason.clone()).await;
                ActionOutcome::Rejected(reason)
            }
        }
    }

    async fn reply(&self, context: &InteractionContext, message: String) {
        if let Err(err) = self.session.reply(context.clone(), message).await {
            warn!(scope = %context.scope, error = %err, "failed to reply to participant");
        }
    }
}

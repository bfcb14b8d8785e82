//! Per-game actor: owns the rotation and the live phase of one channel.
//!
//! Every game runs on its own Tokio task and drains an unbounded inbox of
//! [`GameCommand`]s, one at a time. Timer callbacks and observers never touch
//! game state directly; they enqueue a command tagged with the timer id so that
//! notifications from replaced timers can be told apart and ignored.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::GameOptions,
    error::GameError,
    state::{
        phase::{self, Lobby, LobbyRound, Next, Phase, PhaseKind},
        render,
        rotation::Rotation,
        router::EventRouter,
        session::{
            ChatSession, InboundAction, InteractionContext, Notification, NotificationHandle,
            Participant, ParticipantId, Scope,
        },
        timer::{Countdown, Timer, TimerId},
        words::WordCatalog,
    },
};

/// Sending half of a game inbox.
pub type GameInbox = mpsc::UnboundedSender<GameCommand>;

/// Live games keyed by the channel they run in.
pub type GameDirectory = Arc<DashMap<Scope, GameHandle>>;

/// Everything a game can be asked to do.
#[derive(Debug)]
pub enum GameCommand {
    /// A routed user action.
    Action(InboundAction),
    /// A timer finished (stopped or expired).
    TimerElapsed(TimerId),
    /// A timer deadline moved.
    CountdownChanged(TimerId, Countdown),
    /// New options, applied from the next phase on.
    Configure(GameOptions),
    /// Request a read-only view of the game.
    Inspect(oneshot::Sender<GameSnapshot>),
    /// End the game.
    Stop,
}

/// Registry entry of a running game.
#[derive(Debug, Clone)]
pub struct GameHandle {
    /// Identifier of the game, distinct for successive games in a channel.
    pub id: Uuid,
    /// Inbox of the game task.
    pub inbox: GameInbox,
}

/// Services shared by every game.
#[derive(Clone)]
pub struct GameDeps {
    /// Chat platform the game talks to.
    pub session: Arc<dyn ChatSession>,
    /// Routing table for the handlers of active phases.
    pub router: Arc<EventRouter>,
    /// Source of secret words.
    pub words: Arc<WordCatalog>,
    /// Registry the game removes itself from once it stops.
    pub directory: GameDirectory,
}

/// Why a game is stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Someone used `/stop`.
    Requested,
    /// The last participant left.
    Deserted,
    /// The game hit an unrecoverable error.
    Failed(String),
}

/// Read-only view of a game, answered by the game task itself.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    /// Identifier of the game.
    pub id: Uuid,
    /// Channel of the game.
    pub scope: Scope,
    /// Active phase.
    pub phase: PhaseKind,
    /// Number of rounds started so far.
    pub round: u32,
    /// Participants who have not guessed during the current cycle.
    pub queue: Vec<Participant>,
    /// Past guessers, oldest first.
    pub history: Vec<Participant>,
    /// Guesser of the running round.
    pub guesser: Option<Participant>,
    /// Secret word of the running round.
    pub word: Option<String>,
    /// Helpers who submitted a hint, while hints are hidden.
    pub hint_authors: Vec<Participant>,
    /// Hints shown to the guesser, during guessing only.
    pub visible_hints: Vec<String>,
    /// Time left on the phase countdown.
    pub remaining: Option<Duration>,
    /// Participants who may still vote to hurry.
    pub hurry_votes_left: usize,
    /// Whether the game is winding down after a stop.
    pub stopping: bool,
    /// Options in effect.
    pub options: GameOptions,
}

/// Aggregate root of one game.
pub struct Game {
    pub(crate) id: Uuid,
    pub(crate) scope: Scope,
    pub(crate) rotation: Rotation,
    pub(crate) options: GameOptions,
    pub(crate) phase: Phase,
    pub(crate) anchor: Option<NotificationHandle>,
    pub(crate) round: u32,
    cleanup: Option<Timer>,
    finished: bool,
    deps: GameDeps,
    inbox: GameInbox,
}

impl Game {
    /// Build a game in its first lobby and register the lobby handlers.
    ///
    /// Nothing is posted until [`Game::run`] starts.
    pub fn new(
        scope: Scope,
        initial: impl IntoIterator<Item = Participant>,
        options: GameOptions,
        deps: GameDeps,
        inbox: GameInbox,
    ) -> Self {
        let phase = Phase::Lobby(Lobby::new(LobbyRound::First, None));
        deps.router
            .register_handlers(&scope, phase.handlers(), &inbox);
        Self {
            id: Uuid::new_v4(),
            scope,
            rotation: Rotation::new(initial),
            options,
            phase,
            anchor: None,
            round: 0,
            cleanup: None,
            finished: false,
            deps,
            inbox,
        }
    }

    /// Identifier of the game.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the game until it is stopped and cleaned up.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<GameCommand>) {
        info!(game_id = %self.id, scope = %self.scope, "game started");
        if let Err(err) = self.announce_lobby().await {
            self.fail(err.in_transition()).await;
        }

        while !self.finished {
            let Some(command) = commands.recv().await else {
                break;
            };
            self.handle_command(command).await;
        }

        self.retire();
        info!(game_id = %self.id, scope = %self.scope, rounds = self.round, "game finished");
    }

    async fn handle_command(&mut self, command: GameCommand) {
        match command {
            GameCommand::Action(action) => self.on_action(action).await,
            GameCommand::TimerElapsed(timer_id) => self.on_timer_elapsed(timer_id).await,
            GameCommand::CountdownChanged(timer_id, countdown) => {
                self.on_countdown_changed(timer_id, countdown).await
            }
            GameCommand::Configure(options) => {
                info!(game_id = %self.id, ?options, "game options updated");
                self.options = options;
            }
            GameCommand::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
            GameCommand::Stop => self.stop(StopReason::Requested).await,
        }
    }

    pub(crate) fn session(&self) -> Arc<dyn ChatSession> {
        Arc::clone(&self.deps.session)
    }

    pub(crate) fn words(&self) -> Arc<WordCatalog> {
        Arc::clone(&self.deps.words)
    }

    async fn on_action(&mut self, action: InboundAction) {
        let accepted = self.cleanup.is_none()
            && self
                .phase
                .handlers()
                .iter()
                .any(|handler| handler.kind == action.kind && handler.action_id == action.action_id);

        let result = if !accepted {
            Err(GameError::rejected(phase::STALE_ACTION))
        } else {
            match action.action_id.as_str() {
                phase::LEAVE => self.leave(&action.actor).await,
                phase::HURRY => self.hurry(&action.actor.id),
                _ => match self.phase.kind() {
                    PhaseKind::Lobby => self.lobby_action(&action).await,
                    PhaseKind::HintGiving => self.hint_giving_action(&action).await,
                    PhaseKind::InvalidReview => self.invalid_review_action(&action).await,
                    PhaseKind::Guessing => self.guessing_action(&action).await,
                },
            }
        };

        match result {
            Ok(Some(message)) => self.reply(&action.context, message).await,
            Ok(None) => {}
            Err(GameError::Rejected(reason)) => {
                debug!(
                    game_id = %self.id,
                    participant = %action.actor.id,
                    action_id = %action.action_id,
                    %reason,
                    "action rejected"
                );
                self.reply(&action.context, reason).await;
            }
            Err(err) if err.is_fatal() => self.fail(err).await,
            Err(err) => warn!(
                game_id = %self.id,
                participant = %action.actor.id,
                action_id = %action.action_id,
                error = %err,
                "action handling failed"
            ),
        }
    }

    async fn reply(&self, context: &InteractionContext, message: String) {
        if let Err(err) = self.deps.session.reply(context.clone(), message).await {
            warn!(game_id = %self.id, error = %err, "failed to reply to participant");
        }
    }

    /// Remove a participant from the game and from the running phase.
    async fn leave(&mut self, actor: &Participant) -> Result<Option<String>, GameError> {
        if !self.rotation.leave(actor) {
            return Err(GameError::rejected("You are not part of this game."));
        }
        info!(
            game_id = %self.id,
            participant = %actor.id,
            phase = %self.phase.kind(),
            participants = self.rotation.len(),
            "participant left"
        );

        if self.rotation.is_empty() {
            self.stop(StopReason::Deserted).await;
            return Ok(None);
        }
        if self.phase.guesser() == Some(actor) {
            if let Some(summary) = self.phase.abandon() {
                self.advance(Next::Lobby(summary)).await?;
            }
            return Ok(Some("You left the game.".to_string()));
        }

        match &mut self.phase {
            Phase::HintGiving(phase) => phase.remove_participant(&actor.id),
            Phase::InvalidReview(phase) => phase.remove_participant(&actor.id),
            Phase::Lobby(_) | Phase::Guessing(_) => {}
        }
        if let Some(timer) = self.phase.timer_mut() {
            timer.revoke(&actor.id);
        }

        self.refresh_anchor().await?;
        Ok(Some("You left the game.".to_string()))
    }

    fn hurry(&mut self, participant: &ParticipantId) -> Result<Option<String>, GameError> {
        let Some(timer) = self.phase.timer_mut() else {
            return Err(GameError::rejected("There is no countdown to hurry."));
        };
        if !timer.request_speed_up(participant) {
            return Err(GameError::rejected(
                "You already voted or this countdown is not waiting for you.",
            ));
        }
        debug!(
            game_id = %self.id,
            %participant,
            votes_left = timer.authorised().len(),
            "hurry-up vote"
        );
        Ok(Some("Your hurry-up vote was counted.".to_string()))
    }

    /// Replace the live phase: deregister, destroy the old timer, register, swap.
    pub(crate) fn install(&mut self, next: Phase) {
        let router = &self.deps.router;
        router.deregister_handlers(&self.scope, self.phase.handlers());
        if let Some(mut timer) = self.phase.timer_mut().take() {
            timer.destroy();
        }
        router.register_handlers(&self.scope, next.handlers(), &self.inbox);
        debug!(
            game_id = %self.id,
            from = %self.phase.kind(),
            to = %next.kind(),
            "phase installed"
        );
        self.phase = next;
    }

    /// Start a timer whose callback and observer report to this game's inbox.
    fn arm_timer(&self, authorised: Vec<ParticipantId>, duration: Duration) -> Timer {
        let inbox = self.inbox.clone();
        let timer = Timer::start(authorised, duration, move |timer_id| {
            let _ = inbox.send(GameCommand::TimerElapsed(timer_id));
        });
        let inbox = self.inbox.clone();
        timer.observe(move |timer_id, countdown| {
            let _ = inbox.send(GameCommand::CountdownChanged(timer_id, countdown));
        });
        timer
    }

    /// Arm the countdown of the live phase.
    pub(crate) fn arm_phase(&mut self, authorised: Vec<ParticipantId>, duration: Duration) {
        let timer = self.arm_timer(authorised, duration);
        debug!(
            game_id = %self.id,
            timer_id = %timer.id(),
            phase = %self.phase.kind(),
            duration_s = duration.as_secs(),
            "phase timer armed"
        );
        *self.phase.timer_mut() = Some(timer);
    }

    async fn on_timer_elapsed(&mut self, timer_id: TimerId) {
        if self.cleanup.as_ref().is_some_and(|timer| timer.id() == timer_id) {
            self.finalize().await;
            return;
        }
        if self.cleanup.is_some() || self.phase.timer().map(Timer::id) != Some(timer_id) {
            debug!(game_id = %self.id, %timer_id, "ignoring stale timer");
            return;
        }

        let next = self.phase.conclude(self.rotation.len(), &self.options);
        if let Err(err) = self.advance(next).await {
            self.fail(err).await;
        }
    }

    async fn on_countdown_changed(&mut self, timer_id: TimerId, countdown: Countdown) {
        if self.cleanup.is_some()
            || countdown == Countdown::Elapsed
            || self.phase.timer().map(Timer::id) != Some(timer_id)
        {
            return;
        }
        if let Err(err) = self.refresh_anchor().await {
            warn!(game_id = %self.id, error = %err, "failed to refresh the countdown");
        }
    }

    /// Move to the phase chosen by [`Phase::conclude`].
    ///
    /// Session failures here are escalated: a phase the players can't see is fatal.
    pub(crate) async fn advance(&mut self, next: Next) -> Result<(), GameError> {
        let result = match next {
            Next::ExtendLobby => self.extend_lobby().await,
            Next::HintGiving => self.begin_round().await,
            Next::InvalidReview(seed) => self.begin_review(seed).await,
            Next::Guessing(seed) => self.begin_guessing(seed).await,
            Next::Lobby(summary) => self.restart_lobby(summary).await,
        };
        result.map_err(GameError::in_transition)
    }

    /// Replace the content of the anchor notification.
    pub(crate) async fn edit_anchor(&self, content: Notification) -> Result<(), GameError> {
        let anchor = self
            .anchor
            .clone()
            .ok_or_else(|| GameError::Invariant("no anchor notification to edit".into()))?;
        self.deps.session.edit_notification(anchor, content).await?;
        Ok(())
    }

    /// Re-render the live phase on the anchor.
    pub(crate) async fn refresh_anchor(&self) -> Result<(), GameError> {
        self.edit_anchor(self.render_current()).await
    }

    /// Anchor content for the live phase.
    pub(crate) fn render_current(&self) -> Notification {
        let countdown = self.phase.timer().map(Timer::countdown);
        match &self.phase {
            Phase::Lobby(lobby) => render::lobby(
                lobby,
                &self.rotation.active(),
                self.options.min_participants,
                countdown,
            ),
            Phase::HintGiving(phase) => render::hint_giving(self.round, phase, countdown),
            Phase::InvalidReview(phase) => render::invalid_review(self.round, phase, countdown),
            Phase::Guessing(phase) => render::guessing(self.round, phase, countdown),
        }
    }

    /// Abort after an unrecoverable error.
    async fn fail(&mut self, err: GameError) {
        error!(
            game_id = %self.id,
            scope = %self.scope,
            phase = %self.phase.kind(),
            error = %err,
            "game aborted"
        );
        self.stop(StopReason::Failed(err.to_string())).await;
    }

    /// Wind the game down: no more handlers, no more phase timer.
    ///
    /// The anchor shows the stop notice until the cleanup countdown elapses.
    async fn stop(&mut self, reason: StopReason) {
        if self.cleanup.is_some() || self.finished {
            return;
        }
        info!(game_id = %self.id, scope = %self.scope, ?reason, "stopping game");

        self.deps
            .router
            .deregister_handlers(&self.scope, self.phase.handlers());
        if let Some(mut timer) = self.phase.timer_mut().take() {
            timer.destroy();
        }
        self.retire();

        if self.anchor.is_some() {
            if let Err(err) = self.edit_anchor(render::aborted(&reason)).await {
                warn!(game_id = %self.id, error = %err, "failed to show the stop notice");
            }
        }
        self.cleanup = Some(self.arm_timer(Vec::new(), self.options.cleanup_duration));
    }

    /// Remove the anchor and let the task end.
    async fn finalize(&mut self) {
        self.cleanup = None;
        if let Some(anchor) = self.anchor.take() {
            let session = self.session();
            if let Err(err) = session
                .edit_notification(anchor.clone(), render::closed())
                .await
            {
                warn!(game_id = %self.id, error = %err, "failed to close the anchor");
            }
            if let Err(err) = session.delete_notification(anchor).await {
                warn!(game_id = %self.id, error = %err, "failed to delete the anchor");
            }
        }
        self.finished = true;
    }

    /// Drop the registry entry, unless a newer game already took the scope.
    fn retire(&self) {
        let id = self.id;
        if self
            .deps
            .directory
            .remove_if(&self.scope, |_, handle| handle.id == id)
            .is_some()
        {
            debug!(game_id = %id, scope = %self.scope, "game retired from the directory");
        }
    }

    /// Read-only view of the game.
    pub fn snapshot(&self) -> GameSnapshot {
        let (hint_authors, visible_hints) = match &self.phase {
            Phase::HintGiving(phase) => (
                phase.hints.iter().map(|hint| hint.author.clone()).collect(),
                Vec::new(),
            ),
            Phase::InvalidReview(phase) => (
                phase.hints.iter().map(|hint| hint.author.clone()).collect(),
                Vec::new(),
            ),
            Phase::Guessing(phase) => (
                Vec::new(),
                phase.hints.iter().map(|hint| hint.text.clone()).collect(),
            ),
            Phase::Lobby(_) => (Vec::new(), Vec::new()),
        };
        let timer = self.phase.timer();

        GameSnapshot {
            id: self.id,
            scope: self.scope.clone(),
            phase: self.phase.kind(),
            round: self.round,
            queue: self.rotation.queue().cloned().collect(),
            history: self.rotation.history().to_vec(),
            guesser: self.phase.guesser().cloned(),
            word: self.phase.word().map(str::to_string),
            hint_authors,
            visible_hints,
            remaining: timer.filter(|timer| timer.is_running()).map(Timer::remaining),
            hurry_votes_left: timer.map_or(0, |timer| timer.authorised().len()),
            stopping: self.cleanup.is_some(),
            options: self.options.clone(),
        }
    }
}

use std::time::Duration;

use tracing::info;

use crate::{
    error::GameError,
    state::{
        game::Game,
        phase::{JOIN, Phase, RoundSummary, STALE_ACTION},
        render,
        session::InboundAction,
        timer::{Countdown, Timer},
    },
};

/// Which lobby of the game this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyRound {
    /// Right after `/start`.
    First,
    /// Between two rounds.
    Restart,
}

/// Waiting room opened before every round.
#[derive(Debug)]
pub struct Lobby {
    /// First or restart lobby.
    pub round: LobbyRound,
    /// Summary of the round that just ended, for restart lobbies.
    pub previous: Option<RoundSummary>,
    /// Armed once the anchor is posted.
    pub timer: Option<Timer>,
}

impl Lobby {
    /// Lobby whose countdown is not armed yet.
    pub fn new(round: LobbyRound, previous: Option<RoundSummary>) -> Self {
        Self {
            round,
            previous,
            timer: None,
        }
    }
}

impl Game {
    fn lobby_duration(&self) -> Result<Duration, GameError> {
        match &self.phase {
            Phase::Lobby(lobby) => Ok(match lobby.round {
                LobbyRound::First => self.options.lobby_duration,
                LobbyRound::Restart => self.options.restart_duration,
            }),
            other => Err(GameError::Invariant(format!(
                "lobby duration requested during {}",
                other.kind()
            ))),
        }
    }

    /// Post a fresh anchor for the installed lobby, then arm its countdown.
    pub(crate) async fn announce_lobby(&mut self) -> Result<(), GameError> {
        let duration = self.lobby_duration()?;
        let Phase::Lobby(lobby) = &self.phase else {
            return Err(GameError::Invariant("no lobby to announce".into()));
        };
        let content = render::lobby(
            lobby,
            &self.rotation.active(),
            self.options.min_participants,
            Some(Countdown::after(duration)),
        );

        let anchor = self
            .session()
            .post_notification(self.scope.clone(), content)
            .await?;
        self.anchor = Some(anchor);

        self.arm_phase(self.rotation.ids(), duration);
        info!(
            game_id = %self.id,
            scope = %self.scope,
            participants = self.rotation.len(),
            wait_s = duration.as_secs(),
            "lobby open"
        );
        Ok(())
    }

    /// Keep waiting when too few participants joined.
    pub(crate) async fn extend_lobby(&mut self) -> Result<(), GameError> {
        let duration = self.lobby_duration()?;
        self.arm_phase(self.rotation.ids(), duration);
        info!(
            game_id = %self.id,
            participants = self.rotation.len(),
            needed = self.options.min_participants,
            "not enough participants; lobby extended"
        );
        self.refresh_anchor().await
    }

    /// Reveal the finished round (unless already shown) and open the restart lobby.
    pub(crate) async fn restart_lobby(&mut self, summary: RoundSummary) -> Result<(), GameError> {
        if !self.phase.revealed() {
            self.edit_anchor(render::reveal(self.round, &summary)).await?;
        }
        info!(
            game_id = %self.id,
            round = self.round,
            guesser = %summary.guesser.id,
            outcome = ?summary.outcome,
            "round finished"
        );
        self.install(Phase::Lobby(Lobby::new(LobbyRound::Restart, Some(summary))));
        self.announce_lobby().await
    }

    pub(crate) async fn lobby_action(
        &mut self,
        action: &InboundAction,
    ) -> Result<Option<String>, GameError> {
        match action.action_id.as_str() {
            JOIN => self.join(action).await,
            _ => Err(GameError::rejected(STALE_ACTION)),
        }
    }

    async fn join(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        if !self.phase.joinable() {
            return Err(GameError::rejected("You can only join while the lobby is open."));
        }
        if !self.rotation.join(action.actor.clone()) {
            return Err(GameError::rejected("You already joined this game."));
        }
        if let Some(timer) = self.phase.timer_mut() {
            timer.authorise(action.actor.id.clone());
        }
        info!(
            game_id = %self.id,
            participant = %action.actor.id,
            participants = self.rotation.len(),
            "participant joined"
        );
        self.refresh_anchor().await?;
        Ok(Some("You joined the game.".to_string()))
    }
}

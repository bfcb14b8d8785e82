//! Phases of a game and the transition function between them.
//!
//! ```text
//! Lobby ──▶ HintGiving ──▶ InvalidReview ──▶ Guessing ──▶ Lobby(Restart) ──▶ …
//!                 └──────── no hints ─────────────▲
//! ```
//!
//! Each phase owns its timer and declares the handlers it needs; the game
//! registers them when the phase is installed and deregisters them when it is
//! replaced. Phase-specific action handling lives in the submodules as
//! `impl Game` blocks.

/// The guesser's turn.
pub mod guessing;
/// Helpers writing hints.
pub mod hint_giving;
/// Helpers flagging invalid hints.
pub mod invalid_review;
/// Waiting room between rounds.
pub mod lobby;

use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::{
    config::GameOptions,
    state::{
        router::Handler,
        session::{ActionKind, InteractionContext, Participant, ParticipantId},
        timer::Timer,
    },
};

pub use self::{
    guessing::Guessing,
    hint_giving::{Hint, HintGiving},
    invalid_review::InvalidReview,
    lobby::{Lobby, LobbyRound},
};

/// Slash command starting a game in the channel.
pub const START: &str = "start";
/// Slash command stopping the game of the channel.
pub const STOP: &str = "stop";

/// Button joining the game.
pub const JOIN: &str = "join";
/// Button leaving the game.
pub const LEAVE: &str = "leave";
/// Button voting to shorten the current countdown.
pub const HURRY: &str = "hurry";
/// Button opening the hint form.
pub const HINT: &str = "hint";
/// Submission of the hint form.
pub const HINT_FORM: &str = "hint-form";
/// Button requesting the invalid-hint ballot.
pub const REVIEW: &str = "review";
/// Submission of the invalid-hint ballot.
pub const INVALID_HINTS: &str = "invalid-hints";
/// Button opening the guess form.
pub const GUESS: &str = "guess";
/// Submission of the guess form.
pub const GUESS_FORM: &str = "guess-form";

/// Reply to actions that target a phase which is already over.
pub(crate) const STALE_ACTION: &str = "This action is no longer available.";

const LEAVE_HANDLER: Handler = Handler::new(ActionKind::Button, LEAVE);
const HURRY_HANDLER: Handler = Handler::new(ActionKind::Button, HURRY);

const LOBBY_HANDLERS: &[Handler] = &[
    Handler::new(ActionKind::Button, JOIN),
    LEAVE_HANDLER,
    HURRY_HANDLER,
];
const HINT_GIVING_HANDLERS: &[Handler] = &[
    LEAVE_HANDLER,
    HURRY_HANDLER,
    Handler::new(ActionKind::Button, HINT),
    Handler::new(ActionKind::TextSubmit, HINT_FORM),
];
const INVALID_REVIEW_HANDLERS: &[Handler] = &[
    LEAVE_HANDLER,
    HURRY_HANDLER,
    Handler::new(ActionKind::Button, REVIEW),
    Handler::new(ActionKind::Selection, INVALID_HINTS),
];
const GUESSING_HANDLERS: &[Handler] = &[
    LEAVE_HANDLER,
    HURRY_HANDLER,
    Handler::new(ActionKind::Button, GUESS),
    Handler::new(ActionKind::TextSubmit, GUESS_FORM),
];

/// Discriminant of [`Phase`], used in logs and read-only views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Waiting for participants.
    Lobby,
    /// Helpers write hints.
    HintGiving,
    /// Helpers flag invalid hints.
    InvalidReview,
    /// The guesser guesses.
    Guessing,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseKind::Lobby => "lobby",
            PhaseKind::HintGiving => "hint_giving",
            PhaseKind::InvalidReview => "invalid_review",
            PhaseKind::Guessing => "guessing",
        };
        f.write_str(label)
    }
}

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The guesser found the word.
    Correct,
    /// The guesser guessed something else.
    Wrong {
        /// Submitted guess, trimmed.
        guess: String,
    },
    /// The guesser did not answer in time.
    TimedOut,
    /// The guesser left before the end of the round.
    GuesserLeft,
}

/// What happened in a finished round, shown by the following lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    /// Secret word of the round.
    pub word: String,
    /// Who had to guess.
    pub guesser: Participant,
    /// How the round ended.
    pub outcome: RoundOutcome,
    /// Hints shown in the reveal.
    pub hints: Vec<Hint>,
}

/// Data handed from the hint phase to the review phase.
#[derive(Debug)]
pub struct ReviewSeed {
    /// Secret word of the round.
    pub word: String,
    /// Who has to guess.
    pub guesser: Participant,
    /// Submitted hints.
    pub hints: Vec<Hint>,
    /// Last interaction of each helper, used to push the ballot.
    pub reviewer_contexts: HashMap<ParticipantId, InteractionContext>,
}

/// Data handed to the guessing phase.
#[derive(Debug)]
pub struct GuessSeed {
    /// Secret word of the round.
    pub word: String,
    /// Who has to guess.
    pub guesser: Participant,
    /// Hints shown to the guesser.
    pub hints: Vec<Hint>,
    /// Hints removed by the review.
    pub discarded: Vec<Hint>,
}

/// Result of [`Phase::conclude`]: what the game must install next.
#[derive(Debug)]
pub enum Next {
    /// Not enough participants: wait another lobby period.
    ExtendLobby,
    /// Start a round.
    HintGiving,
    /// Let helpers flag invalid hints.
    InvalidReview(ReviewSeed),
    /// Let the guesser guess.
    Guessing(GuessSeed),
    /// The round is over; open the restart lobby.
    Lobby(RoundSummary),
}

/// The single live phase of a game.
#[derive(Debug)]
pub enum Phase {
    /// Waiting for participants.
    Lobby(Lobby),
    /// Helpers write hints.
    HintGiving(HintGiving),
    /// Helpers flag invalid hints.
    InvalidReview(InvalidReview),
    /// The guesser guesses.
    Guessing(Guessing),
}

impl Phase {
    /// Discriminant of the phase.
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Lobby(_) => PhaseKind::Lobby,
            Phase::HintGiving(_) => PhaseKind::HintGiving,
            Phase::InvalidReview(_) => PhaseKind::InvalidReview,
            Phase::Guessing(_) => PhaseKind::Guessing,
        }
    }

    /// Whether participants may join during this phase.
    pub fn joinable(&self) -> bool {
        matches!(self, Phase::Lobby(_))
    }

    /// Handlers the phase needs registered while it is active.
    pub fn handlers(&self) -> &'static [Handler] {
        match self {
            Phase::Lobby(_) => LOBBY_HANDLERS,
            Phase::HintGiving(_) => HINT_GIVING_HANDLERS,
            Phase::InvalidReview(_) => INVALID_REVIEW_HANDLERS,
            Phase::Guessing(_) => GUESSING_HANDLERS,
        }
    }

    /// Countdown of the phase, once armed.
    pub fn timer(&self) -> Option<&Timer> {
        match self {
            Phase::Lobby(lobby) => lobby.timer.as_ref(),
            Phase::HintGiving(phase) => phase.timer.as_ref(),
            Phase::InvalidReview(phase) => phase.timer.as_ref(),
            Phase::Guessing(phase) => phase.timer.as_ref(),
        }
    }

    /// Slot holding the countdown of the phase.
    pub fn timer_mut(&mut self) -> &mut Option<Timer> {
        match self {
            Phase::Lobby(lobby) => &mut lobby.timer,
            Phase::HintGiving(phase) => &mut phase.timer,
            Phase::InvalidReview(phase) => &mut phase.timer,
            Phase::Guessing(phase) => &mut phase.timer,
        }
    }

    /// Guesser of the current round, if a round is running.
    pub fn guesser(&self) -> Option<&Participant> {
        match self {
            Phase::Lobby(_) => None,
            Phase::HintGiving(phase) => Some(&phase.guesser),
            Phase::InvalidReview(phase) => Some(&phase.guesser),
            Phase::Guessing(phase) => Some(&phase.guesser),
        }
    }

    /// Secret word of the current round, if a round is running.
    pub fn word(&self) -> Option<&str> {
        match self {
            Phase::Lobby(_) => None,
            Phase::HintGiving(phase) => Some(&phase.word),
            Phase::InvalidReview(phase) => Some(&phase.word),
            Phase::Guessing(phase) => Some(&phase.word),
        }
    }

    /// Whether the end of the round was already shown on the anchor.
    pub fn revealed(&self) -> bool {
        matches!(self, Phase::Guessing(phase) if phase.revealed)
    }

    /// End the running round early because its guesser left.
    ///
    /// Returns `None` in the lobby, where there is no round to abandon.
    /// A round whose guess was already revealed keeps its real outcome.
    pub fn abandon(&mut self) -> Option<RoundSummary> {
        let (word, guesser, hints) = match self {
            Phase::Lobby(_) => return None,
            Phase::Guessing(phase) if phase.revealed => return Some(phase.conclude()),
            Phase::HintGiving(phase) => (&mut phase.word, &phase.guesser, &mut phase.hints),
            Phase::InvalidReview(phase) => (&mut phase.word, &phase.guesser, &mut phase.hints),
            Phase::Guessing(phase) => (&mut phase.word, &phase.guesser, &mut phase.hints),
        };
        Some(RoundSummary {
            word: std::mem::take(word),
            guesser: guesser.clone(),
            outcome: RoundOutcome::GuesserLeft,
            hints: std::mem::take(hints),
        })
    }

    /// Decide what follows this phase once its countdown is over.
    ///
    /// Round data is moved out into the returned seed; the phase is about to
    /// be replaced and must not be read afterwards.
    pub fn conclude(&mut self, participants: usize, options: &GameOptions) -> Next {
        match self {
            Phase::Lobby(_) if participants < options.min_participants => Next::ExtendLobby,
            Phase::Lobby(_) => Next::HintGiving,
            Phase::HintGiving(phase) => phase.conclude(),
            Phase::InvalidReview(phase) => Next::Guessing(phase.conclude()),
            Phase::Guessing(phase) => Next::Lobby(phase.conclude()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phase_accepts_leave_and_hurry() {
        let lobby = Phase::Lobby(Lobby::new(LobbyRound::First, None));
        assert!(lobby.joinable());
        assert!(lobby.handlers().contains(&LEAVE_HANDLER));
        assert!(lobby.handlers().contains(&HURRY_HANDLER));

        for handlers in [HINT_GIVING_HANDLERS, INVALID_REVIEW_HANDLERS, GUESSING_HANDLERS] {
            assert!(handlers.contains(&LEAVE_HANDLER));
            assert!(handlers.contains(&HURRY_HANDLER));
            assert!(
                !handlers
                    .iter()
                    .any(|handler| handler.action_id == JOIN)
            );
        }
    }

    #[test]
    fn abandoning_moves_round_data_out() {
        let guesser = Participant::new("g", "Gina");
        let helper = Participant::new("h", "Hugo");
        let mut round = HintGiving::new("Banana".into(), guesser.clone(), vec![helper.clone()]);
        round.hints.push(Hint {
            author: helper,
            text: "yellow".into(),
        });
        let mut phase = Phase::HintGiving(round);

        let summary = phase.abandon().unwrap();
        assert_eq!(summary.word, "Banana");
        assert_eq!(summary.guesser, guesser);
        assert_eq!(summary.outcome, RoundOutcome::GuesserLeft);
        assert_eq!(summary.hints.len(), 1);
        assert!(!phase.revealed());

        assert!(Phase::Lobby(Lobby::new(LobbyRound::Restart, None)).abandon().is_none());
    }

    #[test]
    fn abandoning_after_the_reveal_keeps_the_outcome() {
        let mut round = Guessing::new(GuessSeed {
            word: "Banana".into(),
            guesser: Participant::new("g", "Gina"),
            hints: Vec::new(),
            discarded: Vec::new(),
        });
        round.submit(&ParticipantId("g".into()), "banana").unwrap();
        round.revealed = true;
        let mut phase = Phase::Guessing(round);

        let summary = phase.abandon().unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Correct);
        assert_eq!(summary.word, "Banana");

        let mut unrevealed = Phase::Guessing(Guessing::new(GuessSeed {
            word: "Banana".into(),
            guesser: Participant::new("g", "Gina"),
            hints: Vec::new(),
            discarded: Vec::new(),
        }));
        assert_eq!(unrevealed.abandon().unwrap().outcome, RoundOutcome::GuesserLeft);
    }

    #[test]
    fn lobby_waits_for_enough_participants() {
        let options = GameOptions::default();
        let mut lobby = Phase::Lobby(Lobby::new(LobbyRound::First, None));

        assert!(matches!(lobby.conclude(1, &options), Next::ExtendLobby));
        assert!(matches!(lobby.conclude(2, &options), Next::HintGiving));
    }
}

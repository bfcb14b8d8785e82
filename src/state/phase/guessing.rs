use tracing::info;

use crate::{
    error::GameError,
    state::{
        game::Game,
        phase::{
            GUESS, GUESS_FORM, GuessSeed, Hint, Next, Phase, RoundOutcome, RoundSummary,
            STALE_ACTION,
        },
        render,
        session::{InboundAction, Participant, ParticipantId},
        timer::Timer,
    },
};

/// The guesser sees the remaining hints and has one try.
#[derive(Debug)]
pub struct Guessing {
    /// Secret word of the round.
    pub word: String,
    /// Who has to guess.
    pub guesser: Participant,
    /// Hints that survived the review.
    pub hints: Vec<Hint>,
    /// Hints removed by the review.
    pub discarded: Vec<Hint>,
    /// The guess, once submitted.
    pub guess: Option<String>,
    /// Whether the reveal is already on the anchor.
    pub revealed: bool,
    /// Covers every active participant.
    pub timer: Option<Timer>,
}

impl Guessing {
    /// Guessing phase for the hints carried by `seed`.
    pub fn new(seed: GuessSeed) -> Self {
        Self {
            word: seed.word,
            guesser: seed.guesser,
            hints: seed.hints,
            discarded: seed.discarded,
            guess: None,
            revealed: false,
            timer: None,
        }
    }

    /// Record the single guess of the round and judge it.
    pub fn submit(
        &mut self,
        participant: &ParticipantId,
        guess: &str,
    ) -> Result<RoundOutcome, GameError> {
        if participant != &self.guesser.id {
            return Err(GameError::rejected("Only the guesser may guess."));
        }
        if self.guess.is_some() {
            return Err(GameError::rejected("You already guessed."));
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(GameError::rejected("Your guess is empty."));
        }

        self.guess = Some(guess.to_string());
        Ok(self.outcome())
    }

    /// Outcome given the current guess, if any.
    pub fn outcome(&self) -> RoundOutcome {
        match &self.guess {
            None => RoundOutcome::TimedOut,
            Some(guess) if guess.to_lowercase() == self.word.to_lowercase() => {
                RoundOutcome::Correct
            }
            Some(guess) => RoundOutcome::Wrong {
                guess: guess.clone(),
            },
        }
    }

    /// Summary of the round, without consuming it.
    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            word: self.word.clone(),
            guesser: self.guesser.clone(),
            outcome: self.outcome(),
            hints: self.hints.clone(),
        }
    }

    /// Move the round data out once the countdown is over.
    pub fn conclude(&mut self) -> RoundSummary {
        let outcome = self.outcome();
        RoundSummary {
            word: std::mem::take(&mut self.word),
            guesser: self.guesser.clone(),
            outcome,
            hints: std::mem::take(&mut self.hints),
        }
    }
}

impl Game {
    /// Show the surviving hints and let the guesser guess.
    pub(crate) async fn begin_guessing(&mut self, seed: GuessSeed) -> Result<(), GameError> {
        info!(
            game_id = %self.id,
            round = self.round,
            hints = seed.hints.len(),
            discarded = seed.discarded.len(),
            "guessing started"
        );
        self.install(Phase::Guessing(Guessing::new(seed)));
        self.arm_phase(self.rotation.ids(), self.options.guess_duration);
        self.refresh_anchor().await
    }

    pub(crate) async fn guessing_action(
        &mut self,
        action: &InboundAction,
    ) -> Result<Option<String>, GameError> {
        match action.action_id.as_str() {
            GUESS => self.open_guess_form(action).await,
            GUESS_FORM => self.submit_guess(action).await,
            _ => Err(GameError::rejected(STALE_ACTION)),
        }
    }

    async fn open_guess_form(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        let Phase::Guessing(phase) = &self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        if action.actor.id != phase.guesser.id {
            return Err(GameError::rejected("Only the guesser may guess."));
        }
        if phase.guess.is_some() {
            return Err(GameError::rejected("You already guessed."));
        }
        self.session()
            .prompt_text_entry(action.context.clone(), render::guess_form())
            .await?;
        Ok(None)
    }

    /// Judge the guess, reveal the round, then open the restart lobby at once.
    ///
    /// Nothing queued behind the guess can see the finished round: the
    /// countdown is dropped with the phase instead of firing.
    async fn submit_guess(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        let Phase::Guessing(phase) = &mut self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        let outcome = phase.submit(&action.actor.id, action.payload.text())?;
        let summary = phase.summary();
        info!(game_id = %self.id, round = self.round, ?outcome, "guess submitted");

        self.edit_anchor(render::reveal(self.round, &summary))
            .await
            .map_err(GameError::in_transition)?;

        let Phase::Guessing(phase) = &mut self.phase else {
            return Err(GameError::Invariant("guessing phase vanished".into()));
        };
        phase.revealed = true;
        let summary = phase.conclude();
        self.advance(Next::Lobby(summary)).await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guessing() -> Guessing {
        Guessing::new(GuessSeed {
            word: "Banana".into(),
            guesser: Participant::new("g", "Gina"),
            hints: Vec::new(),
            discarded: Vec::new(),
        })
    }

    #[test]
    fn guess_is_trimmed_and_case_insensitive() {
        let mut phase = guessing();
        let outcome = phase.submit(&ParticipantId("g".into()), "  bAnAnA  ").unwrap();
        assert_eq!(outcome, RoundOutcome::Correct);
        assert_eq!(phase.guess.as_deref(), Some("bAnAnA"));
    }

    #[test]
    fn wrong_guess_is_kept_for_the_reveal() {
        let mut phase = guessing();
        let outcome = phase.submit(&ParticipantId("g".into()), "apple ").unwrap();
        assert_eq!(outcome, RoundOutcome::Wrong { guess: "apple".into() });
        assert_eq!(phase.conclude().outcome, outcome);
    }

    #[test]
    fn only_one_guess_from_the_guesser() {
        let mut phase = guessing();
        assert!(matches!(
            phase.submit(&ParticipantId("h".into()), "banana"),
            Err(GameError::Rejected(_))
        ));
        assert!(matches!(
            phase.submit(&ParticipantId("g".into()), "   "),
            Err(GameError::Rejected(_))
        ));
        phase.submit(&ParticipantId("g".into()), "apple").unwrap();
        assert!(matches!(
            phase.submit(&ParticipantId("g".into()), "banana"),
            Err(GameError::Rejected(_))
        ));
    }

    #[test]
    fn no_guess_means_timed_out() {
        assert_eq!(guessing().conclude().outcome, RoundOutcome::TimedOut);
    }
}

use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    error::GameError,
    state::{
        game::Game,
        phase::{GuessSeed, HINT, HINT_FORM, Next, Phase, ReviewSeed, STALE_ACTION},
        render,
        session::{InboundAction, InteractionContext, Participant, ParticipantId},
        timer::Timer,
    },
};

/// One-word clue written by a helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// Helper who wrote it.
    pub author: Participant,
    /// The clue itself.
    pub text: String,
}

/// Helpers write one hint each for the guesser.
#[derive(Debug)]
pub struct HintGiving {
    /// Secret word of the round.
    pub word: String,
    /// Who has to guess.
    pub guesser: Participant,
    /// Everyone else at the start of the round.
    pub helpers: Vec<Participant>,
    /// At most one hint per helper, in submission order.
    pub hints: Vec<Hint>,
    /// Last interaction of each helper who opened the hint form.
    pub pending_modals: HashMap<ParticipantId, InteractionContext>,
    /// Covers the helpers only.
    pub timer: Option<Timer>,
}

impl HintGiving {
    /// Fresh round without any hint.
    pub fn new(word: String, guesser: Participant, helpers: Vec<Participant>) -> Self {
        Self {
            word,
            guesser,
            helpers,
            hints: Vec::new(),
            pending_modals: HashMap::new(),
            timer: None,
        }
    }

    /// Whether `participant` may give a hint this round.
    pub fn is_helper(&self, participant: &ParticipantId) -> bool {
        self.helpers.iter().any(|helper| &helper.id == participant)
    }

    /// Hint currently saved by `participant`.
    pub fn hint_of(&self, participant: &ParticipantId) -> Option<&Hint> {
        self.hints.iter().find(|hint| &hint.author.id == participant)
    }

    /// Check a hint and store it, replacing the author's previous one.
    pub fn submit(&mut self, author: &Participant, text: &str) -> Result<&Hint, GameError> {
        if author.id == self.guesser.id {
            return Err(GameError::rejected("The guesser can't give hints."));
        }
        if !self.is_helper(&author.id) {
            return Err(GameError::rejected("You are not a helper in this round."));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::rejected("Your hint is empty."));
        }
        if text.split_whitespace().nth(1).is_some() {
            return Err(GameError::rejected("A hint must be a single word."));
        }
        if text.to_lowercase() == self.word.to_lowercase() {
            return Err(GameError::rejected("Your hint can't be the secret word."));
        }

        let hint = Hint {
            author: author.clone(),
            text: text.to_string(),
        };
        let index = match self.hints.iter().position(|hint| hint.author.id == author.id) {
            Some(index) => {
                self.hints[index] = hint;
                index
            }
            None => {
                self.hints.push(hint);
                self.hints.len() - 1
            }
        };
        Ok(&self.hints[index])
    }

    /// Forget everything a departing helper contributed.
    pub fn remove_participant(&mut self, participant: &ParticipantId) {
        self.helpers.retain(|helper| &helper.id != participant);
        self.hints.retain(|hint| &hint.author.id != participant);
        self.pending_modals.remove(participant);
    }

    /// Review the hints, or go straight to guessing when there are none.
    pub fn conclude(&mut self) -> Next {
        let word = std::mem::take(&mut self.word);
        let guesser = self.guesser.clone();
        let hints = std::mem::take(&mut self.hints);
        if hints.is_empty() {
            return Next::Guessing(GuessSeed {
                word,
                guesser,
                hints,
                discarded: Vec::new(),
            });
        }
        Next::InvalidReview(ReviewSeed {
            word,
            guesser,
            hints,
            reviewer_contexts: std::mem::take(&mut self.pending_modals),
        })
    }
}

impl Game {
    /// Draw a word, pick the guesser and let the helpers write hints.
    pub(crate) async fn begin_round(&mut self) -> Result<(), GameError> {
        // Draw first so a misconfigured pool leaves the rotation untouched.
        let word = self.words().draw(&self.options)?;
        let guesser = self.rotation.next_guesser()?;
        let helpers: Vec<Participant> = self
            .rotation
            .active()
            .into_iter()
            .filter(|participant| participant != &guesser)
            .collect();
        let authorised: Vec<ParticipantId> =
            helpers.iter().map(|helper| helper.id.clone()).collect();

        self.round += 1;
        info!(
            game_id = %self.id,
            round = self.round,
            guesser = %guesser.id,
            helpers = helpers.len(),
            "round started"
        );

        self.install(Phase::HintGiving(HintGiving::new(word, guesser, helpers)));
        self.arm_phase(authorised, self.options.hint_duration);
        self.refresh_anchor().await
    }

    pub(crate) async fn hint_giving_action(
        &mut self,
        action: &InboundAction,
    ) -> Result<Option<String>, GameError> {
        match action.action_id.as_str() {
            HINT => self.open_hint_form(action).await,
            HINT_FORM => self.submit_hint(action).await,
            _ => Err(GameError::rejected(STALE_ACTION)),
        }
    }

    async fn open_hint_form(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        let session = self.session();
        let Phase::HintGiving(phase) = &mut self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        if action.actor.id == phase.guesser.id {
            return Err(GameError::rejected("The guesser can't give hints."));
        }
        if !phase.is_helper(&action.actor.id) {
            return Err(GameError::rejected("You are not a helper in this round."));
        }

        phase
            .pending_modals
            .insert(action.actor.id.clone(), action.context.clone());
        let form = render::hint_form(&phase.word, phase.hint_of(&action.actor.id));
        session
            .prompt_text_entry(action.context.clone(), form)
            .await?;
        Ok(None)
    }

    async fn submit_hint(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        let Phase::HintGiving(phase) = &mut self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        let hint = phase.submit(&action.actor, action.payload.text())?;
        let reply = format!("Your hint \"{}\" was saved.", hint.text);
        debug!(game_id = %self.id, participant = %action.actor.id, "hint saved");
        phase
            .pending_modals
            .insert(action.actor.id.clone(), action.context.clone());

        self.refresh_anchor().await?;
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> HintGiving {
        HintGiving::new(
            "Banana".into(),
            Participant::new("g", "Gina"),
            vec![Participant::new("a", "Ana"), Participant::new("b", "Ben")],
        )
    }

    #[test]
    fn hints_are_single_words_different_from_the_word() {
        let mut phase = round();
        let ana = Participant::new("a", "Ana");

        assert!(matches!(phase.submit(&ana, "   "), Err(GameError::Rejected(_))));
        assert!(matches!(phase.submit(&ana, "yellow fruit"), Err(GameError::Rejected(_))));
        assert!(matches!(phase.submit(&ana, " bANANA "), Err(GameError::Rejected(_))));
        assert!(phase.hints.is_empty());

        assert_eq!(phase.submit(&ana, " yellow ").unwrap().text, "yellow");
    }

    #[test]
    fn only_helpers_may_submit() {
        let mut phase = round();
        assert!(matches!(
            phase.submit(&Participant::new("g", "Gina"), "monkey"),
            Err(GameError::Rejected(_))
        ));
        assert!(matches!(
            phase.submit(&Participant::new("z", "Zoe"), "monkey"),
            Err(GameError::Rejected(_))
        ));
    }

    #[test]
    fn resubmitting_replaces_the_previous_hint() {
        let mut phase = round();
        let ana = Participant::new("a", "Ana");
        let ben = Participant::new("b", "Ben");

        phase.submit(&ana, "yellow").unwrap();
        phase.submit(&ben, "monkey").unwrap();
        phase.submit(&ana, "peel").unwrap();

        let texts: Vec<_> = phase.hints.iter().map(|hint| hint.text.as_str()).collect();
        assert_eq!(texts, vec!["peel", "monkey"]);
    }

    #[test]
    fn departing_helper_takes_their_hint_along() {
        let mut phase = round();
        let ana = Participant::new("a", "Ana");
        phase.submit(&ana, "yellow").unwrap();

        phase.remove_participant(&ana.id);
        assert!(phase.hints.is_empty());
        assert!(!phase.is_helper(&ana.id));
    }

    #[test]
    fn no_hints_skips_the_review() {
        let mut phase = round();
        assert!(matches!(phase.conclude(), Next::Guessing(seed) if seed.hints.is_empty()));

        let mut phase = round();
        phase.submit(&Participant::new("a", "Ana"), "yellow").unwrap();
        let Next::InvalidReview(seed) = phase.conclude() else {
            panic!("expected a review");
        };
        assert_eq!(seed.word, "Banana");
        assert_eq!(seed.hints.len(), 1);
    }
}

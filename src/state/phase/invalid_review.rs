use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::{
    error::GameError,
    state::{
        game::Game,
        phase::{GuessSeed, Hint, INVALID_HINTS, Phase, REVIEW, ReviewSeed, STALE_ACTION},
        render,
        session::{InboundAction, InteractionContext, Participant, ParticipantId},
        timer::Timer,
    },
};

/// Helpers flag hints that are invalid before the guesser sees them.
#[derive(Debug)]
pub struct InvalidReview {
    /// Secret word of the round.
    pub word: String,
    /// Who has to guess; never sees the ballot.
    pub guesser: Participant,
    /// Hints under review.
    pub hints: Vec<Hint>,
    /// Latest ballot of each voter: the authors whose hints they flagged.
    pub ballots: HashMap<ParticipantId, HashSet<ParticipantId>>,
    /// Where to push the ballot and the tally, per reviewer.
    pub reviewer_contexts: HashMap<ParticipantId, InteractionContext>,
    /// Covers every active participant.
    pub timer: Option<Timer>,
}

impl InvalidReview {
    /// Start reviewing the hints carried by `seed`.
    pub fn new(seed: ReviewSeed) -> Self {
        Self {
            word: seed.word,
            guesser: seed.guesser,
            hints: seed.hints,
            ballots: HashMap::new(),
            reviewer_contexts: seed.reviewer_contexts,
            timer: None,
        }
    }

    /// Replace the ballot of `voter`. Unknown authors are ignored.
    pub fn vote(&mut self, voter: &ParticipantId, flagged: &[String]) -> Result<usize, GameError> {
        if voter == &self.guesser.id {
            return Err(GameError::rejected("The guesser can't review the hints."));
        }
        let ballot: HashSet<ParticipantId> = flagged
            .iter()
            .map(|value| ParticipantId(value.clone()))
            .filter(|author| self.hints.iter().any(|hint| &hint.author.id == author))
            .collect();
        let count = ballot.len();
        self.ballots.insert(voter.clone(), ballot);
        Ok(count)
    }

    /// Number of distinct voters who flagged each author's hint.
    pub fn invalid_votes(&self) -> HashMap<ParticipantId, usize> {
        let mut votes = HashMap::new();
        for ballot in self.ballots.values() {
            for author in ballot {
                *votes.entry(author.clone()).or_insert(0) += 1;
            }
        }
        votes
    }

    /// Forget the ballot and context of a departing reviewer. Their hint stays.
    pub fn remove_participant(&mut self, participant: &ParticipantId) {
        self.ballots.remove(participant);
        self.reviewer_contexts.remove(participant);
    }

    /// Drop every hint flagged at least once.
    pub fn conclude(&mut self) -> GuessSeed {
        let votes = self.invalid_votes();
        let (discarded, hints): (Vec<Hint>, Vec<Hint>) = std::mem::take(&mut self.hints)
            .into_iter()
            .partition(|hint| votes.get(&hint.author.id).is_some_and(|count| *count > 0));
        GuessSeed {
            word: std::mem::take(&mut self.word),
            guesser: self.guesser.clone(),
            hints,
            discarded,
        }
    }
}

impl Game {
    /// Install the review and push the ballot to every known helper.
    pub(crate) async fn begin_review(&mut self, seed: ReviewSeed) -> Result<(), GameError> {
        info!(
            game_id = %self.id,
            round = self.round,
            hints = seed.hints.len(),
            reviewers = seed.reviewer_contexts.len(),
            "hint review started"
        );
        self.install(Phase::InvalidReview(InvalidReview::new(seed)));
        self.arm_phase(self.rotation.ids(), self.options.review_duration);
        self.refresh_anchor().await?;

        let Phase::InvalidReview(phase) = &self.phase else {
            return Err(GameError::Invariant("review phase vanished".into()));
        };
        let countdown = phase.timer.as_ref().map(Timer::countdown);
        let prompt = render::review_prompt(phase, countdown);
        let session = self.session();
        for (reviewer, context) in &phase.reviewer_contexts {
            if let Err(err) = session
                .prompt_selection(context.clone(), prompt.clone())
                .await
            {
                warn!(
                    game_id = %self.id,
                    participant = %reviewer,
                    error = %err,
                    "failed to push the hint ballot"
                );
            }
        }
        Ok(())
    }

    pub(crate) async fn invalid_review_action(
        &mut self,
        action: &InboundAction,
    ) -> Result<Option<String>, GameError> {
        match action.action_id.as_str() {
            REVIEW => self.open_ballot(action).await,
            INVALID_HINTS => self.cast_ballot(action).await,
            _ => Err(GameError::rejected(STALE_ACTION)),
        }
    }

    fn check_reviewer(&self, participant: &Participant) -> Result<(), GameError> {
        let Phase::InvalidReview(phase) = &self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        if participant.id == phase.guesser.id {
            return Err(GameError::rejected("The guesser can't review the hints."));
        }
        if !self.rotation.contains(participant) {
            return Err(GameError::rejected("You are not part of this game."));
        }
        Ok(())
    }

    async fn open_ballot(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        self.check_reviewer(&action.actor)?;
        let session = self.session();
        let Phase::InvalidReview(phase) = &mut self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        phase
            .reviewer_contexts
            .insert(action.actor.id.clone(), action.context.clone());
        let prompt = render::review_prompt(phase, phase.timer.as_ref().map(Timer::countdown));
        session
            .prompt_selection(action.context.clone(), prompt)
            .await?;
        Ok(None)
    }

    async fn cast_ballot(&mut self, action: &InboundAction) -> Result<Option<String>, GameError> {
        self.check_reviewer(&action.actor)?;
        let session = self.session();
        let Phase::InvalidReview(phase) = &mut self.phase else {
            return Err(GameError::rejected(STALE_ACTION));
        };
        let flagged = phase.vote(&action.actor.id, action.payload.selected())?;
        phase
            .reviewer_contexts
            .insert(action.actor.id.clone(), action.context.clone());
        debug!(game_id = %self.id, participant = %action.actor.id, flagged, "ballot recorded");

        let tally = render::review_tally(phase);
        for (reviewer, context) in &phase.reviewer_contexts {
            if let Err(err) = session.update_reply(context.clone(), tally.clone()).await {
                warn!(
                    game_id = %self.id,
                    participant = %reviewer,
                    error = %err,
                    "failed to push the vote tally"
                );
            }
        }
        Ok(Some(format!("Your ballot was recorded ({flagged} hint(s) flagged).")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(id: &str, text: &str) -> Hint {
        Hint {
            author: Participant::new(id, id.to_uppercase()),
            text: text.into(),
        }
    }

    fn review() -> InvalidReview {
        InvalidReview::new(ReviewSeed {
            word: "Banana".into(),
            guesser: Participant::new("g", "G"),
            hints: vec![hint("a", "yellow"), hint("b", "yellow"), hint("c", "monkey")],
            reviewer_contexts: HashMap::new(),
        })
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn votes_count_distinct_voters_and_ballots_replace() {
        let mut phase = review();
        let a = ParticipantId("a".into());
        let c = ParticipantId("c".into());

        phase.vote(&a, &ids(&["a", "b"])).unwrap();
        phase.vote(&c, &ids(&["b"])).unwrap();
        assert_eq!(phase.invalid_votes()[&ParticipantId("b".into())], 2);

        // A second ballot from `a` replaces the first one.
        phase.vote(&a, &ids(&["c"])).unwrap();
        let votes = phase.invalid_votes();
        assert_eq!(votes.get(&ParticipantId("a".into())), None);
        assert_eq!(votes[&ParticipantId("b".into())], 1);
        assert_eq!(votes[&ParticipantId("c".into())], 1);
    }

    #[test]
    fn guesser_and_unknown_authors_are_filtered() {
        let mut phase = review();
        assert!(matches!(
            phase.vote(&ParticipantId("g".into()), &ids(&["a"])),
            Err(GameError::Rejected(_))
        ));
        assert_eq!(phase.vote(&ParticipantId("a".into()), &ids(&["ghost", "c"])).unwrap(), 1);
    }

    #[test]
    fn flagged_hints_are_discarded() {
        let mut phase = review();
        phase.vote(&ParticipantId("c".into()), &ids(&["a", "b"])).unwrap();

        let seed = phase.conclude();
        assert_eq!(seed.hints, vec![hint("c", "monkey")]);
        assert_eq!(seed.discarded.len(), 2);
        assert_eq!(seed.word, "Banana");
    }

    #[test]
    fn departing_reviewer_keeps_their_hint_but_loses_their_ballot() {
        let mut phase = review();
        let a = ParticipantId("a".into());
        phase.vote(&a, &ids(&["b"])).unwrap();

        phase.remove_participant(&a);
        assert!(phase.invalid_votes().is_empty());
        assert_eq!(phase.hints.len(), 3);
    }
}

use indexmap::IndexSet;
use rand::{Rng, rng};

use crate::{
    error::GameError,
    state::session::{Participant, ParticipantId},
};

/// Roster of a game and the order in which its members take turns guessing.
///
/// Newcomers wait in `queue` until they are picked; once everyone was picked
/// the turn order wraps around `history`, oldest guesser first.
#[derive(Debug, Default, Clone)]
pub struct Rotation {
    queue: IndexSet<Participant>,
    history: Vec<Participant>,
    last_guesser: Option<ParticipantId>,
}

impl Rotation {
    /// Build a rotation where every initial participant still has to guess.
    pub fn new(initial: impl IntoIterator<Item = Participant>) -> Self {
        Self {
            queue: initial.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Participants not yet picked during the current cycle.
    pub fn queue(&self) -> impl Iterator<Item = &Participant> {
        self.queue.iter()
    }

    /// Participants who already guessed, oldest first.
    pub fn history(&self) -> &[Participant] {
        &self.history
    }

    /// Everyone taking part in the game.
    pub fn active(&self) -> Vec<Participant> {
        self.queue.iter().chain(self.history.iter()).cloned().collect()
    }

    /// Identifiers of everyone taking part in the game.
    pub fn ids(&self) -> Vec<ParticipantId> {
        self.queue
            .iter()
            .chain(self.history.iter())
            .map(|participant| participant.id.clone())
            .collect()
    }

    /// Number of participants, queued or past guessers.
    pub fn len(&self) -> usize {
        self.queue.len() + self.history.len()
    }

    /// Whether nobody is left.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `participant` takes part in the game.
    pub fn contains(&self, participant: &Participant) -> bool {
        self.queue.contains(participant) || self.history.contains(participant)
    }

    /// Add a participant. Returns false if they already take part.
    pub fn join(&mut self, participant: Participant) -> bool {
        if self.contains(&participant) {
            return false;
        }
        self.queue.insert(participant)
    }

    /// Remove a participant from wherever they are. Returns false if unknown.
    ///
    /// When the last guesser leaves, the back-reference moves to the guesser
    /// before them so the wrap-around order is preserved.
    pub fn leave(&mut self, participant: &Participant) -> bool {
        if self.queue.shift_remove(participant) {
            return true;
        }

        let Some(index) = self.history.iter().position(|entry| entry == participant) else {
            return false;
        };
        self.history.remove(index);

        if self.last_guesser.as_ref() == Some(&participant.id) {
            self.last_guesser = if self.history.is_empty() {
                None
            } else {
                let previous = index.checked_sub(1).unwrap_or(self.history.len() - 1);
                Some(self.history[previous].id.clone())
            };
        }
        true
    }

    /// Pick the guesser of the next round.
    ///
    /// Participants still queued are picked first, in random order. Once the
    /// queue is exhausted the guesser after the previous one in history is
    /// picked, wrapping to the front.
    pub fn next_guesser(&mut self) -> Result<Participant, GameError> {
        let picked = match self.queue.len() {
            0 => None,
            len => self.queue.swap_remove_index(rng().random_range(0..len)),
        };
        if let Some(participant) = picked {
            self.history.push(participant.clone());
            self.last_guesser = Some(participant.id.clone());
            return Ok(participant);
        }

        let last = self.last_guesser.as_ref().ok_or_else(|| {
            GameError::Invariant("rotation queue is empty and no previous guesser is known".into())
        })?;
        let position = self
            .history
            .iter()
            .position(|participant| &participant.id == last)
            .ok_or_else(|| {
                GameError::Invariant(format!(
                    "previous guesser `{last}` is missing from the guess history"
                ))
            })?;

        let next = self.history[(position + 1) % self.history.len()].clone();
        self.last_guesser = Some(next.id.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn people(count: usize) -> Vec<Participant> {
        (0..count)
            .map(|index| Participant::new(format!("{index}"), format!("player-{index}")))
            .collect()
    }

    #[test]
    fn full_cycle_picks_everyone_once_then_wraps_by_history() {
        let mut rotation = Rotation::new(people(4));

        let first_cycle: Vec<_> = (0..4).map(|_| rotation.next_guesser().unwrap()).collect();
        let unique: HashSet<_> = first_cycle.iter().cloned().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(rotation.history(), first_cycle.as_slice());
        assert_eq!(rotation.queue().count(), 0);

        let second_cycle: Vec<_> = (0..4).map(|_| rotation.next_guesser().unwrap()).collect();
        assert_eq!(second_cycle, first_cycle);
        assert_eq!(rotation.history().len(), 4);
    }

    #[test]
    fn newcomer_is_picked_before_wrapping() {
        let mut rotation = Rotation::new(people(2));
        rotation.next_guesser().unwrap();
        rotation.next_guesser().unwrap();

        let late = Participant::new("late", "Late");
        assert!(rotation.join(late.clone()));
        assert_eq!(rotation.next_guesser().unwrap(), late);
        assert_eq!(rotation.history().last(), Some(&late));
    }

    #[test]
    fn empty_rotation_is_an_invariant_violation() {
        let mut rotation = Rotation::default();
        assert!(matches!(
            rotation.next_guesser(),
            Err(GameError::Invariant(_))
        ));
    }

    #[test]
    fn leaving_last_guesser_keeps_wrap_order() {
        let mut rotation = Rotation::new(people(3));
        let order: Vec<_> = (0..3).map(|_| rotation.next_guesser().unwrap()).collect();

        // Wrap once so that the first entry is the last guesser.
        assert_eq!(rotation.next_guesser().unwrap(), order[0]);
        assert!(rotation.leave(&order[0]));

        assert_eq!(rotation.next_guesser().unwrap(), order[1]);
        assert_eq!(rotation.next_guesser().unwrap(), order[2]);
        assert_eq!(rotation.next_guesser().unwrap(), order[1]);
    }

    #[test]
    fn leaving_middle_guesser_moves_back_reference() {
        let mut rotation = Rotation::new(people(3));
        let order: Vec<_> = (0..3).map(|_| rotation.next_guesser().unwrap()).collect();
        assert_eq!(rotation.next_guesser().unwrap(), order[0]);
        assert_eq!(rotation.next_guesser().unwrap(), order[1]);

        assert!(rotation.leave(&order[1]));
        assert_eq!(rotation.next_guesser().unwrap(), order[2]);
    }

    #[test]
    fn join_twice_and_unknown_leave_are_rejected() {
        let mut rotation = Rotation::new(people(1));
        assert!(!rotation.join(people(1).remove(0)));
        assert!(!rotation.leave(&Participant::new("ghost", "Ghost")));
        assert_eq!(rotation.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum RosterOp {
        Join(usize),
        Leave(usize),
        Pick,
    }

    fn roster_op() -> impl Strategy<Value = RosterOp> {
        prop_oneof![
            (0usize..6).prop_map(RosterOp::Join),
            (0usize..6).prop_map(RosterOp::Leave),
            Just(RosterOp::Pick),
        ]
    }

    proptest! {
        #[test]
        fn active_set_tracks_joins_minus_leaves(ops in proptest::collection::vec(roster_op(), 0..40)) {
            let pool = people(6);
            let mut rotation = Rotation::default();
            let mut expected: HashSet<Participant> = HashSet::new();

            for op in ops {
                match op {
                    RosterOp::Join(index) => {
                        rotation.join(pool[index].clone());
                        expected.insert(pool[index].clone());
                    }
                    RosterOp::Leave(index) => {
                        rotation.leave(&pool[index]);
                        expected.remove(&pool[index]);
                    }
                    RosterOp::Pick => {
                        if !rotation.is_empty() {
                            prop_assert!(rotation.next_guesser().is_ok());
                        }
                    }
                }
                let active: HashSet<Participant> = rotation.active().into_iter().collect();
                prop_assert_eq!(&active, &expected);
                prop_assert_eq!(rotation.len(), expected.len());
            }
        }
    }
}

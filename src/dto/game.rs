use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::GameOptions,
    state::{game::GameSnapshot, session::Participant},
};

/// Public projection of a participant.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ParticipantView {
    /// Platform identifier.
    pub id: String,
    /// Display name at the last action.
    pub name: String,
}

impl From<&Participant> for ParticipantView {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.0.clone(),
            name: participant.name.clone(),
        }
    }
}

/// Public state of the game running in a channel. Never carries the secret word.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    /// Identifier of the game.
    pub id: Uuid,
    /// Guild the game runs in.
    pub guild_id: String,
    /// Channel the game runs in.
    pub channel_id: String,
    /// `lobby`, `hint_giving`, `invalid_review` or `guessing`.
    pub phase: String,
    /// Rounds started so far.
    pub round: u32,
    /// Participants who have not been guesser in the current cycle.
    pub queue: Vec<ParticipantView>,
    /// Past guessers, oldest first.
    pub history: Vec<ParticipantView>,
    /// Guesser of the running round.
    pub guesser: Option<ParticipantView>,
    /// Helpers who already sent a hint, while hints are hidden.
    pub hint_authors: Vec<ParticipantView>,
    /// Hints shown to the guesser, once guessing started.
    pub visible_hints: Vec<String>,
    /// Whole seconds left on the phase countdown.
    pub remaining_seconds: Option<u64>,
    /// Participants who may still vote to hurry.
    pub hurry_votes_left: usize,
    /// Whether the game is winding down.
    pub stopping: bool,
    /// Options in effect.
    pub options: GameOptionsView,
}

impl From<GameSnapshot> for GameView {
    fn from(snapshot: GameSnapshot) -> Self {
        Self {
            id: snapshot.id,
            guild_id: snapshot.scope.guild_id,
            channel_id: snapshot.scope.channel_id,
            phase: snapshot.phase.to_string(),
            round: snapshot.round,
            queue: views(&snapshot.queue),
            history: views(&snapshot.history),
            guesser: snapshot.guesser.as_ref().map(ParticipantView::from),
            hint_authors: views(&snapshot.hint_authors),
            visible_hints: snapshot.visible_hints,
            remaining_seconds: snapshot.remaining.map(|left| left.as_secs()),
            hurry_votes_left: snapshot.hurry_votes_left,
            stopping: snapshot.stopping,
            options: GameOptionsView::from(&snapshot.options),
        }
    }
}

fn views(participants: &[Participant]) -> Vec<ParticipantView> {
    participants.iter().map(ParticipantView::from).collect()
}

/// Options of a game, durations in seconds.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameOptionsView {
    /// Waiting time of the first lobby.
    pub lobby_seconds: u64,
    /// Waiting time of the lobby between two rounds.
    pub restart_seconds: u64,
    /// Time helpers get to submit hints.
    pub hint_seconds: u64,
    /// Time given to flag invalid hints.
    pub review_seconds: u64,
    /// Time the guesser gets to guess.
    pub guess_seconds: u64,
    /// Grace period before the notice of a stopped game is removed.
    pub cleanup_seconds: u64,
    /// Word pools secret words are drawn from.
    pub wordpools: Vec<String>,
    /// Language of the secret words.
    pub language: String,
    /// Participants needed to leave the lobby.
    pub min_participants: usize,
}

impl From<&GameOptions> for GameOptionsView {
    fn from(options: &GameOptions) -> Self {
        Self {
            lobby_seconds: options.lobby_duration.as_secs(),
            restart_seconds: options.restart_duration.as_secs(),
            hint_seconds: options.hint_duration.as_secs(),
            review_seconds: options.review_duration.as_secs(),
            guess_seconds: options.guess_duration.as_secs(),
            cleanup_seconds: options.cleanup_duration.as_secs(),
            wordpools: options.wordpools.clone(),
            language: options.language.clone(),
            min_participants: options.min_participants,
        }
    }
}

/// Partial update of the options of a running game. Omitted fields are kept.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct GameOptionsRequest {
    /// Waiting time of the first lobby.
    #[validate(range(min = 1, max = 3600))]
    pub lobby_seconds: Option<u64>,
    /// Waiting time of the lobby between two rounds.
    #[validate(range(min = 1, max = 3600))]
    pub restart_seconds: Option<u64>,
    /// Time helpers get to submit hints.
    #[validate(range(min = 1, max = 3600))]
    pub hint_seconds: Option<u64>,
    /// Time given to flag invalid hints.
    #[validate(range(min = 1, max = 3600))]
    pub review_seconds: Option<u64>,
    /// Time the guesser gets to guess.
    #[validate(range(min = 1, max = 3600))]
    pub guess_seconds: Option<u64>,
    /// Grace period before the notice of a stopped game is removed.
    #[validate(range(min = 1, max = 600))]
    pub cleanup_seconds: Option<u64>,
    /// Word pools secret words are drawn from.
    #[validate(length(min = 1))]
    pub wordpools: Option<Vec<String>>,
    /// Language of the secret words.
    #[validate(length(min = 2, max = 8))]
    pub language: Option<String>,
    /// Participants needed to leave the lobby.
    #[validate(range(min = 2, max = 50))]
    pub min_participants: Option<usize>,
}

impl GameOptionsRequest {
    /// Overwrite the fields of `options` present in the request.
    pub fn apply_to(self, options: &mut GameOptions) {
        let durations = [
            (self.lobby_seconds, &mut options.lobby_duration),
            (self.restart_seconds, &mut options.restart_duration),
            (self.hint_seconds, &mut options.hint_duration),
            (self.review_seconds, &mut options.review_duration),
            (self.guess_seconds, &mut options.guess_duration),
            (self.cleanup_seconds, &mut options.cleanup_duration),
        ];
        for (seconds, slot) in durations {
            if let Some(seconds) = seconds {
                *slot = Duration::from_secs(seconds);
            }
        }
        if let Some(wordpools) = self.wordpools {
            options.wordpools = wordpools;
        }
        if let Some(language) = self.language {
            options.language = language;
        }
        if let Some(min_participants) = self.min_participants {
            options.min_participants = min_participants;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_options_are_kept() {
        let mut options = GameOptions::default();
        GameOptionsRequest {
            hint_seconds: Some(15),
            wordpools: Some(vec!["animals".into()]),
            ..Default::default()
        }
        .apply_to(&mut options);

        assert_eq!(options.hint_duration, Duration::from_secs(15));
        assert_eq!(options.wordpools, vec!["animals".to_string()]);
        assert_eq!(options.lobby_duration, GameOptions::default().lobby_duration);
        assert_eq!(options.language, "en");
    }

    #[test]
    fn out_of_range_options_are_refused() {
        let request = GameOptionsRequest {
            min_participants: Some(1),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = GameOptionsRequest {
            wordpools: Some(Vec::new()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
        assert!(GameOptionsRequest::default().validate().is_ok());
    }
}

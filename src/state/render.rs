//! Transport-agnostic content of everything the engine shows to players.

use crate::state::{
    game::StopReason,
    phase::{
        GUESS, GUESS_FORM, Guessing, HINT, HINT_FORM, HURRY, Hint, HintGiving, INVALID_HINTS,
        InvalidReview, JOIN, LEAVE, Lobby, LobbyRound, REVIEW, RoundOutcome, RoundSummary,
    },
    session::{Control, Notification, Participant, SelectOption, SelectionPrompt, TextPrompt},
    timer::Countdown,
};

const MAX_HINT_LENGTH: usize = 32;
const MAX_GUESS_LENGTH: usize = 64;

fn names(participants: &[Participant]) -> String {
    if participants.is_empty() {
        return "nobody yet".to_string();
    }
    participants
        .iter()
        .map(|participant| participant.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn leave_and_hurry() -> [Control; 2] {
    [
        Control::new(HURRY, "Hurry up"),
        Control::new(LEAVE, "Leave"),
    ]
}

/// Anchor of a lobby.
pub fn lobby(
    lobby: &Lobby,
    participants: &[Participant],
    min_participants: usize,
    countdown: Option<Countdown>,
) -> Notification {
    let title = match lobby.round {
        LobbyRound::First => "Just One: waiting for players",
        LobbyRound::Restart => "Just One: next round starting soon",
    };

    let mut lines = Vec::new();
    if let Some(previous) = &lobby.previous {
        lines.push(format!(
            "Last round: {} had to guess \"{}\" ({}).",
            previous.guesser.name,
            previous.word,
            outcome_label(&previous.outcome)
        ));
    }
    lines.push(format!("Players ({}): {}", participants.len(), names(participants)));
    if participants.len() < min_participants {
        lines.push(format!(
            "At least {min_participants} players are needed to start a round."
        ));
    }

    let mut controls = vec![Control::new(JOIN, "Join")];
    controls.extend(leave_and_hurry());
    Notification {
        title: title.to_string(),
        lines,
        countdown,
        controls,
    }
}

/// Anchor while helpers write their hints. Never shows the word.
pub fn hint_giving(round: u32, phase: &HintGiving, countdown: Option<Countdown>) -> Notification {
    let submitted: Vec<Participant> = phase.hints.iter().map(|hint| hint.author.clone()).collect();
    let mut controls = vec![Control::new(HINT, "Give a hint")];
    controls.extend(leave_and_hurry());
    Notification {
        title: format!("Round {round}: {} is guessing", phase.guesser.name),
        lines: vec![
            format!("Helpers: {}", names(&phase.helpers)),
            format!(
                "Hints received ({}/{}): {}",
                submitted.len(),
                phase.helpers.len(),
                names(&submitted)
            ),
        ],
        countdown,
        controls,
    }
}

/// Anchor while helpers flag invalid hints.
pub fn invalid_review(round: u32, phase: &InvalidReview, countdown: Option<Countdown>) -> Notification {
    let mut controls = vec![Control::new(REVIEW, "Review hints")];
    controls.extend(leave_and_hurry());
    Notification {
        title: format!("Round {round}: helpers are reviewing the hints"),
        lines: vec![
            format!("{} hints to review.", phase.hints.len()),
            format!("{} is waiting. No peeking!", phase.guesser.name),
        ],
        countdown,
        controls,
    }
}

/// Ballot pushed to a reviewer.
pub fn review_prompt(phase: &InvalidReview, countdown: Option<Countdown>) -> SelectionPrompt {
    SelectionPrompt {
        action_id: INVALID_HINTS.to_string(),
        lines: vec![
            format!("Secret word: {}", phase.word),
            "Select the hints that are invalid or too close to each other.".to_string(),
        ],
        options: phase
            .hints
            .iter()
            .map(|hint| SelectOption {
                label: hint.text.clone(),
                value: hint.author.id.0.clone(),
            })
            .collect(),
        min_values: 0,
        max_values: phase.hints.len(),
        countdown,
    }
}

/// Current vote count per hint, pushed to every reviewer.
pub fn review_tally(phase: &InvalidReview) -> Notification {
    let votes = phase.invalid_votes();
    Notification {
        title: format!("Invalid hint votes for \"{}\"", phase.word),
        lines: phase
            .hints
            .iter()
            .map(|hint| {
                let count = votes.get(&hint.author.id).copied().unwrap_or(0);
                format!("{} ({}): {count} vote(s)", hint.text, hint.author.name)
            })
            .collect(),
        countdown: None,
        controls: Vec::new(),
    }
}

/// Anchor while the guesser guesses: the remaining hints are public.
pub fn guessing(round: u32, phase: &Guessing, countdown: Option<Countdown>) -> Notification {
    let mut lines: Vec<String> = phase
        .hints
        .iter()
        .map(|hint| format!("• {} ({})", hint.text, hint.author.name))
        .collect();
    if lines.is_empty() {
        lines.push("No valid hint this time. Good luck!".to_string());
    }
    if !phase.discarded.is_empty() {
        lines.push(format!("{} hint(s) were discarded.", phase.discarded.len()));
    }

    let mut controls = vec![Control::new(GUESS, "Guess")];
    controls.extend(leave_and_hurry());
    Notification {
        title: format!("Round {round}: {}, what is the word?", phase.guesser.name),
        lines,
        countdown,
        controls,
    }
}

fn outcome_label(outcome: &RoundOutcome) -> &'static str {
    match outcome {
        RoundOutcome::Correct => "found",
        RoundOutcome::Wrong { .. } => "missed",
        RoundOutcome::TimedOut => "out of time",
        RoundOutcome::GuesserLeft => "abandoned",
    }
}

/// Anchor at the end of a round.
pub fn reveal(round: u32, summary: &RoundSummary) -> Notification {
    let title = match &summary.outcome {
        RoundOutcome::Correct => "Correct guess!",
        RoundOutcome::Wrong { .. } => "Wrong guess",
        RoundOutcome::TimedOut => "Time's up",
        RoundOutcome::GuesserLeft => "Round abandoned",
    };

    let mut lines = vec![format!("Round {round}: the word was \"{}\".", summary.word)];
    match &summary.outcome {
        RoundOutcome::Correct => lines.push(format!("{} found it.", summary.guesser.name)),
        RoundOutcome::Wrong { guess } => {
            lines.push(format!("{} guessed \"{guess}\".", summary.guesser.name))
        }
        RoundOutcome::TimedOut => {
            lines.push(format!("{} did not guess in time.", summary.guesser.name))
        }
        RoundOutcome::GuesserLeft => {
            lines.push(format!("{} left the game.", summary.guesser.name))
        }
    }
    lines.extend(
        summary
            .hints
            .iter()
            .map(|hint| format!("• {} ({})", hint.text, hint.author.name)),
    );

    Notification {
        title: title.to_string(),
        lines,
        countdown: Some(Countdown::Elapsed),
        controls: Vec::new(),
    }
}

/// Anchor of a stopped game.
pub fn aborted(reason: &StopReason) -> Notification {
    let line = match reason {
        StopReason::Requested => "The game was stopped.".to_string(),
        StopReason::Deserted => "Everyone left the game.".to_string(),
        StopReason::Failed(message) => format!("The game stopped after an error: {message}"),
    };
    Notification {
        title: "Game over".to_string(),
        lines: vec![line],
        countdown: None,
        controls: Vec::new(),
    }
}

/// Last content of the anchor before it is deleted.
pub fn closed() -> Notification {
    Notification {
        title: "Game closed".to_string(),
        lines: vec!["Start a new game with /start.".to_string()],
        countdown: None,
        controls: Vec::new(),
    }
}

/// Form used by a helper to write or edit a hint.
pub fn hint_form(word: &str, previous: Option<&Hint>) -> TextPrompt {
    TextPrompt {
        action_id: HINT_FORM.to_string(),
        title: format!("Secret word: {word}"),
        label: "Your one-word hint".to_string(),
        min_length: 1,
        max_length: MAX_HINT_LENGTH,
        initial: previous.map(|hint| hint.text.clone()),
    }
}

/// Form used by the guesser.
pub fn guess_form() -> TextPrompt {
    TextPrompt {
        action_id: GUESS_FORM.to_string(),
        title: "Your guess".to_string(),
        label: "What is the secret word?".to_string(),
        min_length: 1,
        max_length: MAX_GUESS_LENGTH,
        initial: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcome: RoundOutcome) -> RoundSummary {
        RoundSummary {
            word: "Banana".into(),
            guesser: Participant::new("g", "Gina"),
            outcome,
            hints: vec![Hint {
                author: Participant::new("h", "Hugo"),
                text: "yellow".into(),
            }],
        }
    }

    #[test]
    fn reveal_titles_follow_the_outcome() {
        assert_eq!(reveal(1, &summary(RoundOutcome::Correct)).title, "Correct guess!");
        assert_eq!(
            reveal(1, &summary(RoundOutcome::Wrong { guess: "apple".into() })).title,
            "Wrong guess"
        );
        assert_eq!(reveal(1, &summary(RoundOutcome::TimedOut)).title, "Time's up");

        let timed_out = reveal(2, &summary(RoundOutcome::TimedOut));
        assert!(timed_out.lines.iter().any(|line| line.contains("did not guess in time")));
        assert!(timed_out.lines.iter().any(|line| line.contains("yellow")));
    }

    #[test]
    fn hint_giving_anchor_hides_word_and_hints() {
        let mut phase = HintGiving::new(
            "Banana".into(),
            Participant::new("g", "Gina"),
            vec![Participant::new("h", "Hugo")],
        );
        phase.hints.push(Hint {
            author: Participant::new("h", "Hugo"),
            text: "yellow".into(),
        });

        let anchor = hint_giving(1, &phase, None);
        let text = anchor.lines.join("\n");
        assert!(!text.contains("Banana"));
        assert!(!text.contains("yellow"));
        assert!(text.contains("(1/1)"));
    }
}

//! Application-level configuration loading: default game options and word pools.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::words::WordPool;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JUST_ONE_BACK_CONFIG_PATH";

/// Per-game settings. Phases snapshot the values they need when they start,
/// so changes apply from the next phase on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOptions {
    /// Waiting time of the first lobby.
    pub lobby_duration: Duration,
    /// Waiting time of the lobby between two rounds.
    pub restart_duration: Duration,
    /// Time helpers get to submit hints.
    pub hint_duration: Duration,
    /// Time given to flag invalid hints.
    pub review_duration: Duration,
    /// Time the guesser gets to guess.
    pub guess_duration: Duration,
    /// Grace period before the notice of a stopped game is removed.
    pub cleanup_duration: Duration,
    /// Names of the word pools secret words are drawn from.
    pub wordpools: Vec<String>,
    /// Language of the secret words.
    pub language: String,
    /// Participants needed to leave the lobby.
    pub min_participants: usize,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            lobby_duration: Duration::from_secs(60),
            restart_duration: Duration::from_secs(20),
            hint_duration: Duration::from_secs(90),
            review_duration: Duration::from_secs(45),
            guess_duration: Duration::from_secs(60),
            cleanup_duration: Duration::from_secs(10),
            wordpools: vec!["classic".to_string()],
            language: "en".to_string(),
            min_participants: 2,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Options every new game starts with.
    pub game: GameOptions,
    /// Word pools secret words are drawn from.
    pub word_pools: Vec<WordPool>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        pools = app_config.word_pools.len(),
                        "loaded game configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling every missing entry with its default.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameOptions::default(),
            word_pools: default_word_pools(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    game: RawGameOptions,
    #[serde(default)]
    word_pools: Vec<RawWordPool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let word_pools = if value.word_pools.is_empty() {
            default_word_pools()
        } else {
            value.word_pools.into_iter().map(Into::into).collect()
        };
        Self {
            game: value.game.into(),
            word_pools,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// Game options as written in the file; durations are in seconds.
struct RawGameOptions {
    lobby_seconds: Option<u64>,
    restart_seconds: Option<u64>,
    hint_seconds: Option<u64>,
    review_seconds: Option<u64>,
    guess_seconds: Option<u64>,
    cleanup_seconds: Option<u64>,
    wordpools: Option<Vec<String>>,
    language: Option<String>,
    min_participants: Option<usize>,
}

impl From<RawGameOptions> for GameOptions {
    fn from(value: RawGameOptions) -> Self {
        let defaults = GameOptions::default();
        let seconds = |raw: Option<u64>, fallback: Duration| {
            raw.map(Duration::from_secs).unwrap_or(fallback)
        };
        Self {
            lobby_duration: seconds(value.lobby_seconds, defaults.lobby_duration),
            restart_duration: seconds(value.restart_seconds, defaults.restart_duration),
            hint_duration: seconds(value.hint_seconds, defaults.hint_duration),
            review_duration: seconds(value.review_seconds, defaults.review_duration),
            guess_duration: seconds(value.guess_seconds, defaults.guess_duration),
            cleanup_duration: seconds(value.cleanup_seconds, defaults.cleanup_duration),
            wordpools: value.wordpools.unwrap_or(defaults.wordpools),
            language: value.language.unwrap_or(defaults.language),
            // A round needs a guesser and at least one helper.
            min_participants: value
                .min_participants
                .unwrap_or(defaults.min_participants)
                .max(2),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single word pool.
struct RawWordPool {
    name: String,
    language: String,
    words: Vec<String>,
}

impl From<RawWordPool> for WordPool {
    fn from(value: RawWordPool) -> Self {
        Self {
            name: value.name,
            language: value.language,
            words: value
                .words
                .into_iter()
                .map(|word| word.trim().to_string())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in word pools shipped with the binary.
fn default_word_pools() -> Vec<WordPool> {
    let pool = |name: &str, language: &str, words: &[&str]| WordPool {
        name: name.to_string(),
        language: language.to_string(),
        words: words.iter().map(|word| word.to_string()).collect(),
    };

    vec![
        pool(
            "classic",
            "en",
            &[
                "Anchor", "Balloon", "Bridge", "Candle", "Castle", "Cloud", "Compass", "Desert",
                "Dragon", "Feather", "Garden", "Glacier", "Guitar", "Harbor", "Island", "Jungle",
                "Kettle", "Ladder", "Lantern", "Library", "Magnet", "Mirror", "Moon", "Mountain",
                "Needle", "Ocean", "Orchestra", "Pepper", "Piano", "Pirate", "Pyramid", "Rainbow",
                "Robot", "Rocket", "Saddle", "Shadow", "Snowman", "Spider", "Telescope", "Thunder",
                "Tornado", "Umbrella", "Violin", "Volcano", "Waterfall", "Whistle", "Window",
                "Wizard",
            ],
        ),
        pool(
            "animals",
            "en",
            &[
                "Beaver", "Camel", "Dolphin", "Eagle", "Flamingo", "Giraffe", "Hedgehog",
                "Jellyfish", "Kangaroo", "Lobster", "Octopus", "Owl", "Panda", "Penguin",
                "Raccoon", "Squirrel", "Tortoise", "Walrus", "Zebra",
            ],
        ),
        pool(
            "classic",
            "de",
            &[
                "Anker", "Brücke", "Burg", "Drache", "Feder", "Garten", "Gitarre", "Hafen",
                "Insel", "Kerze", "Laterne", "Leiter", "Magnet", "Mond", "Regenbogen", "Rakete",
                "Schatten", "Spiegel", "Vulkan", "Wasserfall", "Wolke", "Zauberer",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.game, GameOptions::default());
        assert_eq!(config.word_pools, default_word_pools());
    }

    #[test]
    fn partial_options_override_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "game": { "hint_seconds": 30, "language": "de", "min_participants": 1 },
                "word_pools": [{ "name": "custom", "language": "de", "words": [" Apfel ", ""] }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.game.hint_duration, Duration::from_secs(30));
        assert_eq!(config.game.lobby_duration, GameOptions::default().lobby_duration);
        assert_eq!(config.game.language, "de");
        assert_eq!(config.game.min_participants, 2);
        assert_eq!(config.word_pools.len(), 1);
        assert_eq!(config.word_pools[0].words, vec!["Apfel".to_string()]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json("{ \"game\": 3 }").is_err());
    }
}

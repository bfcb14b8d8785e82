use rand::{rng, seq::IndexedRandom};

use crate::{config::GameOptions, error::GameError};

/// Named list of secret words in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPool {
    /// Name referenced by [`GameOptions::wordpools`].
    pub name: String,
    /// Language of the words (e.g. `en`).
    pub language: String,
    /// Candidate secret words.
    pub words: Vec<String>,
}

/// Every word pool known to the server.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    pools: Vec<WordPool>,
}

impl WordCatalog {
    /// Build a catalog from the configured pools.
    pub fn new(pools: Vec<WordPool>) -> Self {
        Self { pools }
    }

    /// Names of the pools available in `language`.
    pub fn pool_names(&self, language: &str) -> Vec<&str> {
        self.pools
            .iter()
            .filter(|pool| pool.language == language)
            .map(|pool| pool.name.as_str())
            .collect()
    }

    /// Words of every pool enabled in `options`, in its language.
    pub fn candidates<'a>(&'a self, options: &'a GameOptions) -> impl Iterator<Item = &'a str> {
        self.pools
            .iter()
            .filter(|pool| {
                pool.language == options.language && options.wordpools.contains(&pool.name)
            })
            .flat_map(|pool| pool.words.iter().map(String::as_str))
    }

    /// Draw a secret word uniformly from the enabled pools.
    pub fn draw(&self, options: &GameOptions) -> Result<String, GameError> {
        let candidates: Vec<&str> = self.candidates(options).collect();
        candidates
            .choose(&mut rng())
            .map(|word| word.to_string())
            .ok_or_else(|| GameError::EmptyWordPool {
                pools: options.wordpools.clone(),
                language: options.language.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(name: &str, language: &str, words: &[&str]) -> WordPool {
        WordPool {
            name: name.into(),
            language: language.into(),
            words: words.iter().map(|word| word.to_string()).collect(),
        }
    }

    fn catalog() -> WordCatalog {
        WordCatalog::new(vec![
            pool("classic", "en", &["Apple", "River"]),
            pool("animals", "en", &["Otter"]),
            pool("classic", "de", &["Apfel"]),
        ])
    }

    #[test]
    fn draws_from_union_of_enabled_pools_in_language() {
        let options = GameOptions {
            wordpools: vec!["classic".into(), "animals".into()],
            language: "en".into(),
            ..GameOptions::default()
        };
        let catalog = catalog();
        let mut candidates: Vec<_> = catalog.candidates(&options).collect();
        candidates.sort_unstable();
        assert_eq!(candidates, vec!["Apple", "Otter", "River"]);

        for _ in 0..20 {
            let word = catalog.draw(&options).unwrap();
            assert!(candidates.contains(&word.as_str()));
        }
    }

    #[test]
    fn language_filter_applies() {
        let options = GameOptions {
            wordpools: vec!["classic".into()],
            language: "de".into(),
            ..GameOptions::default()
        };
        assert_eq!(catalog().draw(&options).unwrap(), "Apfel");
        assert_eq!(catalog().pool_names("de"), vec!["classic"]);
    }

    #[test]
    fn empty_selection_is_reported() {
        let options = GameOptions {
            wordpools: vec!["animals".into()],
            language: "de".into(),
            ..GameOptions::default()
        };
        assert!(matches!(
            catalog().draw(&options),
            Err(GameError::EmptyWordPool { .. })
        ));
    }
}

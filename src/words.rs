use std::collections::HashMap;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::Difficulty;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("no word list for {0}")]
    Missing(Difficulty),

    #[error("word list for {0} is empty")]
    Empty(Difficulty),

    #[error("'{0}' is not a usable secret")]
    InvalidEntry(String),

    #[error("malformed word list: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unable to read word list: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub entries: Vec<String>,
}

impl WordList {
    /// Loads the list bundled into the binary for a standard tier.
    pub fn embedded(difficulty: Difficulty) -> Result<Self, WordListError> {
        let file = WORDS_DIR
            .get_file(format!("{difficulty}.json"))
            .ok_or(WordListError::Missing(difficulty))?;
        let contents = file
            .contents_utf8()
            .ok_or(WordListError::Missing(difficulty))?;

        let list: WordList = serde_json::from_str(contents)?;
        if list.entries.is_empty() {
            return Err(WordListError::Empty(difficulty));
        }
        Ok(list)
    }
}

/// One tier of a dictionary file; easy tiers carry words, harder ones phrases
#[derive(Deserialize, Debug, Default)]
struct DictionaryTier {
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    phrases: Vec<String>,
}

/// Reads a dictionary file laid out as `{"easy": {"words": [...]}, "master": {"phrases": [...]}}`.
pub fn load_dictionary(path: &Path) -> Result<HashMap<Difficulty, WordList>, WordListError> {
    let raw = fs::read_to_string(path)?;
    let tiers: HashMap<String, DictionaryTier> = serde_json::from_str(&raw)?;

    let mut lists = HashMap::new();
    for (key, tier) in tiers {
        let Ok(difficulty) = Difficulty::from_str(&key, true) else {
            warn!(%key, "ignoring unknown tier in dictionary");
            continue;
        };

        let entries: Vec<String> = tier
            .words
            .into_iter()
            .chain(tier.phrases)
            .filter_map(|e| validate_secret(&e).ok())
            .collect();
        if entries.is_empty() {
            return Err(WordListError::Empty(difficulty));
        }

        lists.insert(
            difficulty,
            WordList {
                name: difficulty.to_string(),
                entries,
            },
        );
    }
    Ok(lists)
}

/// Trims and lowercases a candidate secret, rejecting ones without letters or with
/// anything besides letters and single spaces.
pub fn validate_secret(entry: &str) -> Result<String, WordListError> {
    let cleaned = entry.split_whitespace().collect::<Vec<_>>().join(" ");
    let valid = !cleaned.is_empty()
        && cleaned
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ');
    if !valid {
        return Err(WordListError::InvalidEntry(entry.to_string()));
    }
    Ok(cleaned.to_lowercase())
}

/// Where secrets come from: the bundled lists, optionally replaced tier by tier
/// from a dictionary file, plus the player's own words for creator mode.
#[derive(Debug, Clone)]
pub struct WordSource {
    lists: HashMap<Difficulty, WordList>,
    custom: Vec<String>,
}

impl WordSource {
    pub fn embedded() -> Result<Self, WordListError> {
        let lists = Difficulty::STANDARD
            .iter()
            .map(|d| WordList::embedded(*d).map(|list| (*d, list)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self {
            lists,
            custom: Vec::new(),
        })
    }

    /// Embedded lists overlaid with a dictionary file. A missing or broken file
    /// is logged and the embedded lists are used as they are.
    pub fn with_dictionary(path: &Path) -> Result<Self, WordListError> {
        let mut source = Self::embedded()?;
        match load_dictionary(path) {
            Ok(mut lists) => {
                debug!(path = %path.display(), tiers = lists.len(), "loaded dictionary");
                // the creator tier holds custom words, not a built-in list
                if let Some(creator) = lists.remove(&Difficulty::Creator) {
                    source = source.with_custom_words(creator.entries);
                }
                source.lists.extend(lists);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "falling back to built-in word lists");
            }
        }
        Ok(source)
    }

    pub fn with_custom_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            match validate_secret(word.as_ref()) {
                Ok(word) if !self.custom.contains(&word) => self.custom.push(word),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping custom word"),
            }
        }
        self
    }

    pub fn has_creator_words(&self) -> bool {
        !self.custom.is_empty()
    }

    pub fn entries(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Creator => &self.custom,
            d => self
                .lists
                .get(&d)
                .map(|l| l.entries.as_slice())
                .unwrap_or_default(),
        }
    }

    /// Picks a secret for `difficulty` uniformly at random.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<String, WordListError> {
        self.entries(difficulty)
            .choose(rng)
            .cloned()
            .ok_or(WordListError::Empty(difficulty))
    }
}

//! In-memory word-list engine.
//!
//! A minimal `Engine` with no affix rules: a word is correct if it is in the
//! list. Intended for embedded use, tests, and as a reference for engine
//! implementors.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::engine::Engine;
use crate::error::EngineError;

/// Plain word-list engine.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
    word_characters: String,
}

impl WordList {
    /// Creates an engine knowing `words`.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            word_characters: String::new(),
        }
    }

    /// Sets the word-character set reported by the engine.
    #[must_use]
    pub fn with_word_characters(mut self, chars: impl Into<String>) -> Self {
        self.word_characters = chars.into();
        self
    }

    /// Number of known words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if no words are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn contains(&self, word: &str) -> bool {
        self.words.contains(word) || self.words.contains(&word.to_lowercase())
    }
}

/// Strips `/FLAGS`, which have no meaning here.
fn bare_word(word: &str) -> Result<&str, EngineError> {
    let bare = word.split('/').next().unwrap_or(word).trim();
    if bare.is_empty() {
        return Err(EngineError::Malformed {
            entry: word.to_string(),
            reason: "empty word".to_string(),
        });
    }
    Ok(bare)
}

fn within_one_edit(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    match long.len() - short.len() {
        0 => {
            let diffs: Vec<usize> = (0..short.len()).filter(|&i| short[i] != long[i]).collect();
            match diffs.as_slice() {
                [_] => true,
                [i, j] => *j == i + 1 && short[*i] == long[*j] && short[*j] == long[*i],
                _ => false,
            }
        }
        1 => {
            let prefix = short.iter().zip(long.iter()).take_while(|(x, y)| x == y).count();
            short[prefix..] == long[prefix + 1..]
        }
        _ => false,
    }
}

impl Engine for WordList {
    fn spell(&self, word: &str) -> bool {
        word.trim().is_empty() || self.contains(word)
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .words
            .iter()
            .filter(|w| within_one_edit(w, word))
            .cloned()
            .collect();
        out.sort_unstable();
        out
    }

    fn analyze(&self, word: &str) -> Vec<String> {
        self.stem(word).into_iter().map(|s| format!("st:{s}")).collect()
    }

    fn stem(&self, word: &str) -> Vec<String> {
        if self.contains(word) {
            vec![word.to_string()]
        } else {
            Vec::new()
        }
    }

    fn generate(&self, word: &str, _example: &str) -> Vec<String> {
        self.stem(word)
    }

    fn word_characters(&self) -> Option<&str> {
        Some(self.word_characters.as_str())
    }

    fn add(&mut self, word: &str) -> Result<(), EngineError> {
        let bare = bare_word(word)?;
        self.words.insert(bare.to_string());
        Ok(())
    }

    fn add_with_affix(&mut self, word: &str, _example: &str) -> Result<(), EngineError> {
        self.add(word)
    }

    fn remove(&mut self, word: &str) -> Result<(), EngineError> {
        self.words.remove(word);
        Ok(())
    }

    fn add_dictionary(&mut self, path: &Path) -> Result<(), EngineError> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pending = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| bare_word(line).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        self.words.extend(pending);
        Ok(())
    }
}

//! Engine boundary and dispatch machinery.
//!
//! `Engine` is the capability set consumed from a spell-checking engine. Read
//! methods take `&self`, write methods take `&mut self`; neither is assumed
//! safe to call without holding the matching coordinator permit.
//!
//! `dispatch` runs one engine invocation under a permit, on the calling
//! thread or inside a background task, and `runtime` owns the worker pool
//! those tasks run on.

pub mod dispatch;
pub mod memory;

/// Worker pool and completion handles for deferred operations.
pub mod runtime;

use std::path::Path;

use crate::error::EngineError;

/// Operations consumed from a spell-checking/morphology engine.
pub trait Engine: Send + Sync + 'static {
    /// Returns true if `word` is spelled correctly.
    fn spell(&self, word: &str) -> bool;

    /// Returns suggestions for `word`, best first.
    fn suggest(&self, word: &str) -> Vec<String>;

    /// Returns morphological analyses of `word`.
    fn analyze(&self, word: &str) -> Vec<String>;

    /// Returns the stems of `word`.
    fn stem(&self, word: &str) -> Vec<String>;

    /// Returns forms of `word` that follow the morphology of `example`.
    fn generate(&self, word: &str, example: &str) -> Vec<String>;

    /// Characters considered part of a word. Must not change after
    /// construction.
    fn word_characters(&self) -> Option<&str>;

    /// Adds a single word; the word may carry flags like a dictionary line.
    fn add(&mut self, word: &str) -> Result<(), EngineError>;

    /// Adds `word` with the affix flags of `example`.
    fn add_with_affix(&mut self, word: &str, example: &str) -> Result<(), EngineError>;

    /// Removes every entry spelled exactly `word`.
    fn remove(&mut self, word: &str) -> Result<(), EngineError>;

    /// Loads an additional dictionary file.
    fn add_dictionary(&mut self, path: &Path) -> Result<(), EngineError>;
}

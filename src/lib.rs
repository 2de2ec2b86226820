//! # spellguard - Concurrent Spell Checking over a Shared Dictionary
//!
//! spellguard wraps a single spell-checking engine instance so that many
//! threads can use it at once. Read operations (spell, suggest, analyze,
//! stem, generate) run in parallel; dictionary edits (add, remove, attached
//! word lists) run alone. Every operation can be called blocking, on the
//! caller's thread, or deferred, on a worker pool that completes a
//! `TaskHandle`.
//!
//! ## Core Concepts
//!
//! - **Engine**: the spell-checking capability set; `Dictionary` implements
//!   it over Hunspell `.aff`/`.dic` files
//! - **Coordinator**: task-fair reader/writer guard around the engine
//! - **Speller**: the operation facade with blocking and deferred forms
//! - **Request / Outcome**: the dynamic, JSON-shaped calling convention
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spellguard::Speller;
//!
//! let speller = Speller::new("en_US.aff", "en_US.dic")?;
//! assert!(speller.spell("color")?);
//! assert_eq!(speller.suggest("color")?, None);
//!
//! // Deferred: await from async code, or join from a thread.
//! let suggestions = speller.suggest_async("colour")?.await?;
//!
//! speller.add("colour")?;
//! assert!(speller.spell_async("colour")?.join()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod operation;
pub mod speller;

pub use config::{DictionaryPaths, SpellerConfig};
pub use coordinator::{Coordinator, Lifecycle, ReadPermit, WritePermit};
pub use dictionary::Dictionary;
pub use engine::dispatch::Invocation;
pub use engine::memory::WordList;
pub use engine::runtime::TaskHandle;
pub use engine::Engine;
pub use error::{ArgumentError, EngineError, ErrorKind, InitError, SpellError, SpellResult};
pub use operation::{Access, Mode, Operation, Outcome, Request, UnknownOperation};
pub use speller::{Completion, Speller};

//! Error types for spellguard.
//!
//! All errors are strongly typed using thiserror. Argument, initialization
//! and precondition errors are reported synchronously; engine and dispatch
//! failures travel through the same channel as a successful result.

use std::path::PathBuf;

use thiserror::Error;

use crate::operation::{Operation, UnknownOperation};

/// Argument-shape errors detected before the engine is touched.
///
/// The messages are part of the public contract of the dynamic boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Invalid number of arguments.")]
    Count,

    #[error("First argument is invalid.")]
    First,

    #[error("Second argument is invalid.")]
    Second,
}

/// Errors raised while loading the affix and dictionary files.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Cannot read affix file {path}: {source}")]
    AffixUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read dictionary file {path}: {source}")]
    DictionaryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed affix file {path} at line {line}: {reason}")]
    MalformedAffix {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Malformed dictionary file {path} at line {line}: {reason}")]
    MalformedDictionary {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Errors reported by the engine while executing an operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed entry '{entry}': {reason}")]
    Malformed {
        entry: String,
        reason: String,
    },

    #[error("Too many dictionaries (max: {limit})")]
    TooManyDictionaries {
        limit: usize,
    },
}

/// Coarse classification of a failure, paired with its message to form a
/// failure descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong arity or argument type.
    Argument,
    /// The engine could not be constructed.
    Initialization,
    /// The engine reported a failure during an operation.
    Engine,
    /// The instance was not in a state to accept the operation.
    Precondition,
    /// The background task failed to deliver a result.
    Dispatch,
}

/// Top-level error type for spellguard.
#[derive(Debug, Error)]
pub enum SpellError {
    #[error("{0}")]
    Argument(#[from] ArgumentError),

    #[error("{0}")]
    UnknownOperation(#[from] UnknownOperation),

    #[error("Initialization error: {0}")]
    Init(#[from] InitError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Speller is closed")]
    Closed,

    #[error("Thread already holds a permit on this speller")]
    Reentrant,

    #[error("Task queue is full (capacity: {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Failed to spawn worker thread: {source}")]
    Spawn {
        source: std::io::Error,
    },

    #[error("Task for '{operation}' was dropped before completing")]
    Disconnected {
        operation: Operation,
    },

    #[error("Task for '{operation}' panicked: {message}")]
    TaskPanicked {
        operation: Operation,
        message: String,
    },
}

impl SpellError {
    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument(_) | Self::UnknownOperation(_) => ErrorKind::Argument,
            Self::Init(_) | Self::Spawn { .. } => ErrorKind::Initialization,
            Self::Engine(_) => ErrorKind::Engine,
            Self::Closed | Self::Reentrant | Self::QueueFull { .. } => ErrorKind::Precondition,
            Self::Disconnected { .. } | Self::TaskPanicked { .. } => ErrorKind::Dispatch,
        }
    }

    /// Returns true if this is an argument error.
    #[must_use]
    pub const fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::UnknownOperation(_))
    }

    /// Returns true if this is an initialization error.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }

    /// Returns true if this is an engine error.
    #[must_use]
    pub const fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_))
    }

    /// Returns true if the speller no longer accepts operations.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if resubmitting the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}

/// Result type alias for spellguard operations.
pub type SpellResult<T> = Result<T, SpellError>;

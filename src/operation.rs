//! Operation requests and completion results.
//!
//! `Operation` names every engine operation and carries its static
//! read/write classification. `Request` is the immutable, validated form of
//! one invocation, and `Outcome` is the success payload delivered back to
//! the caller.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArgumentError;

/// Permission an operation needs from the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Shared access; may run alongside other reads.
    Read,
    /// Exclusive access; never overlaps with any other engine call.
    Write,
    /// Immutable engine property; no permit required.
    Unguarded,
}

/// Named engine operations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Spell,
    Suggest,
    Analyze,
    Stem,
    Generate,
    GetWordCharacters,
    Add,
    AddWithAffix,
    Remove,
    AddDictionary,
}

impl Operation {
    /// All operations, in table order.
    pub const ALL: [Self; 10] = [
        Self::Spell,
        Self::Suggest,
        Self::Analyze,
        Self::Stem,
        Self::Generate,
        Self::GetWordCharacters,
        Self::Add,
        Self::AddWithAffix,
        Self::Remove,
        Self::AddDictionary,
    ];

    /// Static read/write classification.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Spell | Self::Suggest | Self::Analyze | Self::Stem | Self::Generate => {
                Access::Read
            }
            Self::GetWordCharacters => Access::Unguarded,
            Self::Add | Self::AddWithAffix | Self::Remove | Self::AddDictionary => Access::Write,
        }
    }

    /// Number of string arguments the operation takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::GetWordCharacters => 0,
            Self::Generate | Self::AddWithAffix => 2,
            _ => 1,
        }
    }

    /// Canonical kebab-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spell => "spell",
            Self::Suggest => "suggest",
            Self::Analyze => "analyze",
            Self::Stem => "stem",
            Self::Generate => "generate",
            Self::GetWordCharacters => "get-word-characters",
            Self::Add => "add",
            Self::AddWithAffix => "add-with-affix",
            Self::Remove => "remove",
            Self::AddDictionary => "add-dictionary",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an operation name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Host bindings use camelCase names; accept those as aliases.
        let op = match s {
            "spell" => Self::Spell,
            "suggest" => Self::Suggest,
            "analyze" => Self::Analyze,
            "stem" => Self::Stem,
            "generate" => Self::Generate,
            "get-word-characters" | "getWordCharacters" => Self::GetWordCharacters,
            "add" => Self::Add,
            "add-with-affix" | "addWithAffix" => Self::AddWithAffix,
            "remove" => Self::Remove,
            "add-dictionary" | "addDictionary" => Self::AddDictionary,
            other => return Err(UnknownOperation(other.to_string())),
        };
        Ok(op)
    }
}

/// Execution mode of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Run on the caller's thread and return the result directly.
    #[default]
    Blocking,
    /// Run on the worker pool and complete a `TaskHandle`.
    Deferred,
}

/// A validated, immutable operation request.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Spell { word: String },
    Suggest { word: String },
    Analyze { word: String },
    Stem { word: String },
    Generate { word: String, example: String },
    GetWordCharacters,
    Add { word: String },
    AddWithAffix { word: String, example: String },
    Remove { word: String },
    AddDictionary { path: PathBuf },
}

impl Request {
    /// Validates loosely typed arguments for `operation`.
    ///
    /// Arity is checked first, then the first argument, then the second, so
    /// a call with the wrong count never reports a type error.
    pub fn parse(operation: Operation, args: &[Value]) -> Result<Self, ArgumentError> {
        if args.len() != operation.arity() {
            return Err(ArgumentError::Count);
        }
        let first = || string_arg(args, 0, ArgumentError::First);
        let second = || string_arg(args, 1, ArgumentError::Second);

        let request = match operation {
            Operation::Spell => Self::Spell { word: first()? },
            Operation::Suggest => Self::Suggest { word: first()? },
            Operation::Analyze => Self::Analyze { word: first()? },
            Operation::Stem => Self::Stem { word: first()? },
            Operation::Generate => Self::Generate {
                word: first()?,
                example: second()?,
            },
            Operation::GetWordCharacters => Self::GetWordCharacters,
            Operation::Add => Self::Add { word: first()? },
            Operation::AddWithAffix => Self::AddWithAffix {
                word: first()?,
                example: second()?,
            },
            Operation::Remove => Self::Remove { word: first()? },
            Operation::AddDictionary => Self::AddDictionary {
                path: PathBuf::from(first()?),
            },
        };
        Ok(request)
    }

    /// The operation this request invokes.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Spell { .. } => Operation::Spell,
            Self::Suggest { .. } => Operation::Suggest,
            Self::Analyze { .. } => Operation::Analyze,
            Self::Stem { .. } => Operation::Stem,
            Self::Generate { .. } => Operation::Generate,
            Self::GetWordCharacters => Operation::GetWordCharacters,
            Self::Add { .. } => Operation::Add,
            Self::AddWithAffix { .. } => Operation::AddWithAffix,
            Self::Remove { .. } => Operation::Remove,
            Self::AddDictionary { .. } => Operation::AddDictionary,
        }
    }
}

fn string_arg(args: &[Value], idx: usize, err: ArgumentError) -> Result<String, ArgumentError> {
    match args.get(idx) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(err),
    }
}

/// Success payload of a completed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Result of `spell`.
    Correct(bool),
    /// Result of `get-word-characters`; `None` when the engine has none.
    Text(Option<String>),
    /// Result of `analyze`, `stem` and `generate`.
    Words(Vec<String>),
    /// Result of `suggest`; `None` when the word is spelled correctly.
    Suggestions(Option<Vec<String>>),
    /// Result of a write operation.
    Done,
}

impl Outcome {
    /// Converts the payload into a JSON value for host bindings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Correct(b) => Value::Bool(*b),
            Self::Text(Some(s)) => Value::String(s.clone()),
            Self::Words(words) | Self::Suggestions(Some(words)) => {
                Value::Array(words.iter().cloned().map(Value::String).collect())
            }
            Self::Text(None) | Self::Suggestions(None) | Self::Done => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classification_matches_table() {
        let reads: Vec<_> = Operation::ALL
            .iter()
            .filter(|op| op.access() == Access::Read)
            .copied()
            .collect();
        assert_eq!(
            reads,
            vec![
                Operation::Spell,
                Operation::Suggest,
                Operation::Analyze,
                Operation::Stem,
                Operation::Generate
            ]
        );
        assert_eq!(Operation::GetWordCharacters.access(), Access::Unguarded);
        for op in [
            Operation::Add,
            Operation::AddWithAffix,
            Operation::Remove,
            Operation::AddDictionary,
        ] {
            assert_eq!(op.access(), Access::Write, "{op}");
        }
    }

    #[test]
    fn names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("addWithAffix".parse::<Operation>().unwrap(), Operation::AddWithAffix);
        assert!("spellSync".parse::<Operation>().is_err());
    }

    #[test]
    fn parse_checks_count_before_types() {
        assert_eq!(Request::parse(Operation::Spell, &[]), Err(ArgumentError::Count));
        assert_eq!(
            Request::parse(Operation::Spell, &[json!(1), json!(2)]),
            Err(ArgumentError::Count)
        );
        assert_eq!(
            Request::parse(Operation::Spell, &[json!(123_456)]),
            Err(ArgumentError::First)
        );
        assert_eq!(
            Request::parse(Operation::Generate, &[json!("word"), json!(2)]),
            Err(ArgumentError::Second)
        );
        assert_eq!(
            Request::parse(Operation::GetWordCharacters, &[json!("x")]),
            Err(ArgumentError::Count)
        );
    }

    #[test]
    fn parse_builds_request() {
        let req = Request::parse(Operation::AddWithAffix, &[json!("colour"), json!("color")]).unwrap();
        assert_eq!(
            req,
            Request::AddWithAffix {
                word: "colour".to_string(),
                example: "color".to_string()
            }
        );
        assert_eq!(req.operation(), Operation::AddWithAffix);
    }

    #[test]
    fn outcome_json() {
        assert_eq!(Outcome::Correct(true).to_json(), json!(true));
        assert_eq!(Outcome::Suggestions(None).to_json(), Value::Null);
        assert_eq!(
            Outcome::Suggestions(Some(vec!["color".into()])).to_json(),
            json!(["color"])
        );
        assert_eq!(Outcome::Text(None).to_json(), Value::Null);
        assert_eq!(Outcome::Done.to_json(), Value::Null);
    }
}

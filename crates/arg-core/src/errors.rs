//! Structured error types shared across the ARG crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ArgError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (node identifiers, counts, graph dumps).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for graph edits and proposals.
///
/// Two classes matter to a sampler: the recoverable proposal failures
/// ([`ArgError::NoValidMove`], [`ArgError::NoReassortmentEvent`]) which leave
/// the graph untouched and count as a rejection, and
/// [`ArgError::StructuralIntegrity`], which signals a broken rewrite and should
/// abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ArgError {
    /// Misuse of the graph API (unknown node, wrong arity, edit not open).
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// A committed edit violated a graph invariant.
    #[error("structural integrity error: {0}")]
    StructuralIntegrity(ErrorInfo),
    /// No legal move was found within the candidate budget.
    #[error("no valid move: {0}")]
    NoValidMove(ErrorInfo),
    /// No reassortment event can be removed from the graph.
    #[error("no reassortment event: {0}")]
    NoReassortmentEvent(ErrorInfo),
    /// Invalid operator or proposal configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ArgError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ArgError::Graph(info)
            | ArgError::StructuralIntegrity(info)
            | ArgError::NoValidMove(info)
            | ArgError::NoReassortmentEvent(info)
            | ArgError::Config(info)
            | ArgError::Serde(info) => info,
        }
    }

    /// Whether a sampler may treat the error as an ordinary rejection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArgError::NoValidMove(_) | ArgError::NoReassortmentEvent(_)
        )
    }

    /// Adds a context entry to the payload regardless of the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        match self {
            ArgError::Graph(info) => ArgError::Graph(info.with_context(key, value)),
            ArgError::StructuralIntegrity(info) => {
                ArgError::StructuralIntegrity(info.with_context(key, value))
            }
            ArgError::NoValidMove(info) => ArgError::NoValidMove(info.with_context(key, value)),
            ArgError::NoReassortmentEvent(info) => {
                ArgError::NoReassortmentEvent(info.with_context(key, value))
            }
            ArgError::Config(info) => ArgError::Config(info.with_context(key, value)),
            ArgError::Serde(info) => ArgError::Serde(info.with_context(key, value)),
        }
    }
}

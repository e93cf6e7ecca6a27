// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use thiserror::Error;

/// The category of failure that moved a parser into
/// [`ParserState::Error`](super::types::ParserState::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    General,
    /// A buffer source was handed to the parser without any bytes in it.
    NoLength,
    /// A finished token could not be materialized.
    Token,
    /// The token accumulation buffer could not grow.
    AllocFailed,
    Syntax,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::General => "GENERAL",
            ErrorKind::NoLength => "NO LENGTH",
            ErrorKind::Token => "TOKEN",
            ErrorKind::AllocFailed => "ALLOC FAILED",
            ErrorKind::Syntax => "SYNTAX",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ParserError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ParserError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ParserError {
            kind,
            message: message.into(),
        }
    }

    pub(super) fn syntax(line: usize, what: impl std::fmt::Display) -> Self {
        ParserError::new(ErrorKind::Syntax, format!("syntax error on line {line}, {what}"))
    }
}

/// Failures reported by [`ScopeTree`](super::scope_tree::ScopeTree) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("scope `{0}` already exists in its parent")]
    DuplicateScope(String),
    #[error("variable `{0}` already exists in its parent")]
    DuplicateVariable(String),
    #[error("scope handle {0} does not refer to a live scope")]
    UnknownScope(usize),
    #[error("variable handle {0} does not refer to a live variable")]
    UnknownVariable(usize),
    #[error("failed to allocate storage for `{0}`")]
    AllocFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_uses_upper_case_kind() {
        let err = ParserError::syntax(3, "got EOF while parsing $date");
        assert_eq!(
            err.to_string(),
            "SYNTAX: syntax error on line 3, got EOF while parsing $date"
        );
        assert_eq!(ErrorKind::AllocFailed.to_string(), "ALLOC FAILED");
    }
}

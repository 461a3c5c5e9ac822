use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexer::Position;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable error codes.
///
/// `E0xx` codes are grouped by the phase that raises them; `W001` is the
/// only warning and never aborts a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    E001,
    E002,
    E010,
    E011,
    E012,
    E013,
    E020,
    E021,
    E022,
    E023,
    E024,
    E030,
    E031,
    E032,
    E040,
    W001,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E010 => "E010",
            ErrorCode::E011 => "E011",
            ErrorCode::E012 => "E012",
            ErrorCode::E013 => "E013",
            ErrorCode::E020 => "E020",
            ErrorCode::E021 => "E021",
            ErrorCode::E022 => "E022",
            ErrorCode::E023 => "E023",
            ErrorCode::E024 => "E024",
            ErrorCode::E030 => "E030",
            ErrorCode::E031 => "E031",
            ErrorCode::E032 => "E032",
            ErrorCode::E040 => "E040",
            ErrorCode::W001 => "W001",
        }
    }

    pub fn is_warning(self) -> bool {
        matches!(self, ErrorCode::W001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
    Graph,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unterminated string literal")]
    UnterminatedString { position: Position },

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("invalid range: minimum {min} is greater than maximum {max}")]
    InvalidRange {
        min: u32,
        max: u32,
        position: Position,
    },

    #[error("missing {clause} clause")]
    MissingClause {
        clause: &'static str,
        position: Position,
    },

    #[error("invalid literal: {message}")]
    InvalidLiteral { message: String, position: Position },

    #[error("variable `{name}` is not defined in MATCH")]
    UnboundVariable { name: String, position: Position },

    #[error("unknown label :{label}")]
    UnknownLabel { label: String, position: Position },

    #[error("unknown relationship type :{rel_type}")]
    UnknownRelType { rel_type: String, position: Position },

    #[error("ambiguous pattern: {message}")]
    AmbiguousPattern { message: String, position: Position },

    #[error("variable `{name}` is already bound to a {existing}")]
    DuplicateBinding {
        name: String,
        existing: &'static str,
        position: Position,
    },

    #[error("traversal depth {requested} exceeds the maximum of {limit}")]
    TraversalDepthExceeded {
        requested: u32,
        limit: u32,
        position: Option<Position>,
    },

    #[error("invalid property access: {message}")]
    InvalidPropertyAccess {
        message: String,
        position: Option<Position>,
    },

    #[error("type mismatch: cannot apply {operator} to {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("graph build failed: {0}")]
    Graph(#[from] sgqs_graph::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::UnexpectedCharacter { .. } => ErrorCode::E001,
            Error::UnterminatedString { .. } => ErrorCode::E002,
            Error::UnexpectedToken { .. } => ErrorCode::E010,
            Error::InvalidRange { .. } => ErrorCode::E011,
            Error::MissingClause { .. } => ErrorCode::E012,
            Error::InvalidLiteral { .. } => ErrorCode::E013,
            Error::UnboundVariable { .. } => ErrorCode::E020,
            Error::UnknownLabel { .. } => ErrorCode::E021,
            Error::UnknownRelType { .. } => ErrorCode::E022,
            Error::AmbiguousPattern { .. } => ErrorCode::E023,
            Error::DuplicateBinding { .. } => ErrorCode::E024,
            Error::TraversalDepthExceeded { .. } => ErrorCode::E030,
            Error::InvalidPropertyAccess { .. } => ErrorCode::E031,
            Error::TypeMismatch { .. } => ErrorCode::E032,
            Error::Graph(_) => ErrorCode::E040,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Error::UnexpectedCharacter { .. } | Error::UnterminatedString { .. } => Phase::Lexical,
            Error::UnexpectedToken { .. }
            | Error::InvalidRange { .. }
            | Error::MissingClause { .. }
            | Error::InvalidLiteral { .. } => Phase::Syntax,
            Error::UnboundVariable { .. }
            | Error::UnknownLabel { .. }
            | Error::UnknownRelType { .. }
            | Error::AmbiguousPattern { .. }
            | Error::DuplicateBinding { .. } => Phase::Semantic,
            Error::TraversalDepthExceeded { .. }
            | Error::InvalidPropertyAccess { .. }
            | Error::TypeMismatch { .. } => Phase::Runtime,
            Error::Graph(_) => Phase::Graph,
        }
    }

    /// Source position of the offending token, when the error has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::UnexpectedCharacter { position, .. }
            | Error::UnterminatedString { position }
            | Error::UnexpectedToken { position, .. }
            | Error::InvalidRange { position, .. }
            | Error::MissingClause { position, .. }
            | Error::InvalidLiteral { position, .. }
            | Error::UnboundVariable { position, .. }
            | Error::UnknownLabel { position, .. }
            | Error::UnknownRelType { position, .. }
            | Error::AmbiguousPattern { position, .. }
            | Error::DuplicateBinding { position, .. } => Some(*position),
            Error::TraversalDepthExceeded { position, .. }
            | Error::InvalidPropertyAccess { position, .. } => *position,
            Error::TypeMismatch { .. } | Error::Graph(_) => None,
        }
    }

    pub fn to_info(&self) -> ErrorInfo {
        let info = ErrorInfo::new(self.code(), self.to_string());
        match self.position() {
            Some(position) => info.at(position),
            None => info,
        }
    }
}

/// Serializable error record carried in a query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            position: None,
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position.offset);
        self.line = Some(position.line);
        self.column = Some(position.column);
        self
    }

    pub fn is_warning(&self) -> bool {
        self.code.is_warning()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " (line {line}, column {column})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_carries_code_and_position() {
        let err = Error::UnknownLabel {
            label: "Widget".to_string(),
            position: Position {
                offset: 9,
                line: 1,
                column: 10,
            },
        };
        let info = err.to_info();
        assert_eq!(info.code, ErrorCode::E021);
        assert_eq!(info.to_string(), "E021: unknown label :Widget (line 1, column 10)");
        assert_eq!(err.phase(), Phase::Semantic);
    }

    #[test]
    fn positionless_info_omits_location_fields() {
        let info = Error::TypeMismatch {
            operator: "<".to_string(),
            left: "string",
            right: "integer",
        }
        .to_info();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["code"], "E032");
        assert!(json.get("line").is_none());
    }
}

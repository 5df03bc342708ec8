//! Error types for mftparse
//!
//! Parsing failures carry the location where the input stopped making sense.
//! Workflow failures (bad requests, generation problems) have no location.

use std::fmt;
use thiserror::Error;

/// Location in the input; `line` and `col` are 1-based, `col` counts characters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    /// Span for errors that do not point into any input
    pub const fn empty() -> Self {
        Self::at(Pos::new(0, 0, 0))
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not well-formed XML
    MalformedInput,
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
    /// A workflow was called with inputs it cannot act on
    InvalidRequest,
    /// The text generation capability failed or returned nothing usable
    Generation,
}

impl ErrorKind {
    /// Whether the error describes the input document rather than the request
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput | Self::MaxDepthExceeded { .. } | Self::MaxSizeExceeded { .. }
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput => f.write_str("malformed input"),
            Self::MaxDepthExceeded { max } => write!(f, "nesting deeper than {max} elements"),
            Self::MaxSizeExceeded { max } => write!(f, "input larger than {max} bytes"),
            Self::InvalidRequest => f.write_str("invalid request"),
            Self::Generation => f.write_str("generation failed"),
        }
    }
}

/// Main error type for mftparse
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    /// Error whose message is the kind's description
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self::with_message(kind, span, message)
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn malformed(pos: Pos, message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::MalformedInput, Span::at(pos), message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvalidRequest, Span::empty(), message)
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Generation, Span::empty(), message)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_malformed_input(&self) -> bool {
        self.kind == ErrorKind::MalformedInput
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_parse_error() && !self.span.is_empty() {
            write!(f, "{} at {}", self.message, self.span.start)
        } else if self.kind.is_parse_error() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_carries_location() {
        let err = Error::malformed(Pos::new(7, 1, 8), "unterminated element <module>");
        assert!(err.is_malformed_input());
        assert_eq!(err.span().start.offset, 7);
        assert_eq!(
            err.to_string(),
            "unterminated element <module> at line 1, column 8"
        );
    }

    #[test]
    fn test_limit_errors() {
        let err = Error::new(ErrorKind::MaxSizeExceeded { max: 64 }, Span::empty());
        assert_eq!(err.message(), "input larger than 64 bytes");
        assert_eq!(err.to_string(), "input larger than 64 bytes");

        let err = Error::new(
            ErrorKind::MaxDepthExceeded { max: 4 },
            Span::at(Pos::new(20, 2, 3)),
        );
        assert_eq!(err.to_string(), "nesting deeper than 4 elements at line 2, column 3");
    }

    #[test]
    fn test_request_errors_display_kind() {
        let err = Error::invalid_request("select at least one tool");
        assert_eq!(err.kind(), &ErrorKind::InvalidRequest);
        assert!(err.span().is_empty());
        assert_eq!(err.to_string(), "invalid request: select at least one tool");
        assert_eq!(
            Error::generation("no textual output").to_string(),
            "generation failed: no textual output"
        );
    }
}

//! Error type shared by every fallible tokenizer operation.

use core::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type LexResult<T> = Result<T, LexError>;

/// What went wrong, independent of where in the input it happened.
///
/// Every kind is fatal to the current token; the tokenizer does not
/// resynchronize. End of input at the top level is not an error, it is the
/// [`Token::Eof`](crate::Token::Eof) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed UTF-8, a bad continuation byte, or an unpaired surrogate
    /// half in a materialized value.
    InvalidUtf8,
    /// A character that cannot begin any token.
    BadTokenStart(u32),
    /// Syntactically invalid content inside a token: a leading-zero
    /// violation, an out-of-range calendar field, a number that ran into a
    /// non-terminator, a bad base-64 shape.
    BadToken(Option<u32>),
    /// Unknown `\` escape or bad hex escape digits.
    BadEscape,
    /// End of input inside a quoted symbol, string, comment, or lob.
    UnexpectedEof,
    /// Token ring buffer overflow, or a lookahead past the supported
    /// distance. Internal invariant; unreachable from well-formed use.
    QueueOverflow,
    /// Token ring buffer underflow, or a restore without a prior save.
    /// Internal invariant; unreachable from well-formed use.
    QueueUnderflow,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidUtf8 => f.write_str("invalid UTF-8 sequence encountered"),
            ErrorKind::BadTokenStart(c) => write!(
                f,
                "bad character {} encountered where a token was supposed to start",
                CodePoint(*c)
            ),
            ErrorKind::BadToken(Some(c)) => {
                write!(f, "a bad character {} was encountered in a token", CodePoint(*c))
            }
            ErrorKind::BadToken(None) => {
                f.write_str("a bad character was encountered in a token")
            }
            ErrorKind::BadEscape => f.write_str("bad escape character encountered"),
            ErrorKind::UnexpectedEof => f.write_str("unexpected end of input"),
            ErrorKind::QueueOverflow => f.write_str("token queue is full (internal error)"),
            ErrorKind::QueueUnderflow => f.write_str("token queue is empty (internal error)"),
        }
    }
}

/// A lexical error, positioned at the decoder's line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at line {line} offset {offset}")]
pub struct LexError {
    pub kind: ErrorKind,
    /// 1-based input line.
    pub line: usize,
    /// Column within the line; 0 immediately after a newline.
    pub offset: usize,
}

impl LexError {
    pub(crate) fn new(kind: ErrorKind, line: usize, offset: usize) -> Self {
        Self { kind, line, offset }
    }
}

/// Renders a code point the way diagnostics expect: printable ASCII as
/// itself, everything else as U+XXXX.
struct CodePoint(u32);

impl fmt::Display for CodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.0) {
            Some(c) if (0x20..0x7F).contains(&self.0) => write!(f, "'{c}'"),
            _ => write!(f, "U+{:04X}", self.0),
        }
    }
}

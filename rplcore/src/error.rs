use std::{ops::Range, sync::Arc};

use thiserror::Error;

/// Byte range of a source fragment, used to point parse errors at the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            len: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

#[derive(Debug, Clone, Error)]
pub enum RplError {
    #[error("Divide by zero")]
    ZeroDivide,

    #[error("Undefined operation")]
    UndefinedOperation,

    #[error("Bad argument type")]
    TypeError,

    #[error("Bad argument value")]
    ValueError,

    #[error("Syntax error: {message}")]
    Syntax { message: String, span: Span },

    #[error("Unterminated {what}")]
    Unterminated { what: &'static str, span: Span },

    #[error("Argument expected")]
    ArgumentExpected { span: Span },

    #[error("Value expected before '{operator}'")]
    PrefixExpected { operator: String, span: Span },

    #[error("'{name}' is not allowed in an algebraic expression")]
    NotAlgebraic { name: String, span: Span },

    #[error("Bad guess")]
    BadGuess,

    #[error("No solution?")]
    NoSolution,

    #[error("Sign reversal")]
    SignReversal,

    #[error("Constant?")]
    ConstantValue,

    #[error("Invalid function")]
    InvalidFunction,

    #[error("Interrupted")]
    Interrupted,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Invalid object handle")]
    InvalidHandle,

    #[error("Unimplemented operation")]
    Unimplemented,

    #[error("Undefined name '{0}'")]
    UndefinedName(String),

    #[error("Too few arguments")]
    TooFewArguments,

    #[error("Inconsistent units")]
    InconsistentUnits,

    #[error("Too many recursion levels")]
    Recursion,

    #[error("Malformed object encoding: {0}")]
    InvalidObject(&'static str),

    #[error("Failed to parse settings file '{file}': {message}")]
    Config { message: String, file: String },

    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),
}

impl RplError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    /// Source location of a parse error, if the error carries one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::Unterminated { span, .. }
            | Self::ArgumentExpected { span }
            | Self::PrefixExpected { span, .. }
            | Self::NotAlgebraic { span, .. } => Some(*span),
            _ => None,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        self.span().is_some()
    }
}

impl From<std::io::Error> for RplError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

pub type RplResult<T> = Result<T, RplError>;

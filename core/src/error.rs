//! Error types for parsing, dispatching and graph construction.
//!
//! Syntax failures carry the input and cursor position at the point of
//! failure so callers can render a caret-style excerpt. Dispatch failures
//! (unknown command, unknown argument) reuse the same type because they are
//! reported to the caller in exactly the same way.

use std::fmt;

use thiserror::Error;

use crate::StringReader;

/// Number of characters of input shown before the caret in rendered errors.
const CONTEXT_AMOUNT: usize = 10;

/// Every failure the text cursor, the argument types and the dispatcher can
/// raise.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxErrorKind {
    #[error("Double must not be less than {min}, found {found}")]
    DoubleTooSmall { found: f64, min: f64 },
    #[error("Double must not be more than {max}, found {found}")]
    DoubleTooBig { found: f64, max: f64 },
    #[error("Float must not be less than {min}, found {found}")]
    FloatTooSmall { found: f32, min: f32 },
    #[error("Float must not be more than {max}, found {found}")]
    FloatTooBig { found: f32, max: f32 },
    #[error("Integer must not be less than {min}, found {found}")]
    IntegerTooSmall { found: i32, min: i32 },
    #[error("Integer must not be more than {max}, found {found}")]
    IntegerTooBig { found: i32, max: i32 },
    #[error("Long must not be less than {min}, found {found}")]
    LongTooSmall { found: i64, min: i64 },
    #[error("Long must not be more than {max}, found {found}")]
    LongTooBig { found: i64, max: i64 },
    #[error("Expected literal {0}")]
    LiteralIncorrect(String),
    #[error("Expected quote to start a string")]
    ExpectedStartOfQuote,
    #[error("Unclosed quoted string")]
    ExpectedEndOfQuote,
    #[error("Invalid escape sequence '{0}' in quoted string")]
    InvalidEscape(char),
    #[error("Invalid bool, expected true or false but found '{0}'")]
    InvalidBool(String),
    #[error("Expected bool")]
    ExpectedBool,
    #[error("Invalid integer '{0}'")]
    InvalidInt(String),
    #[error("Expected integer")]
    ExpectedInt,
    #[error("Invalid long '{0}'")]
    InvalidLong(String),
    #[error("Expected long")]
    ExpectedLong,
    #[error("Invalid float '{0}'")]
    InvalidFloat(String),
    #[error("Expected float")]
    ExpectedFloat,
    #[error("Invalid double '{0}'")]
    InvalidDouble(String),
    #[error("Expected double")]
    ExpectedDouble,
    #[error("Expected '{0}'")]
    ExpectedSymbol(char),
    #[error("Unknown command")]
    UnknownCommand,
    #[error("Incorrect argument for command")]
    UnknownArgument,
    #[error("Expected whitespace to end one argument, but found trailing data")]
    ExpectedArgumentSeparator,
    #[error("Could not parse command: {0}")]
    ParseException(String),
    #[error("No such argument '{name}' exists on this command. Available arguments: {available}")]
    NoSuchArgument { name: String, available: String },
    #[error("Argument '{name}' is defined as {found}, not {expected}")]
    ArgumentTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Free-form failure raised by executors, modifiers or providers.
    #[error("{0}")]
    Custom(String),
}

/// A syntax or dispatch failure, optionally anchored to a position in the
/// input.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSyntaxError {
    kind: SyntaxErrorKind,
    input: Option<String>,
    cursor: Option<usize>,
}

impl CommandSyntaxError {
    /// Creates an error without input context.
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            input: None,
            cursor: None,
        }
    }

    /// Creates an error anchored at the reader's current cursor.
    pub fn with_context(kind: SyntaxErrorKind, reader: &StringReader) -> Self {
        Self {
            kind,
            input: Some(reader.string().to_string()),
            cursor: Some(reader.cursor()),
        }
    }

    /// Shorthand for a [`SyntaxErrorKind::Custom`] error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::Custom(message.into()))
    }

    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The bare message without the position excerpt.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Up to ten characters of input before the cursor followed by a
    /// `<--[HERE]` marker, or `None` when the error has no input context.
    pub fn context(&self) -> Option<String> {
        let input = self.input.as_deref()?;
        let cursor = self.cursor?.min(input.len());
        let before = input.get(..cursor).unwrap_or(input);
        let count = before.chars().count();

        let mut out = String::new();
        if count > CONTEXT_AMOUNT {
            out.push_str("...");
        }
        out.extend(before.chars().skip(count.saturating_sub(CONTEXT_AMOUNT)));
        out.push_str("<--[HERE]");
        Some(out)
    }
}

impl fmt::Display for CommandSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let (Some(context), Some(cursor)) = (self.context(), self.cursor) {
            write!(f, " at position {cursor}: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandSyntaxError {}

impl From<SyntaxErrorKind> for CommandSyntaxError {
    fn from(kind: SyntaxErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Failure of a parse, execute or suggest call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Input did not match the grammar, or an executor rejected it.
    #[error(transparent)]
    Syntax(#[from] CommandSyntaxError),
    /// The cancellation token fired at a suspension point.
    #[error("command operation was cancelled")]
    Cancelled,
}

impl CommandError {
    /// Returns the syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&CommandSyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Cancelled => None,
        }
    }
}

impl From<SyntaxErrorKind> for CommandError {
    fn from(kind: SyntaxErrorKind) -> Self {
        Self::Syntax(CommandSyntaxError::new(kind))
    }
}

/// Convenience alias for results with [`CommandError`].
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Structural failures while assembling a command graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The root node was offered as a child of another node.
    #[error("cannot add the root node as a child")]
    RootAsChild,
    /// A builder declares both children and a redirect.
    #[error("node '{0}' cannot both redirect and have children")]
    RedirectWithChildren(String),
    /// Custom suggestions were attached to a literal.
    #[error("literal '{0}' cannot have custom suggestions")]
    SuggestionsOnLiteral(String),
    /// A handle that does not belong to this graph.
    #[error("node #{0} does not exist in this graph")]
    UnknownNode(usize),
}

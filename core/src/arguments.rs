//! Built-in argument types and the values they produce.

use std::fmt;

use crate::error::{CommandSyntaxError, SyntaxErrorKind};
use crate::range::StringRange;
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// How a string argument consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// One unquoted word.
    SingleWord,
    /// A word, or a quoted phrase.
    QuotablePhrase,
    /// Everything left in the input.
    GreedyPhrase,
}

impl StringKind {
    /// Wire discriminant used by the Commands packet.
    pub fn id(self) -> i32 {
        match self {
            Self::SingleWord => 0,
            Self::QuotablePhrase => 1,
            Self::GreedyPhrase => 2,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::SingleWord),
            1 => Some(Self::QuotablePhrase),
            2 => Some(Self::GreedyPhrase),
            _ => None,
        }
    }
}

/// An argument type the proxy does not interpret. The raw payload is kept
/// so the node can be forwarded unchanged; parsing accepts one
/// space-delimited token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassthroughArgument {
    /// Namespaced parser identifier, e.g. `minecraft:entity`.
    pub identifier: String,
    /// Parser properties exactly as they appeared on the wire.
    pub properties: Vec<u8>,
}

impl PassthroughArgument {
    pub fn new(identifier: impl Into<String>, properties: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            properties,
        }
    }
}

/// The type of an argument node.
///
/// Numeric variants carry inclusive bounds; unbounded types use the
/// numeric type's extremes.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentType {
    Bool,
    Integer { min: i32, max: i32 },
    Long { min: i64, max: i64 },
    Float { min: f32, max: f32 },
    Double { min: f64, max: f64 },
    String(StringKind),
    Passthrough(PassthroughArgument),
}

impl ArgumentType {
    pub fn bool() -> Self {
        Self::Bool
    }

    pub fn integer() -> Self {
        Self::integer_between(i32::MIN, i32::MAX)
    }

    pub fn integer_between(min: i32, max: i32) -> Self {
        Self::Integer { min, max }
    }

    pub fn long() -> Self {
        Self::long_between(i64::MIN, i64::MAX)
    }

    pub fn long_between(min: i64, max: i64) -> Self {
        Self::Long { min, max }
    }

    pub fn float() -> Self {
        Self::float_between(f32::MIN, f32::MAX)
    }

    pub fn float_between(min: f32, max: f32) -> Self {
        Self::Float { min, max }
    }

    pub fn double() -> Self {
        Self::double_between(f64::MIN, f64::MAX)
    }

    pub fn double_between(min: f64, max: f64) -> Self {
        Self::Double { min, max }
    }

    pub fn word() -> Self {
        Self::String(StringKind::SingleWord)
    }

    pub fn string() -> Self {
        Self::String(StringKind::QuotablePhrase)
    }

    pub fn greedy_string() -> Self {
        Self::String(StringKind::GreedyPhrase)
    }

    pub fn passthrough(identifier: impl Into<String>, properties: Vec<u8>) -> Self {
        Self::Passthrough(PassthroughArgument::new(identifier, properties))
    }

    /// Short lowercase name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer { .. } => "integer",
            Self::Long { .. } => "long",
            Self::Float { .. } => "float",
            Self::Double { .. } => "double",
            Self::String(_) => "string",
            Self::Passthrough(_) => "passthrough",
        }
    }

    /// Parses one value from `reader`, leaving the cursor after it.
    pub fn parse(&self, reader: &mut StringReader) -> Result<ArgumentValue, CommandSyntaxError> {
        match self {
            Self::Bool => reader.read_boolean().map(ArgumentValue::Bool),
            Self::Integer { min, max } => {
                let start = reader.cursor();
                let value = reader.read_int()?;
                check_bounds(
                    reader,
                    start,
                    value,
                    *min,
                    *max,
                    |found, min| SyntaxErrorKind::IntegerTooSmall { found, min },
                    |found, max| SyntaxErrorKind::IntegerTooBig { found, max },
                )?;
                Ok(ArgumentValue::Integer(value))
            }
            Self::Long { min, max } => {
                let start = reader.cursor();
                let value = reader.read_long()?;
                check_bounds(
                    reader,
                    start,
                    value,
                    *min,
                    *max,
                    |found, min| SyntaxErrorKind::LongTooSmall { found, min },
                    |found, max| SyntaxErrorKind::LongTooBig { found, max },
                )?;
                Ok(ArgumentValue::Long(value))
            }
            Self::Float { min, max } => {
                let start = reader.cursor();
                let value = reader.read_float()?;
                check_bounds(
                    reader,
                    start,
                    value,
                    *min,
                    *max,
                    |found, min| SyntaxErrorKind::FloatTooSmall { found, min },
                    |found, max| SyntaxErrorKind::FloatTooBig { found, max },
                )?;
                Ok(ArgumentValue::Float(value))
            }
            Self::Double { min, max } => {
                let start = reader.cursor();
                let value = reader.read_double()?;
                check_bounds(
                    reader,
                    start,
                    value,
                    *min,
                    *max,
                    |found, min| SyntaxErrorKind::DoubleTooSmall { found, min },
                    |found, max| SyntaxErrorKind::DoubleTooBig { found, max },
                )?;
                Ok(ArgumentValue::Double(value))
            }
            Self::String(StringKind::SingleWord) => {
                Ok(ArgumentValue::String(reader.read_unquoted_string()))
            }
            Self::String(StringKind::QuotablePhrase) => {
                reader.read_string().map(ArgumentValue::String)
            }
            Self::String(StringKind::GreedyPhrase) => {
                let text = reader.remaining().to_string();
                reader.set_cursor(reader.total_length());
                Ok(ArgumentValue::String(text))
            }
            Self::Passthrough(_) => {
                let start = reader.cursor();
                while reader.peek().is_some_and(|c| c != ' ') {
                    reader.skip();
                }
                let token = &reader.string()[start..reader.cursor()];
                Ok(ArgumentValue::Raw(token.to_string()))
            }
        }
    }

    /// Built-in suggestions. Only booleans suggest anything on their own.
    pub fn list_suggestions(&self, mut builder: SuggestionsBuilder) -> Suggestions {
        if let Self::Bool = self {
            for candidate in ["true", "false"] {
                if candidate.starts_with(builder.remaining_lowercase()) {
                    builder.suggest(candidate);
                }
            }
        }
        builder.build()
    }

    /// Sample inputs this type accepts, used for ambiguity detection.
    pub fn examples(&self) -> &'static [&'static str] {
        match self {
            Self::Bool => &["true", "false"],
            Self::Integer { .. } | Self::Long { .. } => &["0", "123", "-123"],
            Self::Float { .. } | Self::Double { .. } => {
                &["0", "1.2", ".5", "-1", "-.5", "-1234.56"]
            }
            Self::String(StringKind::SingleWord) => &["word", "words_with_underscores"],
            Self::String(StringKind::QuotablePhrase) => &["\"quoted phrase\"", "word", "\"\""],
            Self::String(StringKind::GreedyPhrase) => {
                &["word", "words with spaces", "\"and symbols\""]
            }
            Self::Passthrough(_) => &[],
        }
    }
}

fn check_bounds<T: PartialOrd + Copy>(
    reader: &mut StringReader,
    start: usize,
    value: T,
    min: T,
    max: T,
    too_small: impl FnOnce(T, T) -> SyntaxErrorKind,
    too_big: impl FnOnce(T, T) -> SyntaxErrorKind,
) -> Result<(), CommandSyntaxError> {
    let kind = if value < min {
        too_small(value, min)
    } else if value > max {
        too_big(value, max)
    } else {
        return Ok(());
    };
    reader.set_cursor(start);
    Err(CommandSyntaxError::with_context(kind, reader))
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passthrough(arg) => write!(f, "{}", arg.identifier),
            Self::String(kind) => write!(f, "string({kind:?})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// A value produced by parsing an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Bool(bool),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Unparsed token of a passthrough argument.
    Raw(String),
}

impl ArgumentValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Raw(_) => "raw",
        }
    }
}

/// An argument value together with the input span it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgument {
    pub range: StringRange,
    pub value: ArgumentValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(ty: &ArgumentType, input: &str) -> (Result<ArgumentValue, CommandSyntaxError>, usize) {
        let mut reader = StringReader::new(input);
        let result = ty.parse(&mut reader);
        (result, reader.cursor())
    }

    #[test]
    fn test_integer_bounds_rewind() {
        let ty = ArgumentType::integer_between(0, 10);
        let (result, cursor) = parse(&ty, "11");
        assert_eq!(
            result.unwrap_err().kind(),
            &SyntaxErrorKind::IntegerTooBig { found: 11, max: 10 }
        );
        assert_eq!(cursor, 0);

        let (result, _) = parse(&ty, "-1");
        assert_eq!(
            result.unwrap_err().kind(),
            &SyntaxErrorKind::IntegerTooSmall { found: -1, min: 0 }
        );
    }

    #[test]
    fn test_double_within_bounds() {
        let ty = ArgumentType::double_between(-1.0, 1.0);
        let (result, cursor) = parse(&ty, "0.25 rest");
        assert_eq!(result.unwrap(), ArgumentValue::Double(0.25));
        assert_eq!(cursor, 4);
    }

    #[test]
    fn test_greedy_string_consumes_everything() {
        let (result, cursor) = parse(&ArgumentType::greedy_string(), "hello there world");
        assert_eq!(result.unwrap(), ArgumentValue::String("hello there world".to_string()));
        assert_eq!(cursor, 17);
    }

    #[test]
    fn test_word_stops_at_space() {
        let (result, cursor) = parse(&ArgumentType::word(), "Steve here");
        assert_eq!(result.unwrap(), ArgumentValue::String("Steve".to_string()));
        assert_eq!(cursor, 5);
    }

    #[test]
    fn test_passthrough_reads_single_token() {
        let ty = ArgumentType::passthrough("minecraft:entity", vec![0x01]);
        let (result, cursor) = parse(&ty, "@e[type=cow] 5");
        assert_eq!(result.unwrap(), ArgumentValue::Raw("@e[type=cow]".to_string()));
        assert_eq!(cursor, 12);
    }

    #[test]
    fn test_bool_suggestions_filter_by_prefix() {
        let builder = SuggestionsBuilder::new("f", 0);
        let suggestions = ArgumentType::bool().list_suggestions(builder);
        let texts: Vec<&str> = suggestions.list().iter().map(|s| s.text()).collect();
        assert_eq!(texts, vec!["false"]);
    }

    #[test]
    fn test_string_kind_ids() {
        for kind in [
            StringKind::SingleWord,
            StringKind::QuotablePhrase,
            StringKind::GreedyPhrase,
        ] {
            assert_eq!(StringKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(StringKind::from_id(3), None);
    }
}

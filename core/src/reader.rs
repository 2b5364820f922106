//! A cursor over command input.
//!
//! [`StringReader`] walks an immutable input string and knows how to pull
//! out the primitive tokens command arguments are made of: numbers,
//! booleans, unquoted words and quoted strings with backslash escapes.
//! Failed numeric and boolean reads rewind the cursor to where the token
//! started so the caller can try a different interpretation.

use std::sync::Arc;

use crate::error::{CommandSyntaxError, SyntaxErrorKind};

const SYNTAX_ESCAPE: char = '\\';
const SYNTAX_DOUBLE_QUOTE: char = '"';
const SYNTAX_SINGLE_QUOTE: char = '\'';

/// Cursor over an input string. Cloning is cheap; the text is shared.
///
/// Positions are byte offsets into the input.
///
/// # Examples
///
/// ```
/// use command_tree_core::StringReader;
///
/// let mut reader = StringReader::new("tp 10 \"a b\"");
/// assert_eq!(reader.read_unquoted_string(), "tp");
/// reader.skip_whitespace();
/// assert_eq!(reader.read_int().unwrap(), 10);
/// reader.skip_whitespace();
/// assert_eq!(reader.read_string().unwrap(), "a b");
/// assert!(!reader.can_read());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringReader {
    string: Arc<str>,
    cursor: usize,
}

impl StringReader {
    pub fn new(string: impl Into<Arc<str>>) -> Self {
        Self {
            string: string.into(),
            cursor: 0,
        }
    }

    /// The whole input, independent of the cursor.
    pub fn string(&self) -> &str {
        &self.string
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.string.len());
    }

    pub fn total_length(&self) -> usize {
        self.string.len()
    }

    pub fn remaining_length(&self) -> usize {
        self.string.len() - self.cursor
    }

    /// Text already consumed.
    pub fn consumed(&self) -> &str {
        &self.string[..self.cursor]
    }

    /// Text not yet consumed.
    pub fn remaining(&self) -> &str {
        &self.string[self.cursor..]
    }

    pub fn can_read(&self) -> bool {
        self.can_read_length(1)
    }

    pub fn can_read_length(&self, length: usize) -> bool {
        self.cursor + length <= self.string.len()
    }

    /// The character under the cursor.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The character `offset` characters past the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Consumes and returns the character under the cursor.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    /// Advances past one character. Does nothing at end of input.
    pub fn skip(&mut self) {
        self.next_char();
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    pub fn is_allowed_number(c: char) -> bool {
        c.is_ascii_digit() || c == '.' || c == '-'
    }

    pub fn is_quoted_string_start(c: char) -> bool {
        c == SYNTAX_DOUBLE_QUOTE || c == SYNTAX_SINGLE_QUOTE
    }

    pub fn is_allowed_in_unquoted_string(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
    }

    fn read_number_token(&mut self) -> (usize, &str) {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_number) {
            self.skip();
        }
        (start, &self.string[start..self.cursor])
    }

    fn read_number<T: std::str::FromStr>(
        &mut self,
        expected: SyntaxErrorKind,
        invalid: fn(String) -> SyntaxErrorKind,
    ) -> Result<T, CommandSyntaxError> {
        let (start, number) = self.read_number_token();
        if number.is_empty() {
            return Err(CommandSyntaxError::with_context(expected, self));
        }
        match number.parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                let number = number.to_string();
                self.cursor = start;
                Err(CommandSyntaxError::with_context(invalid(number), self))
            }
        }
    }

    pub fn read_int(&mut self) -> Result<i32, CommandSyntaxError> {
        self.read_number(SyntaxErrorKind::ExpectedInt, SyntaxErrorKind::InvalidInt)
    }

    pub fn read_long(&mut self) -> Result<i64, CommandSyntaxError> {
        self.read_number(SyntaxErrorKind::ExpectedLong, SyntaxErrorKind::InvalidLong)
    }

    pub fn read_float(&mut self) -> Result<f32, CommandSyntaxError> {
        self.read_number(
            SyntaxErrorKind::ExpectedFloat,
            SyntaxErrorKind::InvalidFloat,
        )
    }

    pub fn read_double(&mut self) -> Result<f64, CommandSyntaxError> {
        self.read_number(
            SyntaxErrorKind::ExpectedDouble,
            SyntaxErrorKind::InvalidDouble,
        )
    }

    /// Reads the longest run of characters allowed in an unquoted string.
    /// May return an empty string.
    pub fn read_unquoted_string(&mut self) -> String {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_in_unquoted_string) {
            self.skip();
        }
        self.string[start..self.cursor].to_string()
    }

    /// Reads a string wrapped in `"` or `'`. Empty input yields an empty
    /// string.
    pub fn read_quoted_string(&mut self) -> Result<String, CommandSyntaxError> {
        let Some(next) = self.peek() else {
            return Ok(String::new());
        };
        if !Self::is_quoted_string_start(next) {
            return Err(CommandSyntaxError::with_context(
                SyntaxErrorKind::ExpectedStartOfQuote,
                self,
            ));
        }
        self.skip();
        self.read_string_until(next)
    }

    /// Reads up to and including `terminator`, resolving backslash escapes.
    /// Only the terminator and the backslash itself may be escaped.
    pub fn read_string_until(&mut self, terminator: char) -> Result<String, CommandSyntaxError> {
        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.next_char() {
            if escaped {
                if c == terminator || c == SYNTAX_ESCAPE {
                    result.push(c);
                    escaped = false;
                } else {
                    self.cursor -= c.len_utf8();
                    return Err(CommandSyntaxError::with_context(
                        SyntaxErrorKind::InvalidEscape(c),
                        self,
                    ));
                }
            } else if c == SYNTAX_ESCAPE {
                escaped = true;
            } else if c == terminator {
                return Ok(result);
            } else {
                result.push(c);
            }
        }

        Err(CommandSyntaxError::with_context(
            SyntaxErrorKind::ExpectedEndOfQuote,
            self,
        ))
    }

    /// Reads a quoted string if the next character opens one, otherwise an
    /// unquoted string.
    pub fn read_string(&mut self) -> Result<String, CommandSyntaxError> {
        match self.peek() {
            None => Ok(String::new()),
            Some(c) if Self::is_quoted_string_start(c) => {
                self.skip();
                self.read_string_until(c)
            }
            Some(_) => Ok(self.read_unquoted_string()),
        }
    }

    pub fn read_boolean(&mut self) -> Result<bool, CommandSyntaxError> {
        let start = self.cursor;
        let value = self.read_string()?;
        if value.is_empty() {
            return Err(CommandSyntaxError::with_context(
                SyntaxErrorKind::ExpectedBool,
                self,
            ));
        }

        match value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => {
                self.cursor = start;
                Err(CommandSyntaxError::with_context(
                    SyntaxErrorKind::InvalidBool(value),
                    self,
                ))
            }
        }
    }

    /// Consumes `c` or fails without moving.
    pub fn expect(&mut self, c: char) -> Result<(), CommandSyntaxError> {
        if self.peek() != Some(c) {
            return Err(CommandSyntaxError::with_context(
                SyntaxErrorKind::ExpectedSymbol(c),
                self,
            ));
        }
        self.skip();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_int_and_rewind_on_invalid() {
        let mut reader = StringReader::new("-42 1-2");
        assert_eq!(reader.read_int().unwrap(), -42);
        reader.skip();

        let err = reader.read_int().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::InvalidInt("1-2".to_string()));
        assert_eq!(reader.cursor(), 4);
    }

    #[test]
    fn test_read_int_without_digits() {
        let mut reader = StringReader::new("abc");
        let err = reader.read_int().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::ExpectedInt);
        assert_eq!(err.cursor(), Some(0));
    }

    #[test]
    fn test_read_double_accepts_leading_dot() {
        let mut reader = StringReader::new(".5 x");
        assert_eq!(reader.read_double().unwrap(), 0.5);
        assert_eq!(reader.remaining(), " x");
    }

    #[test]
    fn test_read_long_out_of_i32_range() {
        let mut reader = StringReader::new("9000000000");
        assert_eq!(reader.read_long().unwrap(), 9_000_000_000);
    }

    #[test]
    fn test_quoted_string_with_escaped_quote() {
        let mut reader = StringReader::new(r#""hi\"there" rest"#);
        assert_eq!(reader.read_quoted_string().unwrap(), "hi\"there");
        assert_eq!(reader.remaining(), " rest");
    }

    #[test]
    fn test_single_quoted_string_keeps_double_quotes() {
        let mut reader = StringReader::new(r#"'say "hi"'"#);
        assert_eq!(reader.read_string().unwrap(), "say \"hi\"");
    }

    #[test]
    fn test_quoted_string_on_empty_input() {
        let mut reader = StringReader::new("");
        assert_eq!(reader.read_quoted_string().unwrap(), "");
    }

    #[test]
    fn test_quoted_string_requires_opening_quote() {
        let mut reader = StringReader::new("abc");
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::ExpectedStartOfQuote);
    }

    #[test]
    fn test_unclosed_quote() {
        let mut reader = StringReader::new("\"abc");
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::ExpectedEndOfQuote);
    }

    #[test]
    fn test_invalid_escape_points_at_escaped_char() {
        let mut reader = StringReader::new(r#""a\nb""#);
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::InvalidEscape('n'));
        assert_eq!(err.cursor(), Some(3));
    }

    #[test]
    fn test_read_boolean() {
        let mut reader = StringReader::new("true false maybe");
        assert!(reader.read_boolean().unwrap());
        reader.skip();
        assert!(!reader.read_boolean().unwrap());
        reader.skip();

        let err = reader.read_boolean().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::InvalidBool("maybe".to_string()));
        assert_eq!(reader.cursor(), 11);
    }

    #[test]
    fn test_read_boolean_on_empty() {
        let mut reader = StringReader::new("");
        let err = reader.read_boolean().unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::ExpectedBool);
    }

    #[test]
    fn test_unquoted_string_stops_at_disallowed_char() {
        let mut reader = StringReader::new("minecraft:stone");
        assert_eq!(reader.read_unquoted_string(), "minecraft");
        assert_eq!(reader.peek(), Some(':'));
    }

    #[test]
    fn test_expect_symbol() {
        let mut reader = StringReader::new("=x");
        reader.expect('=').unwrap();
        let err = reader.expect('=').unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::ExpectedSymbol('='));
        assert_eq!(reader.cursor(), 1);
    }

    #[test]
    fn test_can_read_length_and_peek_at() {
        let reader = StringReader::new("ab");
        assert!(reader.can_read_length(2));
        assert!(!reader.can_read_length(3));
        assert_eq!(reader.peek_at(1), Some('b'));
        assert_eq!(reader.peek_at(2), None);
    }
}

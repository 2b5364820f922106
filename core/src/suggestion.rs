//! Completion suggestions.
//!
//! A [`SuggestionsBuilder`] is handed to every candidate node while
//! completing. Each node produces a [`Suggestions`] set relative to its own
//! start offset, and the dispatcher merges them into one set spanning the
//! union of their ranges.

use std::collections::HashSet;
use std::fmt;

use crate::range::StringRange;

/// A single replacement for a span of input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    range: StringRange,
    text: String,
    tooltip: Option<String>,
}

impl Suggestion {
    pub fn new(range: StringRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: None,
        }
    }

    pub fn with_tooltip(range: StringRange, text: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: Some(tooltip.into()),
        }
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Replaces this suggestion's range within `input` with its text.
    pub fn apply(&self, input: &str) -> String {
        let start = self.range.start().min(input.len());
        let end = self.range.end().min(input.len());
        let mut out = String::with_capacity(input.len() + self.text.len());
        out.push_str(&input[..start]);
        out.push_str(&self.text);
        out.push_str(&input[end..]);
        out
    }

    /// Widens this suggestion to cover `range`, copying the extra input from
    /// `command` around the text.
    pub fn expand(&self, command: &str, range: StringRange) -> Suggestion {
        if range == self.range {
            return self.clone();
        }
        let mut text = String::new();
        if range.start() < self.range.start() {
            text.push_str(StringRange::new(range.start(), self.range.start()).get(command));
        }
        text.push_str(&self.text);
        if range.end() > self.range.end() {
            text.push_str(StringRange::new(self.range.end(), range.end()).get(command));
        }
        Suggestion {
            range,
            text,
            tooltip: self.tooltip.clone(),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A sorted, de-duplicated set of suggestions sharing one range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestions {
    range: StringRange,
    list: Vec<Suggestion>,
}

impl Suggestions {
    pub fn new(range: StringRange, list: Vec<Suggestion>) -> Self {
        Self { range, list }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn list(&self) -> &[Suggestion] {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Texts in order, mostly for display and assertions.
    pub fn texts(&self) -> Vec<&str> {
        self.list.iter().map(Suggestion::text).collect()
    }

    /// Merges sets produced for different spans of `command`.
    pub fn merge(command: &str, inputs: Vec<Suggestions>) -> Suggestions {
        let mut inputs: Vec<Suggestions> = inputs.into_iter().filter(|s| !s.is_empty()).collect();
        match inputs.len() {
            0 => Suggestions::empty(),
            1 => inputs.remove(0),
            _ => {
                let texts = inputs.into_iter().flat_map(|s| s.list).collect();
                Suggestions::create(command, texts)
            }
        }
    }

    /// Builds a set from suggestions with possibly different ranges,
    /// expanding each to the union range, de-duplicating and sorting
    /// case-insensitively.
    pub fn create(command: &str, suggestions: Vec<Suggestion>) -> Suggestions {
        let Some(first) = suggestions.first() else {
            return Suggestions::empty();
        };
        let range = suggestions
            .iter()
            .fold(first.range(), |acc, s| StringRange::encompassing(acc, s.range()));

        let mut seen = HashSet::new();
        let mut list: Vec<Suggestion> = suggestions
            .iter()
            .map(|s| s.expand(command, range))
            .filter(|s| seen.insert(s.clone()))
            .collect();
        list.sort_by(|a, b| {
            a.text
                .to_lowercase()
                .cmp(&b.text.to_lowercase())
                .then_with(|| a.text.cmp(&b.text))
        });
        Suggestions { range, list }
    }
}

/// Collects suggestions for the input from `start` onward.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    start: usize,
    remaining: String,
    remaining_lowercase: String,
    result: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        let input = input.into();
        let start = start.min(input.len());
        let remaining = input.get(start..).unwrap_or("").to_string();
        // Lowercasing can change byte lengths, so only the tail is lowered.
        let remaining_lowercase = remaining.to_lowercase();
        Self {
            input,
            start,
            remaining,
            remaining_lowercase,
            result: Vec::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    pub fn remaining_lowercase(&self) -> &str {
        &self.remaining_lowercase
    }

    fn range(&self) -> StringRange {
        StringRange::new(self.start, self.input.len())
    }

    /// Adds `text` unless it equals what the user already typed.
    pub fn suggest(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining {
            self.result.push(Suggestion::new(self.range(), text));
        }
        self
    }

    pub fn suggest_with_tooltip(&mut self, text: impl Into<String>, tooltip: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining {
            self.result
                .push(Suggestion::with_tooltip(self.range(), text, tooltip));
        }
        self
    }

    pub fn suggest_integer(&mut self, value: i32) -> &mut Self {
        self.suggest(value.to_string())
    }

    /// Takes over everything `other` collected.
    pub fn add(&mut self, other: SuggestionsBuilder) -> &mut Self {
        self.result.extend(other.result);
        self
    }

    /// A fresh builder over the same input starting at `start`.
    pub fn create_offset(&self, start: usize) -> SuggestionsBuilder {
        Self::new(self.input.clone(), start)
    }

    /// A fresh builder over the same input and start.
    pub fn restart(&self) -> SuggestionsBuilder {
        self.create_offset(self.start)
    }

    pub fn build(&self) -> Suggestions {
        Suggestions::create(&self.input, self.result.clone())
    }
}

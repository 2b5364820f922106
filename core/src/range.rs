use std::fmt;

/// A half-open `[start, end)` span of input, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StringRange {
    start: usize,
    end: usize,
}

impl StringRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty range at `pos`.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// The smallest range covering both `a` and `b`.
    pub fn encompassing(a: StringRange, b: StringRange) -> Self {
        Self::new(a.start.min(b.start), a.end.max(b.end))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The slice of `input` covered by this range, clamped to its length.
    pub fn get<'a>(&self, input: &'a str) -> &'a str {
        let end = self.end.min(input.len());
        input.get(self.start.min(end)..end).unwrap_or("")
    }
}

impl fmt::Display for StringRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Byte range of a token in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lexical unit of bracketed tree text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeToken<'a> {
    Open,
    Close,
    /// A label or a word.
    Atom(&'a str),
}

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A word as it appears in a dependency: surface form plus sentence index.
/// Index 0 is reserved for the synthetic ROOT word.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct IndexedWord {
    pub index: u32,
    pub word: String,
    pub tag: Option<String>,
    /// Distinguishes copies of one word introduced by collapsing.
    pub copy_count: u32,
}

impl IndexedWord {
    pub fn new(index: u32, word: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            index,
            word: word.into(),
            tag,
            copy_count: 0,
        }
    }

    pub fn root() -> Self {
        Self::new(0, "ROOT", None)
    }

    pub fn is_root(&self) -> bool {
        self.index == 0
    }

    pub fn with_copy(mut self, copy_count: u32) -> Self {
        self.copy_count = copy_count;
        self
    }

    /// One `'` per copy.
    pub fn primes(&self) -> String {
        let mut s = String::new();
        for _ in 0..self.copy_count {
            s.push('\'');
        }
        s
    }
}

// Identity is position plus copy; the surface form and tag ride along.
impl PartialEq for IndexedWord {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.copy_count == other.copy_count
    }
}

impl Eq for IndexedWord {}

impl core::hash::Hash for IndexedWord {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.copy_count.hash(state);
    }
}

impl PartialOrd for IndexedWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexedWord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then(self.copy_count.cmp(&other.copy_count))
    }
}

impl fmt::Display for IndexedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.word, self.index, self.primes())
    }
}

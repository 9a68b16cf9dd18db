use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Language tag of a relation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum Language {
    Any,
    English,
    Chinese,
    UniversalEnglish,
    UniversalChinese,
    Unknown,
}

impl Language {
    /// `Any` is compatible with every language.
    pub fn compatible_with(self, other: Language) -> bool {
        self == other || self == Language::Any || other == Language::Any
    }

    /// Separator between a relation's short name and its specific part.
    pub fn specific_separator(self) -> char {
        match self {
            Language::English | Language::Chinese => '_',
            _ => ':',
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Any => "Any",
            Language::English => "English",
            Language::Chinese => "Chinese",
            Language::UniversalEnglish => "UniversalEnglish",
            Language::UniversalChinese => "UniversalChinese",
            Language::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

use rkyv::{Archive, Deserialize, Serialize};
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Scan policy of one head rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
#[repr(u8)]
pub enum Mode {
    Left = 0,        // category priority, scan left to right
    Right = 1,       // category priority, scan right to left
    LeftDis = 2,     // position priority, scan left to right
    RightDis = 3,    // position priority, scan right to left
    LeftExcept = 4,  // first child outside the set
    RightExcept = 5, // last child outside the set
}

impl Mode {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "left" => Some(Mode::Left),
            "right" => Some(Mode::Right),
            "leftdis" => Some(Mode::LeftDis),
            "rightdis" => Some(Mode::RightDis),
            "leftexcept" => Some(Mode::LeftExcept),
            "rightexcept" => Some(Mode::RightExcept),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Mode::Left => "left",
            Mode::Right => "right",
            Mode::LeftDis => "leftdis",
            Mode::RightDis => "rightdis",
            Mode::LeftExcept => "leftexcept",
            Mode::RightExcept => "rightexcept",
        }
    }

    /// True for the three `left*` modes.
    pub fn is_leftward(self) -> bool {
        matches!(self, Mode::Left | Mode::LeftDis | Mode::LeftExcept)
    }
}

/// A rule group as stored in config files: the direction is kept as its
/// textual tag and validated when the table is built.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct RuleSpec {
    pub direction: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct CategoryRules {
    pub category: String,
    pub rules: Vec<RuleSpec>,
}

/// Head rules for one language or annotation style.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct RuleSet {
    pub version: u32,
    pub name: String,
    pub rules: Vec<CategoryRules>,
    /// Applied to categories with no entry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_rule: Option<RuleSpec>,
    /// Categories the derived default left/right rules skip over.
    #[cfg_attr(feature = "serde", serde(default))]
    pub avoid: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tags_round_trip() {
        for mode in [
            Mode::Left,
            Mode::Right,
            Mode::LeftDis,
            Mode::RightDis,
            Mode::LeftExcept,
            Mode::RightExcept,
        ] {
            assert_eq!(Mode::from_tag(mode.tag()), Some(mode));
        }
        assert_eq!(Mode::from_tag("up"), None);
        assert!(Mode::LeftExcept.is_leftward());
        assert!(!Mode::RightDis.is_leftward());
    }
}

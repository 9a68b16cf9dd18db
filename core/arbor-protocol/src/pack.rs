use alloc::string::{String, ToString};
use alloc::vec::Vec;

const PENN_ANNOTATION_CHARS: [char; 7] = ['-', '=', '|', '#', '^', '~', '_'];

const PENN_PUNCTUATION_TAGS: [&str; 7] = ["''", "``", "-LRB-", "-RRB-", ".", ":", ","];

const PENN_PUNCTUATION_WORDS: [&str; 17] = [
    "''", "'", "``", "`", "-LRB-", "-RRB-", "-LCB-", "-RCB-", ".", "?", "!", ",", ":", "-", "--",
    "...", ";",
];

/// Treebank conventions for one annotation scheme: how category labels
/// carry functional suffixes, and which words and tags count as punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreebankPack {
    annotation_chars: Vec<char>,
    punctuation_words: Vec<String>,
    punctuation_tags: Vec<String>,
}

impl TreebankPack {
    pub fn new(
        annotation_chars: Vec<char>,
        punctuation_words: Vec<String>,
        punctuation_tags: Vec<String>,
    ) -> Self {
        Self {
            annotation_chars,
            punctuation_words,
            punctuation_tags,
        }
    }

    /// Penn Treebank conventions.
    pub fn penn() -> Self {
        Self::new(
            PENN_ANNOTATION_CHARS.to_vec(),
            PENN_PUNCTUATION_WORDS.iter().map(|s| s.to_string()).collect(),
            PENN_PUNCTUATION_TAGS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Strips functional and co-indexation suffixes: `NP-TMP=2` becomes `NP`.
    ///
    /// A label that starts with an annotation character is never cut at
    /// position 0, and a second occurrence of that same character is skipped
    /// too, so `-LRB-` and `-NONE-` come back unchanged.
    pub fn basic_category<'a>(&self, category: &'a str) -> &'a str {
        let mut seen_at_zero: Option<char> = None;
        for (i, ch) in category.char_indices() {
            if !self.annotation_chars.contains(&ch) {
                continue;
            }
            if i == 0 {
                seen_at_zero = Some(ch);
            } else if i > 1 && seen_at_zero == Some(ch) {
                seen_at_zero = None;
            } else {
                return &category[..i];
            }
        }
        category
    }

    pub fn is_punctuation_word(&self, word: &str) -> bool {
        self.punctuation_words.iter().any(|p| p == word)
    }

    pub fn is_punctuation_tag(&self, tag: &str) -> bool {
        self.punctuation_tags.iter().any(|p| p == tag)
    }

    /// Accept filter over words: false for punctuation.
    pub fn punctuation_word_accept(&self, word: &str) -> bool {
        !self.is_punctuation_word(word)
    }

    /// Accept filter over tags: false for punctuation tags.
    pub fn punctuation_tag_accept(&self, tag: &str) -> bool {
        !self.is_punctuation_tag(tag)
    }

    pub fn punctuation_tags(&self) -> &[String] {
        &self.punctuation_tags
    }
}

impl Default for TreebankPack {
    fn default() -> Self {
        Self::penn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_category_strips_suffixes() {
        let pack = TreebankPack::penn();
        assert_eq!(pack.basic_category("NP-TMP"), "NP");
        assert_eq!(pack.basic_category("NP-SBJ=2"), "NP");
        assert_eq!(pack.basic_category("S"), "S");
        assert_eq!(pack.basic_category("PP|LOC"), "PP");
    }

    #[test]
    fn test_basic_category_keeps_bracket_tokens() {
        let pack = TreebankPack::penn();
        assert_eq!(pack.basic_category("-LRB-"), "-LRB-");
        assert_eq!(pack.basic_category("-NONE-"), "-NONE-");
        assert_eq!(pack.basic_category("-"), "-");
        // an immediately repeated leading character is an ordinary cut point
        assert_eq!(pack.basic_category("--"), "-");
        assert_eq!(pack.basic_category("-X-Y-Z"), "-X-Y");
    }

    #[test]
    fn test_punctuation() {
        let pack = TreebankPack::penn();
        assert!(pack.is_punctuation_word("."));
        assert!(!pack.punctuation_word_accept(","));
        assert!(pack.punctuation_word_accept("dog"));
        assert!(pack.is_punctuation_tag("-LRB-"));
        assert!(!pack.is_punctuation_tag("NN"));
    }

    proptest! {
        #[test]
        fn test_basic_category_idempotent(label in "[A-Z]{1,4}([-=][A-Z0-9]{1,3}){0,2}") {
            let pack = TreebankPack::penn();
            let once = pack.basic_category(&label);
            prop_assert_eq!(pack.basic_category(once), once);
        }
    }
}

#![no_std] // Shared with the WASM platform

extern crate alloc;

// Enable std if the feature is active (for tests/tools)
#[cfg(any(feature = "std", test))]
extern crate std;

pub mod ids;
pub mod language;
pub mod pack;
pub mod rules;
pub mod tree;
pub mod word;

// Re-export core types for convenience
pub use ids::{NodeId, SentenceId};
pub use language::Language;
pub use pack::TreebankPack;
pub use rules::{CategoryRules, Mode, RuleSet, RuleSpec};
pub use tree::{Tree, TreeNode};
pub use word::IndexedWord;

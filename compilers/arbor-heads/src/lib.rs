//! Head finding over constituency trees: a rule table, a selector that
//! walks it, and a percolator that annotates every node with its head word.

pub mod english;
pub mod error;
pub mod percolate;
pub mod selector;
pub mod table;

pub use error::HeadError;
pub use percolate::{percolate, HeadAnnotations};
pub use selector::{CoordinationFix, HeadHooks, HeadSelector, NoHooks};
pub use table::{RuleGroup, RuleTable};

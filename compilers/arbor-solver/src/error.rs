use arbor_heads::HeadError;
use arbor_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("relation `{relation}` has a bad source pattern `{pattern}`: {reason}")]
    BadSourcePattern {
        relation: String,
        pattern: String,
        reason: String,
    },

    #[error("relation `{relation}` has target pattern `{pattern}` with no `=target` node")]
    MissingTarget { relation: String, pattern: String },

    #[error("relation `{relation}` names unknown parent `{parent}`")]
    UnknownParent { relation: String, parent: String },

    #[error("relation `{0}` is defined twice")]
    DuplicateRelation(String),

    #[error("line {line}: unknown grammatical relation `{name}`")]
    UnknownRelation { name: String, line: usize },

    #[error("{tokens} tokens but {tags} tags")]
    TokenTagMismatch { tokens: usize, tags: usize },

    #[error(transparent)]
    Head(#[from] HeadError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

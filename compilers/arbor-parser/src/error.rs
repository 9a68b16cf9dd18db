use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed dependency `{0}`")]
    MalformedDependency(String),

    #[error("malformed tree at byte {position}: {reason}")]
    MalformedTree { position: usize, reason: String },

    #[error("line {line}: 10 fields expected but {found} are present")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} `{value}`")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("bad pattern `{pattern}`: {reason}")]
    BadPattern { pattern: String, reason: String },
}

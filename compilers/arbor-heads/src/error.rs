use thiserror::Error;

/// Failures of head selection. All are fatal for the tree being processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadError {
    #[error("can't determine the head of leaf node `{label}`")]
    InvalidTree { label: String },

    #[error("no head rule defined for category `{category}`")]
    NoHeadRule { category: String },

    #[error("invalid head rule direction `{0}`")]
    InvalidRuleDirection(String),

    #[error("head rule table used before it was populated")]
    UninitializedRuleTable,
}

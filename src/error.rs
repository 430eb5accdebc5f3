use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagRuleError {
    #[error("matcher compare must be 'equal' or 'like': {0}")]
    InvalidCompare(String),

    #[error("matcher inverse must be 'true' or 'false': {0}")]
    InvalidInverse(String),

    #[error("invalid selection pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TagRuleError>;

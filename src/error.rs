
use thiserror::Error;

use crate::rule::RuleId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("{0} is not a recognized column name")]
    UnknownColumn(String),
    #[error("The following keywords were not recognized: {}", .0.join(", "))]
    UnknownKey(Vec<String>),
    #[error("Invalid value for {key}: {message}")]
    MalformedValue { key: String, message: String },
    #[error("Expected numeric value for these keywords but did not get a number: {}", pairs(.0))]
    NotNumeric(Vec<(String, String)>),
    #[error("A rule that results in an identical selection has already been added. ID: {id}, TAG: {tag}")]
    DuplicateRule { id: RuleId, tag: String },
    #[error("Bad arguments: {0}")]
    BadArguments(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl SelectionError {
    pub(crate) fn malformed(key: &str, message: impl Into<String>) -> Self {
        Self::MalformedValue { key: key.to_string(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, SelectionError>;

fn pairs(offenders: &[(String, String)]) -> String {
    offenders
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// Helper conversions
impl From<config::ConfigError> for SelectionError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Malformed line {line:?}: {reason}")]
    MalformedLine { line: String, reason: String },

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Factory {id} out of range (board has {count} factories)")]
    FactoryOutOfRange { id: i64, count: usize },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unexpected end of input")]
    EndOfInput,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl PlannerError {
    pub fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config value for {key}: {reason}")]
    Config { key: String, reason: String },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Artifact error in {path}: {reason}")]
    Artifact { path: String, reason: String },
}

impl DigestError {
    pub fn artifact(path: &std::path::Path, reason: impl ToString) -> Self {
        DigestError::Artifact {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        DigestError::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

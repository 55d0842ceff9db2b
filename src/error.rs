use std::path::PathBuf;

/// Errors raised by the browser automation layer.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("interaction with {selector} failed: {reason}")]
    Interaction { selector: String, reason: String },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("game has not been started")]
    NotStarted,
}

/// Errors raised by the environment adapter.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("step called before reset")]
    NotReset,

    #[error("action ({row}, {col}) outside {height}x{width} board")]
    ActionOutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no checkpoint matching '{prefix}' in {dir}")]
    NotFound { dir: PathBuf, prefix: String },

    #[error("failed to read progress file {path}: {source}")]
    ProgressRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse progress file {path}: {source}")]
    ProgressParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("environment error: {0}")]
    Env(#[from] EnvError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Please select or enter a topic")]
    EmptyTopic,

    #[error("Generation already in progress")]
    Busy,

    #[error("{0}")]
    Agent(#[from] agent::Error),

    #[error("Provider still unavailable after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: agent::Error,
    },

    #[error("Failed to save content to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} not found. Check your .env file.")]
    MissingApiKey(String),
}

/// Failures surfaced by the command line entry points.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Agent(#[from] agent::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid topic number: {0}")]
    InvalidChoice(usize),

    #[error("{0}")]
    Server(String),

    #[error("{0} setup check(s) failed")]
    Check(usize),
}

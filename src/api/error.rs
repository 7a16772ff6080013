use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{flag} must be between {min} and {max}, got {value}")]
    AgeOutOfRange {
        flag: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("{flag} must be >= 0")]
    Negative { flag: &'static str },
    #[error("{flag} must be a finite number")]
    NotFinite { flag: &'static str },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

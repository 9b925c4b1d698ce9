use std::path::PathBuf;

use callable_core::RegionSetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CallableError>;

#[derive(Debug, Error)]
pub enum CallableError {
    #[error("coverage classifier failed: {command} (exit: {code:?}) stderr: {stderr}")]
    ClassifierInvocation {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("required command not found in PATH: {command}")]
    CommandNotFound { command: String },
    #[error("step finished without writing its output: {0}")]
    MissingOutput(PathBuf),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("failed to initialize worker pool: {0}")]
    WorkerPool(String),
    #[error(transparent)]
    RegionSet(#[from] RegionSetError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

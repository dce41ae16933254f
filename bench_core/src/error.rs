use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BenchError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("power map is empty")]
    EmptyPowerMap,
    #[error("no ride profiles configured")]
    MissingProfiles,
    #[error("{table} index {index} is outside the power map")]
    IndexOutOfRange { table: &'static str, index: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

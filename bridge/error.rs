use flexi_logger::FlexiLoggerError;
use std::io::Error as IoError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use zbus::Error as ZbusError;

#[derive(Error, Debug)]
pub enum App {
    #[error("I/O operation failed: {0}")]
    Io(#[from] IoError),
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerializing(#[from] toml::ser::Error),
    #[error("Payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Data parsing error: {0}")]
    DataParsing(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Environment variable error")]
    EnvVar(#[from] std::env::VarError),
    #[error("Logger initialization error: {0}")]
    Logger(#[from] FlexiLoggerError),
    #[error("Zbus error: {0}")]
    Zbus(#[from] ZbusError),
    #[error("Join task error: {0}")]
    JoinTask(#[from] tokio::task::JoinError),
    #[error("Channel send error: {0}")]
    Send(String),
    #[error("Unknown playback state: {0}")]
    UnknownState(String),
    #[error("Unknown collection type: {0}")]
    UnknownCollectionType(String),
    #[error("Expected signal {expected}, received {received}")]
    UnexpectedSignal {
        expected: &'static str,
        received: String,
    },
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Signal bridge closed")]
    Closed,
    #[error("No response within {0:?}")]
    Timeout(std::time::Duration),
}

impl<T> From<SendError<T>> for App {
    fn from(error: SendError<T>) -> Self {
        App::Send(error.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for App {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        App::Closed
    }
}

//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Signal error: {0}")]
    Signal(#[from] signal_client::SignalError),

    #[error("Settings error: {0}")]
    Settings(#[from] settings_store::SettingsError),

    #[error("Registry error: {0}")]
    Registry(#[from] command_engine::RegistryError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

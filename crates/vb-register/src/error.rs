//! Registration failures and the text players see for each of them.

use thiserror::Error;

use crate::config::ConfigError;

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred while trying to register.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Received an unexpected response from the server.";
pub const MISSING_NICKNAME_MESSAGE: &str = "A nickname is required to register.";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("registration API transport failed: {message}")]
    Transport { message: String },

    #[error("registration API timed out: {message}")]
    Timeout { message: String },

    /// Any status other than 200. `message` is the server-provided `message`
    /// field, when the body had one.
    #[error("registration API returned status {status}")]
    Protocol {
        status: u16,
        message: Option<String>,
        body_present: bool,
    },

    #[error("registration API response could not be parsed: {message}")]
    Parse { message: String },

    #[error("nickname is empty")]
    InvalidNickname,
}

/// Why the plugin could not bring its registration worker up.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("could not build registration client: {0}")]
    Client(#[from] ConfigError),

    #[error("could not start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl RegistrationError {
    /// Whether this failure is our side's problem rather than something the
    /// remote service told us.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// Human-readable text for the player.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => INTERNAL_ERROR_MESSAGE.into(),
            Self::Protocol {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Protocol {
                message: None,
                body_present: false,
                ..
            } => UNKNOWN_ERROR_MESSAGE.into(),
            Self::Protocol { .. } | Self::Parse { .. } => UNEXPECTED_RESPONSE_MESSAGE.into(),
            Self::InvalidNickname => MISSING_NICKNAME_MESSAGE.into(),
        }
    }
}

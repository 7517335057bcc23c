//! Reqwest-backed client for the registration-link API.
//!
//! One POST per call. Every failure is folded into
//! [`RegistrationResult::Failure`]; the typed error stays available through
//! [`RegistrationLinkClient::try_request_registration_link`].

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, error, warn};

use crate::config::{ConfigError, RegisterConfig};
use crate::dto::{RegistrationRequest, RegistrationResponseBody};
use crate::error::{RegistrationError, INTERNAL_ERROR_MESSAGE};

const REQUEST_CONTENT_TYPE: &str = "application/json; utf-8";
const RESPONSE_ACCEPT: &str = "application/json";

/// Outcome of one registration request, ready to be shown to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationResult {
    Success { link: String },
    /// `internal` marks failures on our side (transport, timeout, worker
    /// unavailable), as opposed to anything the remote service reported.
    Failure { message: String, internal: bool },
}

impl RegistrationResult {
    pub fn internal_error() -> Self {
        Self::Failure {
            message: INTERNAL_ERROR_MESSAGE.into(),
            internal: true,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Success { link } => Some(link),
            Self::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }
}

impl From<Result<String, RegistrationError>> for RegistrationResult {
    fn from(result: Result<String, RegistrationError>) -> Self {
        match result {
            Ok(link) => Self::Success { link },
            Err(err) => Self::Failure {
                message: err.user_message(),
                internal: err.is_internal(),
            },
        }
    }
}

/// Client bound to a single endpoint. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct RegistrationLinkClient {
    client: Client,
    endpoint: Url,
}

impl RegistrationLinkClient {
    /// Build a client from plugin config, applying its connect and request
    /// timeouts.
    pub fn new(config: &RegisterConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request a registration link for `nickname`. Never fails: errors are
    /// logged and turned into a player-facing message.
    pub async fn request_registration_link(&self, nickname: &str) -> RegistrationResult {
        let result = self.try_request_registration_link(nickname).await;
        match &result {
            Ok(_) => debug!("Issued registration link for {nickname}"),
            Err(err) => log_failure(nickname, err),
        }
        result.into()
    }

    pub async fn try_request_registration_link(
        &self,
        nickname: &str,
    ) -> Result<String, RegistrationError> {
        if nickname.trim().is_empty() {
            return Err(RegistrationError::InvalidNickname);
        }
        let body = serde_json::to_vec(&RegistrationRequest { nickname }).map_err(|e| {
            RegistrationError::Transport {
                message: format!("could not encode request body: {e}"),
            }
        })?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .header(ACCEPT, RESPONSE_ACCEPT)
            .body(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status != StatusCode::OK {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_link(body.as_ref())
    }
}

fn log_failure(nickname: &str, err: &RegistrationError) {
    match err {
        RegistrationError::Transport { .. } | RegistrationError::Timeout { .. } => {
            error!("Could not connect to the registration API for {nickname}: {err}")
        }
        RegistrationError::Protocol {
            status, message, ..
        } => warn!(
            "Registration API rejected {nickname} with status {status}: {}",
            message.as_deref().unwrap_or("<no message>")
        ),
        RegistrationError::Parse { .. } => {
            warn!("Failed to parse registration API response for {nickname}: {err}")
        }
        RegistrationError::InvalidNickname => warn!("Refusing to register an empty nickname"),
    }
}

fn parse_link(body: &[u8]) -> Result<String, RegistrationError> {
    let decoded: RegistrationResponseBody =
        serde_json::from_slice(body).map_err(|e| RegistrationError::Parse {
            message: format!("invalid JSON ({e}); raw response: {}", body_preview(body)),
        })?;
    decoded.link().ok_or_else(|| RegistrationError::Parse {
        message: format!("missing registrationLink; raw response: {}", body_preview(body)),
    })
}

fn map_transport_error(err: reqwest::Error) -> RegistrationError {
    if err.is_timeout() {
        RegistrationError::Timeout {
            message: err.to_string(),
        }
    } else {
        RegistrationError::Transport {
            message: err.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RegistrationError {
    let body_present = !String::from_utf8_lossy(body).trim().is_empty();
    let message = if body_present {
        serde_json::from_slice::<RegistrationResponseBody>(body)
            .ok()
            .and_then(|decoded| decoded.message)
            .filter(|message| !message.is_empty())
    } else {
        None
    };
    if body_present && message.is_none() {
        warn!(
            "Failed to parse error message from registration API. Raw response: {}",
            body_preview(body)
        );
    }
    RegistrationError::Protocol {
        status: status.as_u16(),
        message,
        body_present,
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

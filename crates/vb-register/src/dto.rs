//! Wire shapes for the registration API.
//!
//! Bodies are always produced and read through `serde_json`, so nicknames are
//! escaped correctly and responses decode regardless of field order.

use serde::{Deserialize, Serialize};

/// Request body: `{"nickname": "..."}`.
#[derive(Debug, Serialize)]
pub(crate) struct RegistrationRequest<'a> {
    pub(crate) nickname: &'a str,
}

/// Union of the success and error response bodies. Both fields are optional
/// so one type serves every status code.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RegistrationResponseBody {
    #[serde(rename = "registrationLink")]
    pub(crate) registration_link: Option<String>,
    pub(crate) message: Option<String>,
}

impl RegistrationResponseBody {
    pub(crate) fn link(self) -> Option<String> {
        self.registration_link.filter(|link| !link.is_empty())
    }
}

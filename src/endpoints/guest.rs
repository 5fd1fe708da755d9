//! Guest user endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::UserPayload;
use crate::api::{Endpoint, HttpMethod};
use crate::error::Result;

/// Guest user to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Custom fields
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

impl GuestUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra_data: Map::new(),
        }
    }

    /// Builder pattern: display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Response of [`guest_token`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestTokenPayload {
    pub access_token: String,
    pub user: UserPayload,
}

/// `POST guest`. Issues the token, so it is sent without one.
pub fn guest_token(user: &GuestUser) -> Result<Endpoint<GuestTokenPayload>> {
    #[derive(Serialize)]
    struct Wrapper<'a> {
        user: &'a GuestUser,
    }

    Endpoint::new("guest", HttpMethod::Post)
        .requires_token(false)
        .json_body(&Wrapper { user })
}

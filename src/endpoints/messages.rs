//! Message endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ChannelId, UserPayload};
use crate::api::{Endpoint, HttpMethod};
use crate::error::Result;

/// A new message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    /// Thread the message replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_in_channel: bool,
    /// Custom fields
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

impl MessageRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder pattern: reply in a thread
    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder pattern: set a custom field
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_data.insert(key.into(), value);
        self
    }
}

/// A message as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    /// Custom fields
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

/// Response of [`send_message`] and [`delete_message`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponsePayload {
    pub message: MessagePayload,
}

/// `POST channels/{type}/{id}/message`
pub fn send_message(
    cid: &ChannelId,
    message: &MessageRequest,
) -> Result<Endpoint<MessageResponsePayload>> {
    #[derive(Serialize)]
    struct Wrapper<'a> {
        message: &'a MessageRequest,
    }

    Endpoint::new(format!("{}/message", cid.path()), HttpMethod::Post)
        .json_body(&Wrapper { message })
}

/// `DELETE messages/{id}`; `hard` removes the message for good
pub fn delete_message(message_id: &str, hard: bool) -> Endpoint<MessageResponsePayload> {
    let endpoint = Endpoint::new(
        format!("messages/{}", super::path_segment(message_id)),
        HttpMethod::Delete,
    );
    if hard {
        endpoint.query_item("hard", "true")
    } else {
        endpoint
    }
}

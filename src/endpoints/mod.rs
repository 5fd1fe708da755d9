//! Catalogue of chat API endpoints and their payloads.
//!
//! Every function here only builds an [`Endpoint`](crate::api::Endpoint);
//! execute it with [`ApiClient::request`](crate::api::ApiClient::request).

mod channels;
mod guest;
mod messages;

pub use channels::{
    channels, ChannelDetailPayload, ChannelId, ChannelListPayload, ChannelListQuery,
    ChannelPayload, MemberPayload, SortOption,
};
pub use guest::{guest_token, GuestTokenPayload, GuestUser};
pub use messages::{
    delete_message, send_message, MessagePayload, MessageRequest, MessageResponsePayload,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub online: bool,
    /// Custom fields
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

/// Escape a value used as a single path segment
pub(crate) fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

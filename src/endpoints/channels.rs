//! Channel list endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::UserPayload;
use crate::api::{Endpoint, HttpMethod};
use crate::error::{ClientError, Result};

/// Channel identifier, `type:id` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId {
    pub kind: String,
    pub id: String,
}

impl ChannelId {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Path of the channel, relative to the API root
    pub(crate) fn path(&self) -> String {
        format!(
            "channels/{}/{}",
            super::path_segment(&self.kind),
            super::path_segment(&self.id)
        )
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ChannelId {
    type Err = ClientError;

    fn from_str(cid: &str) -> Result<Self> {
        match cid.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(ClientError::invalid_json(format!(
                "Invalid channel id '{}', expected 'type:id'",
                cid
            ))),
        }
    }
}

impl Serialize for ChannelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let cid = String::deserialize(deserializer)?;
        cid.parse().map_err(serde::de::Error::custom)
    }
}

/// Sort order on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    /// `1` ascending, `-1` descending
    pub direction: i8,
}

impl SortOption {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: 1,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: -1,
        }
    }
}

/// Query for a page of channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelListQuery {
    #[serde(rename = "filter_conditions")]
    pub filter: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u32>,
    /// Subscribe to updates of the returned channels
    #[serde(default)]
    pub watch: bool,
    /// Return the channel state
    #[serde(default)]
    pub state: bool,
    /// Subscribe to presence changes of the members
    #[serde(default)]
    pub presence: bool,
}

impl ChannelListQuery {
    pub fn new(filter: Value) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            limit: None,
            offset: None,
            message_limit: None,
            watch: false,
            state: false,
            presence: false,
        }
    }

    /// Builder pattern: add a sort field
    pub fn sort(mut self, option: SortOption) -> Self {
        self.sort.push(option);
        self
    }

    /// Builder pattern: page size and offset
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Builder pattern: messages returned per channel
    pub fn message_limit(mut self, limit: u32) -> Self {
        self.message_limit = Some(limit);
        self
    }

    /// Builder pattern: subscribe to channel updates
    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    /// Builder pattern: return the channel state
    pub fn state(mut self, enabled: bool) -> Self {
        self.state = enabled;
        self
    }

    /// Builder pattern: subscribe to presence changes
    pub fn presence(mut self, enabled: bool) -> Self {
        self.presence = enabled;
        self
    }

    /// The server ties subscriptions to the realtime connection
    pub fn needs_connection(&self) -> bool {
        self.watch || self.state || self.presence
    }
}

/// Channel member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPayload {
    pub user: UserPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Channel attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDetailPayload {
    pub cid: ChannelId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Custom fields
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

/// One channel of a channel list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub channel: ChannelDetailPayload,
    #[serde(default)]
    pub watcher_count: u32,
    #[serde(default)]
    pub members: Vec<MemberPayload>,
}

/// Response of [`channels`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelListPayload {
    pub channels: Vec<ChannelPayload>,
}

/// `GET channels`, the query travels as the `payload` query item
pub fn channels(query: &ChannelListQuery) -> Result<Endpoint<ChannelListPayload>> {
    #[derive(Serialize)]
    struct Wrapper<'a> {
        payload: &'a ChannelListQuery,
    }

    Endpoint::new("channels", HttpMethod::Get)
        .requires_connection_id(query.needs_connection())
        .json_body(&Wrapper { payload: query })
}

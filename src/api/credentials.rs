//! API key and user token.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key identifying the calling application. Never empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ClientError::config("API key must not be empty"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.0).finish()
    }
}

/// Authorization credential of the current user
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    raw_value: String,
    anonymous: bool,
}

impl Token {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            anonymous: false,
        }
    }

    /// Token of an anonymous session; requests go out with anonymous auth
    pub fn anonymous() -> Self {
        Self {
            raw_value: String::new(),
            anonymous: true,
        }
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous || self.raw_value.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep credentials out of logs
        f.debug_struct("Token")
            .field("anonymous", &self.is_anonymous())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_blank() {
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("   ").is_err());
        assert_eq!(ApiKey::new("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_api_key_deserialization_is_validated() {
        assert!(serde_json::from_str::<ApiKey>(r#""""#).is_err());
        let key: ApiKey = serde_json::from_str(r#""abc123""#).unwrap();
        assert_eq!(key.as_str(), "abc123");
    }

    #[test]
    fn test_token_debug_hides_value() {
        let token = Token::new("secret-jwt");
        assert!(!format!("{:?}", token).contains("secret-jwt"));
        assert!(!token.is_anonymous());
        assert!(Token::anonymous().is_anonymous());
    }
}

//! API credentials as issued by the bank and their parsed, signing-ready form.
//!
//! The bank hands out a key id (UUID text) and a key secret (standard base64). Both
//! are parsed exactly once into an [`ApiKey`], which is what every sign and verify
//! operation takes. The decoded secret never shows up in `Debug`, `Display` or any
//! error message.

use crate::{CorpBankError, TokenError};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq)] // Intentionally no Debug so the secret is not printed
pub struct Credentials {
    pub api_key_id: String,
    pub api_key_secret: String,
}

impl Credentials {
    pub fn new(api_key_id: impl Into<String>, api_key_secret: impl Into<String>) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            api_key_secret: api_key_secret.into(),
        }
    }

    pub fn parse(&self) -> Result<ApiKey, CorpBankError> {
        let id = Uuid::parse_str(self.api_key_id.trim()).map_err(|e| {
            TokenError::malformed_credentials(&format!(
                "unable to parse API key ID `{}`: {e}",
                self.api_key_id
            ))
        })?;

        let secret = STANDARD
            .decode(self.api_key_secret.trim())
            .map_err(|e| {
                TokenError::malformed_credentials(&format!("unable to parse API secret: {e}"))
            })?;

        Ok(ApiKey::new(id, secret))
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "API_KEY_ID: {}, API_KEY_SECRET: ****", self.api_key_id)
    }
}

/// Decoded key secret. Holds raw bytes and never prints them.
#[derive(Clone, Eq, PartialEq)]
pub struct ApiKeySecret(Vec<u8>);

impl ApiKeySecret {
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ApiKeySecret {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl Debug for ApiKeySecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKeySecret(****)")
    }
}

impl Display for ApiKeySecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "****")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ApiKey {
    pub id: Uuid,
    secret: ApiKeySecret,
}

impl ApiKey {
    pub fn new(id: Uuid, secret: impl Into<ApiKeySecret>) -> Self {
        Self {
            id,
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ID: &str = "6f1c7d1e-3b9a-4b7e-9a51-2d8f0c4e5a17";
    const KEY_SECRET: &str = "Y29ycGJhbmstdGVzdC1zZWNyZXQ=";

    #[test]
    fn test_parse_credentials() {
        let key = Credentials::new(KEY_ID, KEY_SECRET).parse().unwrap();
        assert_eq!(key.id.to_string(), KEY_ID);
        assert_eq!(key.secret(), b"corpbank-test-secret");
    }

    #[test]
    fn test_parse_rejects_invalid_key_id() {
        let err = Credentials::new("not-a-uuid", KEY_SECRET)
            .parse()
            .unwrap_err();
        assert_eq!(err.as_ref(), "MalformedCredentials");
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_parse_rejects_invalid_secret_without_echoing_it() {
        let secret = "%%definitely-not-base64%%";
        let err = Credentials::new(KEY_ID, secret).parse().unwrap_err();
        assert_eq!(err.as_ref(), "MalformedCredentials");
        assert!(!err.to_string().contains(secret));
    }

    #[test]
    fn test_secret_is_redacted() {
        let key = Credentials::new(KEY_ID, KEY_SECRET).parse().unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains(KEY_ID));
        assert!(!debug.contains("corpbank-test-secret"));
        assert!(!debug.contains(KEY_SECRET));

        let display = Credentials::new(KEY_ID, KEY_SECRET).to_string();
        assert!(!display.contains(KEY_SECRET));
    }
}

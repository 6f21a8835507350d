//! BearerToken is a signed assertion that the holder of an API key secret produced a
//! given request or webhook body at a given time.
//!
//! On the wire a token travels as `Authorization: Bearer <packed>`, where `<packed>`
//! is the URL-safe base64 encoding of the JSON envelope
//!
//! `{"apiKeyID":"<uuid>","timestamp":"<RFC3339 UTC>","algo":"HMAC-SHA256","signature":"<hex>"}`
//!
//! The signature is HMAC-SHA256 over the timestamp text followed by the body, see
//! [`crate::signer`]. A token is not self-verifying: unpacking only parses it, the
//! receiver must call [`BearerToken::verify`] with its own copy of the secret and then
//! compare [`BearerToken::api_key_id`] with the identity it expects.

pub mod signing_algorithm;

use crate::{signer, ApiKey, CorpBankError, TokenError};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use signing_algorithm::SigningAlgorithm;
use uuid::Uuid;

/// Upper bound on the packed (still encoded) token, checked before any decoding.
pub const MAX_PACKED_LEN: usize = 1024;

#[derive(Debug, Serialize, Deserialize)]
struct TokenEnvelope {
    #[serde(rename = "apiKeyID")]
    api_key_id: String,
    timestamp: String,
    algo: String,
    signature: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BearerToken {
    api_key_id: Uuid,
    timestamp: DateTime<Utc>,
    signature: Vec<u8>,
}

impl BearerToken {
    /// Sub-second precision is dropped: the packed form only carries whole seconds.
    pub fn from_parts(api_key_id: Uuid, timestamp: DateTime<Utc>, signature: Vec<u8>) -> Self {
        Self {
            api_key_id,
            timestamp: timestamp.trunc_subsecs(0),
            signature,
        }
    }

    /// Signs `body` on behalf of `key` at `timestamp`. Sub-second precision is dropped
    /// since the packed form only carries whole seconds.
    pub fn sign(
        key: &ApiKey,
        body: &[u8],
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CorpBankError> {
        let timestamp = timestamp.trunc_subsecs(0);
        let signature = signer::sign(key.secret(), body, &timestamp)?;

        Ok(Self::from_parts(key.id, timestamp, signature))
    }

    pub fn new_signed(key: &ApiKey, body: &[u8]) -> Result<Self, CorpBankError> {
        Self::sign(key, body, Utc::now())
    }

    pub fn api_key_id(&self) -> Uuid {
        self.api_key_id
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn verify(
        &self,
        secret: &[u8],
        body: &[u8],
        max_skew: Duration,
    ) -> Result<(), CorpBankError> {
        signer::verify(secret, body, self, max_skew)
    }

    pub fn verify_at(
        &self,
        secret: &[u8],
        body: &[u8],
        max_skew: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), CorpBankError> {
        signer::verify_at(secret, body, self, max_skew, now)
    }

    pub fn pack(&self) -> Result<String, CorpBankError> {
        let envelope = TokenEnvelope {
            api_key_id: self.api_key_id.to_string(),
            timestamp: signer::format_timestamp(&self.timestamp),
            algo: SigningAlgorithm::HmacSha256.to_string(),
            signature: hex::encode(&self.signature),
        };

        let packed = serde_json::to_vec(&envelope).map_err(|e| {
            TokenError::malformed_token(&format!("unable to pack the bearer token: {e}"))
        })?;

        Ok(URL_SAFE.encode(packed))
    }

    pub fn unpack(packed: &str) -> Result<Self, CorpBankError> {
        if packed.len() > MAX_PACKED_LEN {
            return Err(TokenError::oversized_input(packed.len(), MAX_PACKED_LEN));
        }

        let content = URL_SAFE.decode(packed).map_err(|e| {
            TokenError::malformed_token(&format!("unable to parse the bearer token: {e}"))
        })?;

        let envelope = serde_json::from_slice::<TokenEnvelope>(&content).map_err(|e| {
            TokenError::malformed_token(&format!(
                "unable to parse the JSON content of the bearer token: {e}"
            ))
        })?;

        let SigningAlgorithm::HmacSha256 = envelope.algo.parse::<SigningAlgorithm>()?;

        let api_key_id = Uuid::parse_str(&envelope.api_key_id).map_err(|e| {
            TokenError::malformed_token(&format!(
                "unable to parse the API key ID `{}`: {e}",
                envelope.api_key_id
            ))
        })?;

        let timestamp = DateTime::parse_from_rfc3339(&envelope.timestamp)
            .map_err(|e| {
                TokenError::malformed_token(&format!(
                    "unable to parse the timestamp value `{}`: {e}",
                    envelope.timestamp
                ))
            })?
            .with_timezone(&Utc);

        let signature = hex::decode(&envelope.signature).map_err(|e| {
            TokenError::malformed_token(&format!(
                "unable to parse the signature value `{}`: {e}",
                envelope.signature
            ))
        })?;

        Ok(Self::from_parts(api_key_id, timestamp, signature))
    }
}

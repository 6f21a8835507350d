use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use strum::AsRefStr;
use thiserror::Error as ThisError;

pub trait ErrorMeta {
    fn code(&self) -> ErrorCode;
    fn key(&self) -> ErrorKey;
    fn message(&self) -> ErrorMessage;
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorCode(u16);

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorKey(String);

impl ErrorKey {
    pub fn token(key: &str) -> Self {
        ErrorKey(format!("err::token::{key}"))
    }

    pub fn remote(key: &str) -> Self {
        ErrorKey(format!("err::remote::{key}"))
    }
}

impl Display for ErrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorMessage(String);

impl AsRef<str> for ErrorMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Failures of the bearer token protocol: credential parsing, signing, packing and
/// verification.
///
/// Messages are safe to hand back to the peer. They describe which part of the
/// token was rejected but never contain key material.
#[derive(ThisError, Debug, Clone, Hash, Eq, PartialEq, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum TokenError {
    #[error("Malformed credentials: {}", .message)]
    MalformedCredentials { message: String },
    #[error("illegal signature")]
    SignatureMismatch,
    #[error(
        "illegal timestamp: {} is outside of the allowed clock skew of {}s",
        .timestamp,
        .max_skew_secs
    )]
    StaleOrFutureTimestamp {
        timestamp: String,
        max_skew_secs: i64,
    },
    #[error("{}", .message)]
    MalformedToken { message: String },
    #[error("unsupported signing algorithm: `{}`", .algorithm)]
    UnrecognizedAlgorithm { algorithm: String },
    #[error("bearer token string is too long: {} (allowed max: {})", .length, .max)]
    OversizedInput { length: usize, max: usize },
}

impl TokenError {
    pub fn malformed_credentials(message: &str) -> CorpBankError {
        CorpBankError::Token(TokenError::MalformedCredentials {
            message: message.to_string(),
        })
    }

    pub fn signature_mismatch() -> CorpBankError {
        CorpBankError::Token(TokenError::SignatureMismatch)
    }

    pub fn stale_or_future_timestamp(timestamp: &str, max_skew_secs: i64) -> CorpBankError {
        CorpBankError::Token(TokenError::StaleOrFutureTimestamp {
            timestamp: timestamp.to_string(),
            max_skew_secs,
        })
    }

    pub fn malformed_token(message: &str) -> CorpBankError {
        CorpBankError::Token(TokenError::MalformedToken {
            message: message.to_string(),
        })
    }

    pub fn unrecognized_algorithm(algorithm: &str) -> CorpBankError {
        CorpBankError::Token(TokenError::UnrecognizedAlgorithm {
            algorithm: algorithm.to_string(),
        })
    }

    pub fn oversized_input(length: usize, max: usize) -> CorpBankError {
        CorpBankError::Token(TokenError::OversizedInput { length, max })
    }
}

impl ErrorMeta for TokenError {
    fn code(&self) -> ErrorCode {
        match self {
            TokenError::MalformedCredentials { .. } => ErrorCode(3000),
            TokenError::SignatureMismatch => ErrorCode(3001),
            TokenError::StaleOrFutureTimestamp { .. } => ErrorCode(3002),
            TokenError::MalformedToken { .. } => ErrorCode(3003),
            TokenError::UnrecognizedAlgorithm { .. } => ErrorCode(3004),
            TokenError::OversizedInput { .. } => ErrorCode(3005),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            TokenError::MalformedCredentials { .. } => ErrorKey::token("malformed_credentials"),
            TokenError::SignatureMismatch => ErrorKey::token("signature_mismatch"),
            TokenError::StaleOrFutureTimestamp { .. } => {
                ErrorKey::token("stale_or_future_timestamp")
            }
            TokenError::MalformedToken { .. } => ErrorKey::token("malformed_token"),
            TokenError::UnrecognizedAlgorithm { .. } => ErrorKey::token("unrecognized_algorithm"),
            TokenError::OversizedInput { .. } => ErrorKey::token("oversized_input"),
        }
    }

    fn message(&self) -> ErrorMessage {
        ErrorMessage(self.to_string())
    }
}

/// Failures talking to the bank API.
#[derive(ThisError, Debug, Clone, Hash, Eq, PartialEq, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum RemoteError {
    #[error("Unable to reach the remote service: {}", .message)]
    Transport { message: String },
    #[error("remote service returns unexpected response: {} - {}", .status, .body)]
    UnexpectedStatus { status: u16, body: String },
    #[error("Invalid request: {}", .message)]
    InvalidRequest { message: String },
    #[error("Unable to parse the response of the remote service: {}", .message)]
    InvalidResponse { message: String },
    #[error("payment error: currency mismatch")]
    CurrencyMismatch,
    #[error("payment error: incorrect recipient data")]
    IncorrectRecipientData,
    #[error("payment error: insufficient balance")]
    InsufficientBalance,
    #[error("payment error: recipient id")]
    InvalidRecipientId,
    #[error("payment error: out of eft hours")]
    OutOfEftHours,
    #[error("APIErr {}: {}", .code, .message)]
    Api { code: String, message: String },
}

/// Error envelope the bank returns alongside non-success statuses.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl RemoteError {
    pub fn transport(message: &str) -> CorpBankError {
        CorpBankError::Remote(RemoteError::Transport {
            message: message.to_string(),
        })
    }

    pub fn unexpected_status(status: StatusCode, body: &[u8]) -> CorpBankError {
        CorpBankError::Remote(RemoteError::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }

    pub fn invalid_request(message: &str) -> CorpBankError {
        CorpBankError::Remote(RemoteError::InvalidRequest {
            message: message.to_string(),
        })
    }

    pub fn invalid_response(message: &str) -> CorpBankError {
        CorpBankError::Remote(RemoteError::InvalidResponse {
            message: message.to_string(),
        })
    }

    /// Maps a non-success response onto the most specific error available. Bodies
    /// that do not carry the bank's `{ code, message }` envelope are reported as
    /// [`RemoteError::UnexpectedStatus`] with the raw body.
    pub fn from_response(status: StatusCode, body: &[u8]) -> CorpBankError {
        let Ok(api_err) = serde_json::from_slice::<ApiErrorBody>(body) else {
            return RemoteError::unexpected_status(status, body);
        };

        let err = match api_err.code.as_str() {
            "CURRENCY_MISMATCH" => RemoteError::CurrencyMismatch,
            "INCORRECT_RECIPIENT_DATA" => RemoteError::IncorrectRecipientData,
            "INSUFFICIENT_BALANCE" => RemoteError::InsufficientBalance,
            "INVALID_RECIPIENT_ID" => RemoteError::InvalidRecipientId,
            "OUT_OF_EFT_HOURS" => RemoteError::OutOfEftHours,
            _ => RemoteError::Api {
                code: api_err.code,
                message: api_err.message,
            },
        };

        CorpBankError::Remote(err)
    }
}

impl ErrorMeta for RemoteError {
    fn code(&self) -> ErrorCode {
        match self {
            RemoteError::Transport { .. } => ErrorCode(4000),
            RemoteError::UnexpectedStatus { .. } => ErrorCode(4001),
            RemoteError::InvalidRequest { .. } => ErrorCode(4002),
            RemoteError::InvalidResponse { .. } => ErrorCode(4003),
            RemoteError::CurrencyMismatch => ErrorCode(4004),
            RemoteError::IncorrectRecipientData => ErrorCode(4005),
            RemoteError::InsufficientBalance => ErrorCode(4006),
            RemoteError::InvalidRecipientId => ErrorCode(4007),
            RemoteError::OutOfEftHours => ErrorCode(4008),
            RemoteError::Api { .. } => ErrorCode(4009),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            RemoteError::Transport { .. } => ErrorKey::remote("transport"),
            RemoteError::UnexpectedStatus { .. } => ErrorKey::remote("unexpected_status"),
            RemoteError::InvalidRequest { .. } => ErrorKey::remote("invalid_request"),
            RemoteError::InvalidResponse { .. } => ErrorKey::remote("invalid_response"),
            RemoteError::CurrencyMismatch => ErrorKey::remote("currency_mismatch"),
            RemoteError::IncorrectRecipientData => ErrorKey::remote("incorrect_recipient_data"),
            RemoteError::InsufficientBalance => ErrorKey::remote("insufficient_balance"),
            RemoteError::InvalidRecipientId => ErrorKey::remote("invalid_recipient_id"),
            RemoteError::OutOfEftHours => ErrorKey::remote("out_of_eft_hours"),
            RemoteError::Api { .. } => ErrorKey::remote("api"),
        }
    }

    fn message(&self) -> ErrorMessage {
        ErrorMessage(self.to_string())
    }
}

#[derive(ThisError, Debug, Clone, Hash, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CorpBankError {
    #[error(transparent)]
    Token(TokenError),
    #[error(transparent)]
    Remote(RemoteError),
}

impl CorpBankError {
    pub fn is_token(&self) -> bool {
        matches!(self, CorpBankError::Token(_))
    }
}

impl AsRef<str> for CorpBankError {
    fn as_ref(&self) -> &str {
        match self {
            CorpBankError::Token(e) => e.as_ref(),
            CorpBankError::Remote(e) => e.as_ref(),
        }
    }
}

impl ErrorMeta for CorpBankError {
    fn code(&self) -> ErrorCode {
        match self {
            CorpBankError::Token(e) => e.code(),
            CorpBankError::Remote(e) => e.code(),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            CorpBankError::Token(e) => e.key(),
            CorpBankError::Remote(e) => e.key(),
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            CorpBankError::Token(e) => e.message(),
            CorpBankError::Remote(e) => e.message(),
        }
    }
}

impl<'a> From<&'a CorpBankError> for StatusCode {
    fn from(value: &'a CorpBankError) -> Self {
        match value {
            CorpBankError::Token(e) => match e {
                TokenError::MalformedToken { .. }
                | TokenError::UnrecognizedAlgorithm { .. }
                | TokenError::OversizedInput { .. } => StatusCode::BAD_REQUEST,
                TokenError::SignatureMismatch | TokenError::StaleOrFutureTimestamp { .. } => {
                    StatusCode::FORBIDDEN
                }
                TokenError::MalformedCredentials { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            CorpBankError::Remote(e) => match e {
                RemoteError::UnexpectedStatus { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                RemoteError::InvalidRequest { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                RemoteError::CurrencyMismatch
                | RemoteError::IncorrectRecipientData
                | RemoteError::InsufficientBalance
                | RemoteError::InvalidRecipientId
                | RemoteError::OutOfEftHours => StatusCode::UNPROCESSABLE_ENTITY,
                RemoteError::Transport { .. }
                | RemoteError::InvalidResponse { .. }
                | RemoteError::Api { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl From<CorpBankError> for StatusCode {
    fn from(value: CorpBankError) -> Self {
        (&value).into()
    }
}

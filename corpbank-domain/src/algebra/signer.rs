use crate::{bearer_token::BearerToken, CorpBankError, TokenError};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const HMAC_LENGTH_ERROR: &str = "HMAC has no key length restrictions";

/// Fixed textual form of a token timestamp: RFC3339, UTC, whole seconds, `Z` suffix.
///
/// The signed content is this string immediately followed by the body with no
/// separator. That only stays unambiguous while every rendering has the same length.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Computes HMAC-SHA256 over the formatted timestamp followed by the body bytes.
pub fn sign(
    secret: &[u8],
    body: &[u8],
    timestamp: &DateTime<Utc>,
) -> Result<Vec<u8>, CorpBankError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| TokenError::malformed_credentials(HMAC_LENGTH_ERROR))?;
    mac.update(format_timestamp(timestamp).as_bytes());
    mac.update(body);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Checks the token signature against `body` and the token timestamp against the
/// current time.
pub fn verify(
    secret: &[u8],
    body: &[u8],
    token: &BearerToken,
    max_skew: Duration,
) -> Result<(), CorpBankError> {
    verify_at(secret, body, token, max_skew, Utc::now())
}

/// Same as [`verify`] with an explicit clock. The accepted window is
/// `[now - max_skew, now + max_skew]`, both ends inclusive, clamped to the range
/// `DateTime<Utc>` can represent.
pub fn verify_at(
    secret: &[u8],
    body: &[u8],
    token: &BearerToken,
    max_skew: Duration,
    now: DateTime<Utc>,
) -> Result<(), CorpBankError> {
    let expected = sign(secret, body, token.timestamp())?;

    // ct_eq on slices of different lengths is false without inspecting content
    if !bool::from(expected.as_slice().ct_eq(token.signature())) {
        return Err(TokenError::signature_mismatch());
    }

    let timestamp = *token.timestamp();
    // a bound outside the representable range leaves that side of the window open
    let min = now
        .checked_sub_signed(max_skew)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let max = now
        .checked_add_signed(max_skew)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if timestamp < min || timestamp > max {
        return Err(TokenError::stale_or_future_timestamp(
            &format_timestamp(&timestamp),
            max_skew.num_seconds(),
        ));
    }

    Ok(())
}

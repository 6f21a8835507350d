use crate::{CorpBankError, TokenError};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SigningAlgorithm {
    HmacSha256,
}

impl Display for SigningAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningAlgorithm::HmacSha256 => write!(f, "HMAC-SHA256"),
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = CorpBankError;

    /// Tags are matched case-insensitively after trimming surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac-sha256" => Ok(SigningAlgorithm::HmacSha256),
            _ => Err(TokenError::unrecognized_algorithm(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        for tag in ["HMAC-SHA256", "hmac-sha256", " Hmac-Sha256 "] {
            assert_eq!(tag.parse::<SigningAlgorithm>(), Ok(SigningAlgorithm::HmacSha256));
        }
    }

    #[test]
    fn test_parse_rejects_other_algorithms() {
        for tag in ["HMAC-SHA1", "HMAC-SHA512", "none", ""] {
            assert_eq!(
                tag.parse::<SigningAlgorithm>(),
                Err(TokenError::unrecognized_algorithm(tag))
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(SigningAlgorithm::HmacSha256.to_string(), "HMAC-SHA256");
    }
}

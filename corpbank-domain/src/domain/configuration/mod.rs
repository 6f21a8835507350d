use crate::Credentials;
use anyhow::{anyhow, Result};
use chrono::Duration;
use envconfig::Envconfig;
use std::fmt::{Display, Formatter};

pub const DEFAULT_API_BASE_URL: &str = "https://api.birapi.com/corpbank/aispis/v1";

#[derive(Envconfig, Clone)] // Intentionally no Debug so secret is not printed
pub struct CorpBankConfig {
    #[envconfig(from = "CORPBANK_API_KEY_ID")]
    pub api_key_id: String,
    #[envconfig(from = "CORPBANK_API_KEY_SECRET")]
    pub api_key_secret: String,
    #[envconfig(
        from = "CORPBANK_API_BASE_URL",
        default = "https://api.birapi.com/corpbank/aispis/v1"
    )]
    pub api_base_url: String,
    #[envconfig(from = "CORPBANK_MAX_TIME_DIFF_SECS", default = "600")]
    pub max_time_diff_secs: i64,
}

impl CorpBankConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key_id.clone(), self.api_key_secret.clone())
    }

    /// Clock skew tolerated in either direction when verifying inbound tokens.
    pub fn max_time_diff(&self) -> Result<Duration> {
        Duration::try_seconds(self.max_time_diff_secs).ok_or_else(|| {
            anyhow!(
                "CORPBANK_MAX_TIME_DIFF_SECS is out of range: {}",
                self.max_time_diff_secs
            )
        })
    }
}

impl Display for CorpBankConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CORPBANK_API_KEY_ID: {}", self.api_key_id)?;
        writeln!(f, "CORPBANK_API_KEY_SECRET: ****")?;
        writeln!(f, "CORPBANK_API_BASE_URL: {}", self.api_base_url)?;
        write!(
            f,
            "CORPBANK_MAX_TIME_DIFF_SECS: {}",
            self.max_time_diff_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(extra: &[(&str, &str)]) -> CorpBankConfig {
        let mut env = HashMap::from([
            (
                "CORPBANK_API_KEY_ID".to_string(),
                "6f1c7d1e-3b9a-4b7e-9a51-2d8f0c4e5a17".to_string(),
            ),
            (
                "CORPBANK_API_KEY_SECRET".to_string(),
                "Y29ycGJhbmstdGVzdC1zZWNyZXQ=".to_string(),
            ),
        ]);
        env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        CorpBankConfig::init_from_hashmap(&env).expect("Failed to initialize config")
    }

    #[test]
    fn test_config_defaults() {
        let config = config(&[]);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.max_time_diff().unwrap(), Duration::minutes(10));
        assert!(config.credentials().parse().is_ok());
    }

    #[test]
    fn test_config_overrides() {
        let config = config(&[
            ("CORPBANK_API_BASE_URL", "http://localhost:8080/v1"),
            ("CORPBANK_MAX_TIME_DIFF_SECS", "30"),
        ]);
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.max_time_diff().unwrap(), Duration::seconds(30));
    }

    #[test]
    fn test_max_time_diff_out_of_range() {
        let max = i64::MAX.to_string();
        let config = config(&[("CORPBANK_MAX_TIME_DIFF_SECS", max.as_str())]);
        let err = config.max_time_diff().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_config_requires_credentials() {
        assert!(CorpBankConfig::init_from_hashmap(&HashMap::new()).is_err());
    }

    #[test]
    fn test_config_display_masks_secret() {
        let display = config(&[]).to_string();
        assert_eq!(
            display,
            r"CORPBANK_API_KEY_ID: 6f1c7d1e-3b9a-4b7e-9a51-2d8f0c4e5a17
CORPBANK_API_KEY_SECRET: ****
CORPBANK_API_BASE_URL: https://api.birapi.com/corpbank/aispis/v1
CORPBANK_MAX_TIME_DIFF_SECS: 600"
        );
    }
}

use corpbank_domain::CorpBankConfig;
use envconfig::Envconfig;
use std::{
    fmt::{Display, Formatter},
    net::SocketAddr,
};

#[derive(Envconfig, Clone)] // Intentionally no Debug so secret is not printed
pub struct WebhookConfig {
    #[envconfig(from = "SERVER_ADDRESS", default = "0.0.0.0:3000")]
    pub address: SocketAddr,
    #[envconfig(from = "WEBHOOK_PATH", default = "/webhooks/transactions")]
    pub path: String,
    #[envconfig(from = "WEBHOOK_MAX_BODY_BYTES", default = "10485760")]
    pub max_body_bytes: usize,
    #[envconfig(from = "WEBHOOK_EXPOSE_FAILURE_DETAILS", default = "true")]
    pub expose_failure_details: bool,
    #[envconfig(nested = true)]
    pub corpbank: CorpBankConfig,
}

impl Display for WebhookConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SERVER_ADDRESS: {}", self.address)?;
        writeln!(f, "WEBHOOK_PATH: {}", self.path)?;
        writeln!(f, "WEBHOOK_MAX_BODY_BYTES: {}", self.max_body_bytes)?;
        writeln!(
            f,
            "WEBHOOK_EXPOSE_FAILURE_DETAILS: {}",
            self.expose_failure_details
        )?;
        write!(f, "{}", self.corpbank)
    }
}

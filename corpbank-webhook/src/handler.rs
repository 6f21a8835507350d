use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corpbank_domain::Transaction;
use http::HeaderMap;
use tracing::info;
use uuid::Uuid;

/// What is known about a notification once its bearer token has been verified.
#[derive(Debug, Clone)]
pub struct WebhookContext {
    pub api_key_id: Uuid,
    pub signed_at: DateTime<Utc>,
    pub headers: HeaderMap,
}

/// Business callback for verified transaction notifications. Only called after every
/// authentication gate has passed; an error turns into a 500 for the sender.
#[async_trait]
pub trait HandleTransaction {
    async fn handle(&self, ctx: &WebhookContext, trx: Transaction) -> Result<(), anyhow::Error>;
}

pub struct LoggingHandler;

#[async_trait]
impl HandleTransaction for LoggingHandler {
    async fn handle(&self, ctx: &WebhookContext, trx: Transaction) -> Result<(), anyhow::Error> {
        info!(
            transaction_id = %trx.id,
            signed_at = %ctx.signed_at,
            "Received {} transaction of {} {} on {}",
            trx.direction,
            trx.amount,
            trx.currency,
            trx.account.iban
        );
        Ok(())
    }
}

use anyhow::Result;
use corpbank_domain::telemetry::{get_subscriber, init_subscriber};
use corpbank_webhook::{config::WebhookConfig, handler::LoggingHandler, server::Server};
use dotenvy::dotenv;
use envconfig::Envconfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("corpbank-webhook", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let config = WebhookConfig::init_from_env()?;

    info!("Starting corpbank-webhook with config:\n{config}");

    let server = Server::new(config, LoggingHandler)?;

    server.run().await?;

    Ok(())
}

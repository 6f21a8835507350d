use anyhow::{Context, Result};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Directives appended to the default filter. The HTTP stack logs every connection
/// event at `debug`, which drowns out request and webhook logs.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,h2=warn,rustls=warn";

pub struct Telemetry<T>
where
    T: SubscriberExt + Send + Sync + 'static,
{
    pub subscriber: T,
}

/// Bunyan JSON records named after `service`, filtered by `RUST_LOG` or, when it is
/// unset, by `default_filter` with the HTTP stack capped at `warn`.
pub fn get_subscriber<Sink>(
    service: &str,
    default_filter: &str,
    sink: Sink,
) -> Telemetry<impl SubscriberExt + Send + Sync + 'static>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},{QUIET_DEPENDENCIES}")));

    Telemetry {
        subscriber: Registry::default()
            .with(filter_layer)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(service.to_owned(), sink)),
    }
}

/// Installs the subscriber process-wide and routes `log` records through it. Fails
/// if either was already installed.
pub fn init_subscriber(
    telemetry: Telemetry<impl SubscriberExt + Send + Sync + 'static>,
) -> Result<()> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(telemetry.subscriber).context("Failed to set subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn records(captured: &Captured) -> Vec<Value> {
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_subscriber_writes_bunyan_records() {
        let captured = Captured::default();
        let telemetry = get_subscriber("corpbank-test", "info", captured.clone());

        tracing::subscriber::with_default(telemetry.subscriber, || {
            tracing::info!(api_key_id = "6f1c7d1e", "Signed outbound request");
        });

        let records = records(&captured);
        let record = records
            .iter()
            .find(|r| r["msg"] == "Signed outbound request")
            .unwrap();
        assert_eq!(record["name"], "corpbank-test");
        assert_eq!(record["api_key_id"], "6f1c7d1e");
    }
}

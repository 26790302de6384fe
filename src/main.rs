use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payrouter::application::orchestrator::PaymentOrchestrator;
use payrouter::config::{GatewayConfig, OutboxConfig};
use payrouter::domain::ports::{SharedEventSink, SharedOutboxStore, SharedPaymentStore};
use payrouter::gateway::ProviderGateway;
use payrouter::gateway::transport::HttpTransport;
use payrouter::infrastructure::in_memory::{InMemoryOutboxStore, InMemoryPaymentStore};
use payrouter::infrastructure::sink::LoggingEventSink;
use payrouter::interfaces::csv::payment_reader::PaymentRequestReader;
use payrouter::interfaces::csv::report_writer::PaymentReportWriter;
use payrouter::outbox::relay::OutboxRelay;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment requests CSV file (amount, currency, card_number)
    input: PathBuf,

    /// Provider A endpoint
    #[arg(long, default_value = "http://localhost:8081/payments")]
    provider_a_endpoint: String,

    /// Provider B endpoint
    #[arg(long, default_value = "http://localhost:8082/payments")]
    provider_b_endpoint: String,

    /// Outbox poll interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    outbox_interval_ms: u64,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn stores(cli: &Cli) -> Result<(SharedPaymentStore, SharedOutboxStore)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store =
            payrouter::infrastructure::rocksdb::RocksDbStore::open(db_path).into_diagnostic()?;
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }
    let _ = cli;
    Ok((
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(InMemoryOutboxStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (payments, outbox) = stores(&cli)?;

    let gateway_config = GatewayConfig {
        provider_a_endpoint: cli.provider_a_endpoint.clone(),
        provider_b_endpoint: cli.provider_b_endpoint.clone(),
        ..GatewayConfig::default()
    };
    let gateway = ProviderGateway::new(Arc::new(HttpTransport::new()), &gateway_config);
    let orchestrator = PaymentOrchestrator::new(payments, outbox.clone(), gateway);

    let sink: SharedEventSink = Arc::new(LoggingEventSink::new());
    let relay = OutboxRelay::new(
        outbox,
        sink,
        OutboxConfig {
            poll_interval: Duration::from_millis(cli.outbox_interval_ms),
            ..OutboxConfig::default()
        },
    );

    // Process requests
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = PaymentRequestReader::new(file);
    let mut processed = Vec::new();
    for request_result in reader.requests() {
        match request_result {
            Ok(request) => match orchestrator.process_payment(request).await {
                Ok(payment) => processed.push(payment),
                Err(err) => tracing::error!(%err, "error processing payment"),
            },
            Err(err) => tracing::error!(%err, "error reading payment request"),
        }
    }

    // Drain the staged events through the logging sink before exiting
    loop {
        match relay.process_batch().await {
            Ok(0) => break,
            Ok(_) => continue,
            Err(err) => {
                tracing::error!(%err, "outbox drain failed");
                break;
            }
        }
    }

    // Output final state
    let stdout = io::stdout();
    let mut writer = PaymentReportWriter::new(stdout.lock());
    writer.write_payments(&processed).into_diagnostic()?;

    Ok(())
}

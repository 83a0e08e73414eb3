//! Order ledger demo entry point.

use std::io::Write;

use ledger_demo::Config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // Logs go to stderr; stdout carries the checkpoint reports.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(database_url = %config.database_url, "starting order ledger demo");

    let mut stdout = std::io::stdout();
    match ledger_demo::run(&config, &mut stdout).await {
        Ok(checkpoints) => {
            tracing::info!(checkpoints = checkpoints.len(), "demo completed");
        }
        Err(e) => {
            tracing::error!(error = %e, "demo aborted");
            let _ = writeln!(stdout, "{}", e.failure_line());
        }
    }
}

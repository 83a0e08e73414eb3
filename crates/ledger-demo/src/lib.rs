//! Scripted walkthrough of commit, rollback and savepoints on the order ledger.

pub mod config;
pub mod error;
pub mod scenario;

use std::io::Write;

use ledger::OrderLedger;

pub use config::{Config, OutputFormat};
pub use error::{Result, ScenarioError};
pub use scenario::{Checkpoint, Stage, run_scenario};

/// Opens the ledger, seeds the client, runs the scenario and closes the ledger.
///
/// The connection is closed whether or not the scenario succeeds.
pub async fn run<W: Write>(config: &Config, out: &mut W) -> Result<Vec<Checkpoint>> {
    let mut ledger = OrderLedger::connect(&config.database_url)
        .await?
        .with_order_price(config.order_price);

    let result = setup_and_run(&mut ledger, config, out).await;

    if let Err(e) = ledger.close().await {
        tracing::warn!(error = %e, "failed to close ledger connection");
    }
    result
}

async fn setup_and_run<W: Write>(
    ledger: &mut OrderLedger,
    config: &Config,
    out: &mut W,
) -> Result<Vec<Checkpoint>> {
    ledger.setup(&config.client_seed()).await?;
    run_scenario(ledger, config, out).await
}

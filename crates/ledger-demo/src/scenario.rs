//! The scripted commit / rollback / savepoint walkthrough.
//!
//! ```text
//! add ─► commit ─► add, add ─► rollback ─► add ─► SP first ─► add ─► SP second
//!     ─► add ─► SP third ─► rollback to second ─► release first ─► commit
//! ```
//! A checkpoint report is written and checked after each boundary.

use std::io::Write;

use ledger::{AddOrder, ClientId, ClientReport, ItemId, OrderLedger};
use serde::Serialize;

use crate::config::{Config, OutputFormat};
use crate::error::{Result, ScenarioError};

/// Item added by every regular step.
pub const REGULAR_ITEM: ItemId = ItemId::new(5);

/// Item added after the "second" savepoint and later rolled back.
pub const ADDITIONAL_ITEM: ItemId = ItemId::new(10);

/// Points in the scenario at which the client data is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initial,
    AfterOneItem,
    AfterRollback,
    AfterThreeSavepoints,
    AfterRollbackToSavepoint,
    AfterFinalCommit,
}

impl Stage {
    /// Heading printed above the checkpoint report.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Initial => "Initial client data",
            Stage::AfterOneItem => "Client data after one item",
            Stage::AfterRollback => "Client data after three items and rollback",
            Stage::AfterThreeSavepoints => "Client data after three savepoints",
            Stage::AfterRollbackToSavepoint => "Client data after rollback to second savepoint",
            Stage::AfterFinalCommit => "Client data after another item and commit",
        }
    }

    /// Number of order items that should be visible on top of the initial ones.
    pub fn items_added(&self) -> usize {
        match self {
            Stage::Initial => 0,
            Stage::AfterOneItem | Stage::AfterRollback => 1,
            Stage::AfterThreeSavepoints => 4,
            Stage::AfterRollbackToSavepoint | Stage::AfterFinalCommit => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A report taken at one stage of the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub stage: Stage,
    #[serde(flatten)]
    pub report: ClientReport,
}

/// Writes and verifies checkpoints.
struct Recorder<'w, W> {
    out: &'w mut W,
    output: OutputFormat,
    client_id: ClientId,
    order_price: i64,
    checkpoints: Vec<Checkpoint>,
}

impl<W: Write> Recorder<'_, W> {
    async fn record(&mut self, ledger: &mut OrderLedger, stage: Stage) -> Result<()> {
        let report = ledger.client_report(self.client_id).await?;
        let checkpoint = Checkpoint { stage, report };
        self.write(&checkpoint)?;
        self.verify(&checkpoint)?;
        self.checkpoints.push(checkpoint);
        Ok(())
    }

    fn write(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        match self.output {
            OutputFormat::Text => {
                writeln!(self.out, "{}:", checkpoint.stage)?;
                writeln!(self.out, "{}", checkpoint.report)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *self.out, checkpoint)?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    /// Compares against the initial checkpoint; the first checkpoint is its own baseline.
    fn verify(&self, checkpoint: &Checkpoint) -> Result<()> {
        let baseline = self.checkpoints.first().unwrap_or(checkpoint);
        let added = checkpoint.stage.items_added();
        let expected_account = baseline.report.account() - self.order_price * added as i64;
        let expected_items = baseline.report.item_count() + added;

        let actual_account = checkpoint.report.account();
        let actual_items = checkpoint.report.item_count();
        if actual_account != expected_account || actual_items != expected_items {
            return Err(ScenarioError::UnexpectedState {
                stage: checkpoint.stage,
                expected_account,
                expected_items,
                actual_account,
                actual_items,
            });
        }
        Ok(())
    }
}

/// Runs the scenario on an already set up ledger.
///
/// Stops at the first error; the ledger is left as it was at that point.
#[tracing::instrument(skip_all, fields(client_id = %config.client_id))]
pub async fn run_scenario<W: Write>(
    ledger: &mut OrderLedger,
    config: &Config,
    out: &mut W,
) -> Result<Vec<Checkpoint>> {
    let regular = AddOrder::new(config.client_id, config.order_id, REGULAR_ITEM);
    let additional = regular.with_item(ADDITIONAL_ITEM);
    let mut recorder = Recorder {
        out,
        output: config.output,
        client_id: config.client_id,
        order_price: ledger.order_price(),
        checkpoints: Vec::new(),
    };

    ledger.begin_manual_transaction().await?;
    recorder.record(ledger, Stage::Initial).await?;

    ledger.add_order(&regular).await?;
    ledger.commit().await?;
    recorder.record(ledger, Stage::AfterOneItem).await?;

    ledger.add_order(&regular).await?;
    ledger.add_order(&regular).await?;
    ledger.rollback().await?;
    recorder.record(ledger, Stage::AfterRollback).await?;

    ledger.add_order(&regular).await?;
    let first = ledger.create_savepoint("first").await?;
    ledger.add_order(&regular).await?;
    let second = ledger.create_savepoint("second").await?;
    ledger.add_order(&additional).await?;
    let _third = ledger.create_savepoint("third").await?;
    recorder.record(ledger, Stage::AfterThreeSavepoints).await?;

    ledger.rollback_to(&second).await?;
    recorder.record(ledger, Stage::AfterRollbackToSavepoint).await?;

    // Releasing "first" also drops "second"; "third" is already gone.
    ledger.release_savepoint(&first).await?;
    ledger.commit().await?;
    recorder.record(ledger, Stage::AfterFinalCommit).await?;

    tracing::info!(checkpoints = recorder.checkpoints.len(), "scenario finished");
    Ok(recorder.checkpoints)
}

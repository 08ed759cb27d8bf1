//! The end-to-end run: connect, create the collection, build the batch, insert it in one
//! transaction, and drop the scratch database on the way out.

use std::{
    fmt,
    time::{Duration, Instant},
};

use mongodb::{bson::doc, Client, Collection};

use crate::{
    config::Config,
    connection::{self, ScratchDatabase},
    error::{Error, Phase, Result},
    record::{Batch, Record},
    runtime::with_deadline,
    trace::{millis, DRIVER_TRACING_EVENT_TARGET},
    transaction::{BulkInsert, SnapshotTransaction, TransactionRunner, RETRY_DIAGNOSTIC},
};

/// Process exit code for a run whose verified document count differs from the batch size. Kept
/// apart from the `2` that clap uses for usage errors.
pub const INCONSISTENT_EXIT_CODE: u8 = 3;

/// The outcome of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub database: String,
    pub collection: String,
    /// The configured batch size.
    pub requested: usize,
    /// The number of ids the committed `insertMany` reported.
    pub inserted: usize,
    /// How many times the driver entered the transaction body.
    pub invocations: usize,
    /// The document count read back after the commit, when verification was requested.
    pub persisted: Option<u64>,
    pub elapsed: Duration,
}

impl Report {
    /// False only when a verified count differs from the requested batch size.
    pub fn is_consistent(&self) -> bool {
        self.persisted
            .map(|persisted| persisted == self.requested as u64)
            .unwrap_or(true)
    }

    /// The process exit code for this outcome: `0`, or [`INCONSISTENT_EXIT_CODE`].
    pub fn exit_code(&self) -> u8 {
        if self.is_consistent() {
            0
        } else {
            INCONSISTENT_EXIT_CODE
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted {} of {} documents into {}.{} in {:?} ({} invocation{})",
            self.inserted,
            self.requested,
            self.database,
            self.collection,
            self.elapsed,
            self.invocations,
            if self.invocations == 1 { "" } else { "s" },
        )?;
        if let Some(persisted) = self.persisted {
            write!(f, ", {} persisted", persisted)?;
        }
        Ok(())
    }
}

/// Executes one run as described by `config`.
///
/// Errors from connecting, creating the collection, the transaction and verification abort the
/// run. Once connected, the scratch database is dropped before returning whatever the outcome;
/// failures of that drop are discarded.
pub async fn run(config: &Config) -> Result<Report> {
    let started = Instant::now();
    let timeout = config.phase_timeout();
    let database = config.database_name();

    let (client, scratch) = connection::connect(&config.uri, &database, timeout).await?;
    tracing::info!(
        target: DRIVER_TRACING_EVENT_TARGET,
        databaseName = database.as_str(),
        durationMS = millis(started.elapsed()),
        "Connected"
    );

    let result = run_in_scratch(&client, &scratch, config, timeout).await;
    scratch.drop_best_effort().await;

    let mut report = result?;
    report.elapsed = started.elapsed();
    Ok(report)
}

async fn run_in_scratch(
    client: &Client,
    scratch: &ScratchDatabase,
    config: &Config,
    timeout: Duration,
) -> Result<Report> {
    connection::create_collection(scratch.database(), &config.collection, timeout).await?;

    let generated = Instant::now();
    let batch = Batch::generate(config.batch_size);
    tracing::info!(
        target: DRIVER_TRACING_EVENT_TARGET,
        documentCount = batch.len() as u64,
        durationMS = millis(generated.elapsed()),
        "Batch generated"
    );

    let collection = scratch.database().collection::<Record>(&config.collection);
    let runner = SnapshotTransaction::new(client.clone(), timeout);
    let mut work = BulkInsert::new(collection.clone(), &batch);

    let transacted = Instant::now();
    let outcome = runner.run(&mut work).await;
    let invocations = work.invocations().count();

    if work.invocations().was_retried() {
        println!("{}", RETRY_DIAGNOSTIC);
        tracing::warn!(
            target: DRIVER_TRACING_EVENT_TARGET,
            invocations = invocations as u64,
            "Transaction body ran more than once"
        );
    }

    let inserted = outcome?.inserted_ids.len();
    tracing::info!(
        target: DRIVER_TRACING_EVENT_TARGET,
        documentCount = inserted as u64,
        invocations = invocations as u64,
        durationMS = millis(transacted.elapsed()),
        "Transaction committed"
    );

    let persisted = if config.verify {
        Some(count_persisted(&collection, timeout).await?)
    } else {
        None
    };

    Ok(Report {
        database: scratch.name().to_string(),
        collection: config.collection.clone(),
        requested: batch.len(),
        inserted,
        invocations,
        persisted,
        elapsed: Duration::ZERO,
    })
}

async fn count_persisted(collection: &Collection<Record>, timeout: Duration) -> Result<u64> {
    with_deadline(
        Phase::Verify,
        timeout,
        async { collection.count_documents(doc! {}).await },
        Error::verify,
    )
    .await
}

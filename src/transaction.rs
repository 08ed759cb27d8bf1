use std::time::Duration;

use futures_util::future::{FutureExt, LocalBoxFuture};
use mongodb::{
    options::ReadConcern,
    results::InsertManyResult,
    Client,
    ClientSession,
    Collection,
};

use crate::{
    error::{Error, Phase, Result},
    record::{Batch, Record},
    runtime::with_deadline,
    trace::TRANSACTION_TRACING_EVENT_TARGET,
};

/// Printed once when the transaction body ran more than once.
pub const RETRY_DIAGNOSTIC: &str =
    "Very strange... why the transaction has been called more than once (((: What wrong with it?";

/// Counts how many times a transaction body has been entered.
///
/// Retries of the driver's convenient transaction API are sequential, so a plain counter is
/// enough.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invocations {
    count: usize,
}

impl Invocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one invocation and returns the running total.
    pub fn record(&mut self) -> usize {
        self.count += 1;
        self.count
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the body was entered more than once.
    pub fn was_retried(&self) -> bool {
        self.count > 1
    }
}

/// The unit of work: a single `insertMany` of the whole batch.
///
/// Every attempt submits the same records. A retried attempt only starts after the driver has
/// aborted the previous one, so no attempt's writes outlive it; the pre-assigned ids would turn a
/// duplicate write into a duplicate key error rather than a second copy.
#[derive(Debug)]
pub struct BulkInsert<'a> {
    collection: Collection<Record>,
    records: &'a [Record],
    invocations: Invocations,
}

impl<'a> BulkInsert<'a> {
    pub fn new(collection: Collection<Record>, batch: &'a Batch) -> Self {
        Self {
            collection,
            records: batch.records(),
            invocations: Invocations::new(),
        }
    }

    pub fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    /// Runs one attempt of the unit of work on `session`.
    pub async fn attempt(
        &mut self,
        session: &mut ClientSession,
    ) -> mongodb::error::Result<InsertManyResult> {
        let count = self.invocations.record();
        println!("Hello from transaction! count - {}", count);
        tracing::debug!(
            target: TRANSACTION_TRACING_EVENT_TARGET,
            invocation = count as u64,
            collectionName = self.collection.name(),
            documentCount = self.records.len() as u64,
            "Transaction body started"
        );

        self.collection
            .insert_many(self.records)
            .session(session)
            .await
    }
}

/// The capability of running a unit of work inside a transaction with snapshot read concern,
/// retrying it per the provider's policy when it fails with a transient error.
///
/// Implementations may enter the unit of work more than once. Session and transaction resources
/// must be released on every path.
pub trait TransactionRunner {
    fn run<'a>(
        &'a self,
        work: &'a mut BulkInsert<'_>,
    ) -> LocalBoxFuture<'a, Result<InsertManyResult>>;
}

/// A [`TransactionRunner`] backed by the driver's convenient transaction API.
///
/// Each call starts its own session, which is ended when the call completes, fails, or times out.
#[derive(Clone, Debug)]
pub struct SnapshotTransaction {
    client: Client,
    timeout: Duration,
}

impl SnapshotTransaction {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn execute(
        &self,
        work: &mut BulkInsert<'_>,
    ) -> mongodb::error::Result<InsertManyResult> {
        let mut session = self.client.start_session().await?;
        session
            .start_transaction()
            .read_concern(ReadConcern::snapshot())
            .and_run2(async |session| work.attempt(session).await)
            .await
    }
}

impl TransactionRunner for SnapshotTransaction {
    fn run<'a>(
        &'a self,
        work: &'a mut BulkInsert<'_>,
    ) -> LocalBoxFuture<'a, Result<InsertManyResult>> {
        with_deadline(
            Phase::Transaction,
            self.timeout,
            self.execute(work),
            Error::transaction,
        )
        .boxed_local()
    }
}

#[cfg(test)]
mod test {
    use super::Invocations;

    #[test]
    fn single_invocation_is_not_a_retry() {
        let mut invocations = Invocations::new();
        assert_eq!(invocations.count(), 0);
        assert!(!invocations.was_retried());

        assert_eq!(invocations.record(), 1);
        assert!(!invocations.was_retried());
    }

    #[test]
    fn repeated_invocations_are_counted() {
        let mut invocations = Invocations::new();
        invocations.record();
        assert_eq!(invocations.record(), 2);
        assert_eq!(invocations.count(), 2);
        assert!(invocations.was_retried());
    }
}

//! Inserts a large batch of generated records into a scratch MongoDB database inside a single
//! snapshot transaction, and reports how many times the driver's convenient transaction API
//! entered the transaction body.
//!
//! ```no_run
//! # use clap::Parser;
//! # use mongo_transaction::{driver, Config};
//! # async fn wrapper() -> mongo_transaction::error::Result<()> {
//! let config = Config::parse_from(["mongo-transaction", "--batch-size", "10", "--verify"]);
//! let report = driver::run(&config).await?;
//! assert_eq!(report.invocations, 1);
//! # Ok(())
//! # }
//! ```
#![warn(
    rustdoc::missing_crate_level_docs,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod record;
mod runtime;
mod trace;
pub mod transaction;

pub use crate::{
    config::Config,
    driver::Report,
    error::{Error, Phase, Result},
    record::{Batch, Record},
    runtime::DEFAULT_PHASE_TIMEOUT,
    transaction::{BulkInsert, Invocations, SnapshotTransaction, TransactionRunner},
};

use std::time::Duration;

use clap::Parser;
use uuid::Uuid;

use crate::{record::DEFAULT_BATCH_SIZE, runtime::DEFAULT_PHASE_TIMEOUT};

/// The deployment targeted when neither `--uri` nor `MONGODB_URI` is given.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// The collection created inside the scratch database.
pub const DEFAULT_COLLECTION_NAME: &str = "mycollection";

/// Inserts a batch of generated records inside one snapshot transaction and reports how many
/// times the driver invoked the transaction body.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Connection string of the deployment. Transactions need a replica set or sharded cluster.
    #[arg(long, env = "MONGODB_URI", default_value = DEFAULT_URI)]
    pub uri: String,

    /// Number of records to insert.
    #[arg(short = 'n', long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Name of the collection created in the scratch database.
    #[arg(long, default_value = DEFAULT_COLLECTION_NAME)]
    pub collection: String,

    /// Name of the scratch database. It must not exist yet, since it is dropped at the end of the
    /// run. A fresh UUID is used when omitted.
    #[arg(long)]
    pub database: Option<String>,

    /// Deadline in seconds applied to each phase of the run.
    #[arg(
        long,
        default_value_t = DEFAULT_PHASE_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Count the persisted documents after the commit and compare with the batch size.
    #[arg(long)]
    pub verify: bool,
}

impl Config {
    /// The scratch database name for this run: the configured override, or a new v4 UUID so that
    /// concurrent runs never share a database.
    pub fn database_name(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

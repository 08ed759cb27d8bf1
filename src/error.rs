//! Contains the `Error` and `Result` types that `mongo-transaction` uses.

use std::{fmt, time::Duration};

use mongodb::error::{ErrorKind, TRANSIENT_TRANSACTION_ERROR};
use thiserror::Error;

/// The result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The stage of a run an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Phase {
    /// Parsing options, dialing the deployment and pinging the primary.
    Connect,
    /// The administrative `create` command.
    CreateCollection,
    /// Session start, the transactional unit of work and its commit.
    Transaction,
    /// Counting the persisted documents after the commit.
    Verify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::CreateCollection => "create collection",
            Self::Transaction => "transaction",
            Self::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// An error that aborts a run. Cleanup failures are never surfaced through this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The deployment could not be reached, the handshake failed, or the primary did not answer
    /// the `ping`.
    #[error("failed to connect: {source}")]
    Connect {
        #[source]
        source: mongodb::error::Error,
    },

    /// The scratch database name is already taken on the deployment. The run refuses to adopt it,
    /// since the database would be dropped at the end.
    #[error("database {database:?} already exists")]
    ExistingDatabase { database: String },

    /// The server rejected the `create` command.
    #[error("failed to create collection {collection:?}: {source}")]
    CreateCollection {
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// The session could not be started, or the transaction failed after the driver exhausted its
    /// retries.
    #[error("transaction failed: {source}")]
    Transaction {
        #[source]
        source: mongodb::error::Error,
    },

    /// The post-commit document count failed.
    #[error("failed to count persisted documents: {source}")]
    Verify {
        #[source]
        source: mongodb::error::Error,
    },

    /// A phase did not complete before its deadline.
    #[error("{phase} did not complete within {timeout:?}")]
    Timeout { phase: Phase, timeout: Duration },
}

impl Error {
    /// The phase this error was raised in.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Connect { .. } | Self::ExistingDatabase { .. } => Phase::Connect,
            Self::CreateCollection { .. } => Phase::CreateCollection,
            Self::Transaction { .. } => Phase::Transaction,
            Self::Verify { .. } => Phase::Verify,
            Self::Timeout { phase, .. } => *phase,
        }
    }

    /// The driver error underneath, if any.
    pub fn driver_error(&self) -> Option<&mongodb::error::Error> {
        match self {
            Self::Connect { source }
            | Self::CreateCollection { source, .. }
            | Self::Transaction { source }
            | Self::Verify { source } => Some(source),
            Self::ExistingDatabase { .. } | Self::Timeout { .. } => None,
        }
    }

    /// Whether the driver labeled the underlying error as a transient transaction error. Such an
    /// error reaching the caller means the driver's retry budget ran out.
    pub fn is_transient(&self) -> bool {
        self.driver_error()
            .map(|e| e.contains_label(TRANSIENT_TRANSACTION_ERROR))
            .unwrap_or(false)
    }

    /// Whether the driver rejected the request before sending it, e.g. an empty `insertMany`.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self.driver_error().map(|e| &*e.kind),
            Some(ErrorKind::InvalidArgument { .. })
        )
    }

    pub(crate) fn connect(source: mongodb::error::Error) -> Self {
        Self::Connect { source }
    }

    pub(crate) fn transaction(source: mongodb::error::Error) -> Self {
        Self::Transaction { source }
    }

    pub(crate) fn verify(source: mongodb::error::Error) -> Self {
        Self::Verify { source }
    }
}

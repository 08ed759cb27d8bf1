use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ReadPreference, SelectionCriteria},
    Client,
    Database,
};

use crate::{
    error::{Error, Phase, Result},
    runtime::with_deadline,
    trace::{millis, CONNECTION_TRACING_EVENT_TARGET},
};

const APP_NAME: &str = "mongo-transaction";

/// Connects to the deployment at `uri`, obtains a handle to `database` and verifies the primary is
/// reachable with a `ping`, all under a single `timeout`.
///
/// `database` must not exist yet: a name that is already taken is rejected with
/// [`Error::ExistingDatabase`] and no guard is created for it. Otherwise the database is handed
/// back as a [`ScratchDatabase`] guard.
pub async fn connect(
    uri: &str,
    database: &str,
    timeout: Duration,
) -> Result<(Client, ScratchDatabase)> {
    let (client, existing) = with_deadline(
        Phase::Connect,
        timeout,
        async {
            let mut options = ClientOptions::parse(uri).await?;
            options.app_name.get_or_insert_with(|| APP_NAME.to_string());
            let client = Client::with_options(options)?;

            client
                .database(database)
                .run_command(doc! { "ping": 1 })
                .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
                .await?;

            let existing = client
                .list_database_names()
                .filter(doc! { "name": database })
                .await?;
            Ok::<_, mongodb::error::Error>((client, existing))
        },
        Error::connect,
    )
    .await?;

    if !existing.is_empty() {
        return Err(Error::ExistingDatabase {
            database: database.to_string(),
        });
    }

    let db = client.database(database);

    tracing::debug!(
        target: CONNECTION_TRACING_EVENT_TARGET,
        databaseName = database,
        "Primary reachable"
    );

    Ok((client, ScratchDatabase::new(db, timeout)))
}

/// Issues the administrative `create` command for `name` in `db`. Not retried.
pub async fn create_collection(db: &Database, name: &str, timeout: Duration) -> Result<()> {
    with_deadline(
        Phase::CreateCollection,
        timeout,
        async { db.run_command(doc! { "create": name }).await },
        |source| Error::CreateCollection {
            collection: name.to_string(),
            source,
        },
    )
    .await?;

    tracing::debug!(
        target: CONNECTION_TRACING_EVENT_TARGET,
        databaseName = db.name(),
        collectionName = name,
        "Collection created"
    );
    Ok(())
}

/// Owns a disposable database for the length of a run.
///
/// [`ScratchDatabase::drop_best_effort`] drops it and discards any error. If the guard goes out of
/// scope without that having happened, the drop is spawned onto the current tokio runtime
/// instead.
#[derive(Debug)]
pub struct ScratchDatabase {
    db: Database,
    timeout: Duration,
    released: bool,
}

impl ScratchDatabase {
    fn new(db: Database, timeout: Duration) -> Self {
        Self {
            db,
            timeout,
            released: false,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    /// Drops the database under its own deadline. Errors are logged and discarded.
    pub async fn drop_best_effort(mut self) {
        self.released = true;
        drop_database(self.db.clone(), self.timeout).await;
    }
}

impl Drop for ScratchDatabase {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let db = self.db.clone();
            let timeout = self.timeout;
            handle.spawn(async move {
                drop_database(db, timeout).await;
            });
        }
    }
}

async fn drop_database(db: Database, timeout: Duration) {
    let name = db.name().to_string();
    match tokio::time::timeout(timeout, async { db.drop().await }).await {
        Ok(Ok(())) => tracing::debug!(
            target: CONNECTION_TRACING_EVENT_TARGET,
            databaseName = name.as_str(),
            "Scratch database dropped"
        ),
        Ok(Err(e)) => tracing::debug!(
            target: CONNECTION_TRACING_EVENT_TARGET,
            databaseName = name.as_str(),
            error = %e,
            "Ignoring failure to drop scratch database"
        ),
        Err(_) => tracing::debug!(
            target: CONNECTION_TRACING_EVENT_TARGET,
            databaseName = name.as_str(),
            timeoutMS = millis(timeout),
            "Gave up dropping scratch database"
        ),
    }
}

#![allow(dead_code)]

mod failpoint;

pub use self::failpoint::{FailCommandOptions, FailPoint, FailPointGuard, FailPointMode};

use std::time::Duration;

use clap::Parser;
use mongo_transaction::Config;
use mongodb::{bson::doc, options::ClientOptions, Client};
use tokio::sync::RwLock;

/// Serializes fail point tests against the tests that only insert.
pub static LOCK: RwLock<()> = RwLock::const_new(());

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(2);

pub fn test_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

/// Appends an `appName` option to `uri` so fail points can target a single client.
pub fn with_app_name(uri: &str, app_name: &str) -> String {
    if uri.contains('?') {
        format!("{}&appName={}", uri, app_name)
    } else if uri.ends_with('/') {
        format!("{}?appName={}", uri, app_name)
    } else {
        format!("{}/?appName={}", uri, app_name)
    }
}

/// A client for the test deployment, or `None` when nothing answers a ping in time.
pub async fn test_client() -> Option<Client> {
    let mut options = ClientOptions::parse(test_uri()).await.ok()?;
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
    let client = Client::with_options(options).ok()?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .ok()?;
    Some(client)
}

pub async fn transactions_supported(client: &Client) -> bool {
    match client.database("admin").run_command(doc! { "hello": 1 }).await {
        Ok(hello) => hello.contains_key("setName") || hello.get_str("msg").ok() == Some("isdbgrid"),
        Err(_) => false,
    }
}

pub fn config(uri: &str, batch_size: usize, extra: &[&str]) -> Config {
    let batch_size = batch_size.to_string();
    let mut args = vec![
        "mongo-transaction",
        "--uri",
        uri,
        "--batch-size",
        batch_size.as_str(),
        "--timeout-secs",
        "120",
    ];
    args.extend_from_slice(extra);
    Config::try_parse_from(args).unwrap()
}

pub fn log_uncaptured<S: AsRef<str>>(text: S) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    stderr.write_all(text.as_ref().as_bytes()).unwrap();
    stderr.write_all(b"\n").unwrap();
}

pub async fn database_exists(client: &Client, name: &str) -> bool {
    client
        .list_database_names()
        .await
        .unwrap()
        .iter()
        .any(|db| db == name)
}

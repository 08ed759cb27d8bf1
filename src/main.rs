use std::process::ExitCode;

use clap::Parser;
use mongo_transaction::{driver, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    match driver::run(&config).await {
        Ok(report) if report.is_consistent() => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!("{}", report);
            tracing::error!(
                requested = report.requested as u64,
                persisted = report.persisted,
                "Persisted document count does not match the batch size"
            );
            ExitCode::from(report.exit_code())
        }
        Err(e) => {
            tracing::error!(phase = %e.phase(), error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

use std::{future::Future, time::Duration};

use crate::error::{Error, Phase, Result};

/// The deadline applied to each network-bound phase unless configured otherwise.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Await a driver future for at most `timeout`. Expiry cancels the future and is reported as an
/// [`Error::Timeout`] for `phase`; a driver error is converted with `map_err`.
pub(crate) async fn with_deadline<T, F>(
    phase: Phase,
    timeout: Duration,
    future: F,
    map_err: impl FnOnce(mongodb::error::Error) -> Error,
) -> Result<T>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result.map_err(map_err),
        Err(_) => Err(Error::Timeout { phase, timeout }),
    }
}

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Error, Result};

/// Uniformly picked in `[min, max)`, `min` when the window is empty
#[must_use]
pub fn random_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }

    rand::thread_rng().gen_range(min..max)
}

/// Sleeps for `duration` unless `cancel` fires first
///
/// ## Errors
///
/// Fails with `Error::Cancelled` if the token is cancelled before the delay elapses
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    info!("Sleeping for {duration:?}");
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

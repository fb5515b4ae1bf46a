use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until the `ready` predicate reports true, or a timeout expires.
/// Sleeps in small intervals to avoid CPU spinning. Predicate errors abort the wait.
pub fn wait_until_with_timeout(
    mut ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

use std::thread;
use std::time::Duration;

/// Call `op` up to `attempts` times, sleeping `backoff` between tries.
///
/// External collaborators are rate-limited; a single retry covers transient
/// throttling without risking runaway latency, so callers in this crate use
/// `attempts = 2`.
pub fn with_retry<T, E, F>(attempts: usize, backoff: Duration, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    assert!(attempts > 0, "attempts must be positive");

    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, error = %e, "collaborator call failed, retrying");
                thread::sleep(backoff);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

//! Bounded retry for transient external calls.
//!
//! External collaborators (the URL shortener, historically the login
//! endpoints) fail transiently often enough that every call site wants
//! the same policy: a few attempts, a short fixed delay, and then give
//! up and let the caller degrade. The policy lives here as a plain
//! higher-order function so call sites stay explicit about using it.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use log::warn;

/// Attempts made before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
/// Returns the first success, or the last error once attempts run out.
/// Every failed attempt is logged under `label`.
pub fn with_retry<T, E, F>(label: &str, attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("{}: attempt {}/{} failed: {}", label, attempt, attempts, e);
                last_err = Some(e);
                if attempt < attempts {
                    thread::sleep(delay);
                }
            }
        }
    }
    Err(last_err.expect("at least one attempt was made"))
}

//! Exponential backoff for connector operations (spec §4.3, §5).
//!
//! Backends whose SDKs don't already retry internally (the local and
//! in-memory connectors never need this; the object-store-backed connector
//! uses it around each backend call) get uniform doubling backoff bounded
//! by `max_attempts`.

use std::thread::sleep;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::ConnectorError;

/// Retry `op` up to `max_attempts` times with exponentially doubling delay
/// starting at `initial_delay`, logging each attempt.
///
/// `op` should classify its own errors: returning `Err(ConnectorError::Io)`
/// or `Err(ConnectorError::Backend(_))` is treated as retriable; any other
/// error is returned immediately without retrying (matching §7 — only
/// backend unavailability is retriable, validation/constraint failures
/// never are, and this helper only ever sees connector-layer calls).
pub fn with_retry<T>(
    operation: &str,
    max_attempts: u32,
    initial_delay: Duration,
    mut op: impl FnMut() -> Result<T, ConnectorError>,
) -> Result<T, ConnectorError> {
    let mut delay = initial_delay;
    let mut last_err = None;
    for attempt in 1..=max_attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(operation, attempt, max_attempts, error = %err, "connector call failed");
                last_err = Some(err);
                if attempt < max_attempts {
                    sleep(delay);
                    delay *= 2;
                }
            }
        }
    }
    let cause = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts made".to_string());
    warn!(operation, max_attempts, %cause, "connector call exhausted retries");
    Err(ConnectorError::Unavailable {
        attempts: max_attempts,
        cause,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = Cell::new(0);
        let result = with_retry("test", 3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Ok::<_, ConnectorError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_then_succeeds() {
        let calls = Cell::new(0);
        let result = with_retry("test", 5, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(ConnectorError::Backend("transient".into()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry("test", 3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Err(ConnectorError::Backend("down".into()))
        });
        assert!(matches!(result, Err(ConnectorError::Unavailable { attempts: 3, .. })));
        assert_eq!(calls.get(), 3);
    }
}

//! Polling loops
//!
//! Every loop evaluates its condition first and only sleeps on a miss, so a
//! condition that already holds returns without delay. Sleeps are clamped to
//! the remaining budget: the last check happens at the deadline and the
//! timeout is reported at or shortly after it, never a full interval late.
//! In the async loops an awaiting condition is cut off at the deadline too,
//! and the cancellation token interrupts it.

use crate::error::{BoxError, Result, WaitError};
use crate::spec::WaitSpec;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Poll a synchronous condition until it yields a value
///
/// The condition returns `Ok(Some(value))` when satisfied and `Ok(None)` to
/// keep waiting. Suspension between checks yields to the runtime, so the
/// operation being awaited can make progress on the same scheduler.
///
/// # Errors
/// - [`WaitError::InvalidConfig`] before the first check if the `WaitSpec` is unusable
/// - [`WaitError::Condition`] as soon as the condition returns `Err`
/// - [`WaitError::Cancelled`] when the cancellation token fires
/// - [`WaitError::Timeout`] when the budget runs out
pub async fn poll_until<T, E, F>(spec: &WaitSpec, mut condition: F) -> Result<T>
where
    F: FnMut() -> std::result::Result<Option<T>, E>,
    E: Into<BoxError>,
{
    poll_until_async(spec, move || std::future::ready(condition())).await
}

/// Poll an asynchronous condition until it yields a value
///
/// Used when the check itself must await, e.g. reading from a database.
///
/// # Errors
/// Same as [`poll_until`]
pub async fn poll_until_async<T, E, F, Fut>(spec: &WaitSpec, mut condition: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
    E: Into<BoxError>,
{
    spec.validate()?;

    debug!(
        description = spec.description(),
        timeout = ?spec.timeout(),
        interval = ?spec.interval(),
        "Waiting for condition"
    );

    let start = Instant::now();
    let deadline = start + spec.timeout();
    let mut attempts: u32 = 0;

    loop {
        if is_cancelled(spec) {
            return Err(cancelled(spec, start.elapsed()));
        }

        // A slow check is bounded by the same deadline and token as the sleep.
        attempts += 1;
        let outcome = match spec.cancellation() {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return Err(cancelled(spec, start.elapsed())),
                    outcome = tokio::time::timeout_at(deadline, condition()) => outcome,
                }
            }
            None => tokio::time::timeout_at(deadline, condition()).await,
        };
        let Ok(outcome) = outcome else {
            return Err(timed_out(spec, start.elapsed(), attempts));
        };

        match outcome {
            Ok(Some(value)) => {
                debug!(
                    description = spec.description(),
                    attempts,
                    elapsed = ?start.elapsed(),
                    "Condition satisfied"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => return Err(condition_failed(spec, e.into())),
        }

        let elapsed = start.elapsed();
        let Some(pause) = next_pause(spec, elapsed) else {
            return Err(timed_out(spec, elapsed, attempts));
        };
        trace!(description = spec.description(), attempts, ?elapsed, "Condition not met yet");

        match spec.cancellation() {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return Err(cancelled(spec, start.elapsed())),
                    () = tokio::time::sleep(pause) => {}
                }
            }
            None => tokio::time::sleep(pause).await,
        }
    }
}

/// Poll a condition from a plain thread, sleeping between checks
///
/// For tests that do not run inside an async runtime. Cancellation is
/// observed between checks, so it takes effect within one interval.
///
/// # Errors
/// Same as [`poll_until`]
pub fn poll_until_blocking<T, E, F>(spec: &WaitSpec, mut condition: F) -> Result<T>
where
    F: FnMut() -> std::result::Result<Option<T>, E>,
    E: Into<BoxError>,
{
    spec.validate()?;

    let start = std::time::Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if is_cancelled(spec) {
            return Err(cancelled(spec, start.elapsed()));
        }

        attempts += 1;
        match condition() {
            Ok(Some(value)) => {
                debug!(
                    description = spec.description(),
                    attempts,
                    elapsed = ?start.elapsed(),
                    "Condition satisfied"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => return Err(condition_failed(spec, e.into())),
        }

        let elapsed = start.elapsed();
        let Some(pause) = next_pause(spec, elapsed) else {
            return Err(timed_out(spec, elapsed, attempts));
        };
        std::thread::sleep(pause);
    }
}

/// Wait until `condition` yields a value
///
/// # Errors
/// Same as [`poll_until`]
pub async fn wait_for<T, E, F>(
    condition: F,
    description: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<T>
where
    F: FnMut() -> std::result::Result<Option<T>, E>,
    E: Into<BoxError>,
{
    let spec = WaitSpec::new(description, timeout).with_interval(interval);
    poll_until(&spec, condition).await
}

/// Wait until `predicate` returns `true`
///
/// # Errors
/// Same as [`poll_until`], minus [`WaitError::Condition`]
pub async fn wait_until<F>(
    mut predicate: F,
    description: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()>
where
    F: FnMut() -> bool,
{
    wait_for(
        move || Ok::<_, Infallible>(predicate().then_some(())),
        description,
        timeout,
        interval,
    )
    .await
}

/// Sleep before the next check, or `None` once the budget is spent
fn next_pause(spec: &WaitSpec, elapsed: Duration) -> Option<Duration> {
    spec.timeout()
        .checked_sub(elapsed)
        .filter(|remaining| !remaining.is_zero())
        .map(|remaining| remaining.min(spec.interval()))
}

fn is_cancelled(spec: &WaitSpec) -> bool {
    spec.cancellation().is_some_and(|token| token.is_cancelled())
}

fn timed_out(spec: &WaitSpec, elapsed: Duration, attempts: u32) -> WaitError {
    warn!(
        description = spec.description(),
        attempts,
        ?elapsed,
        timeout = ?spec.timeout(),
        "Wait timed out"
    );
    WaitError::Timeout {
        description: spec.description().to_string(),
        timeout: spec.timeout(),
        elapsed,
    }
}

fn cancelled(spec: &WaitSpec, elapsed: Duration) -> WaitError {
    warn!(description = spec.description(), ?elapsed, "Wait cancelled");
    WaitError::Cancelled {
        description: spec.description().to_string(),
        elapsed,
    }
}

fn condition_failed(spec: &WaitSpec, source: BoxError) -> WaitError {
    warn!(description = spec.description(), error = %source, "Condition failed");
    WaitError::Condition {
        description: spec.description().to_string(),
        source,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const INTERVAL: Duration = Duration::from_millis(10);

    #[tokio::test(start_paused = true)]
    async fn test_already_true_returns_without_sleeping() {
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        let value = wait_for(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Some(42))
            },
            "answer",
            Duration::from_secs(1),
            INTERVAL,
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_becomes_true_within_one_interval() {
        let start = Instant::now();
        let ready_at = start + Duration::from_millis(50);

        wait_until(|| Instant::now() >= ready_at, "ready", Duration::from_secs(1), INTERVAL)
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed <= Duration::from_millis(50) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_true_times_out_at_deadline() {
        let start = Instant::now();

        let err = wait_until(|| false, "never", Duration::from_millis(200), INTERVAL)
            .await
            .unwrap_err();

        let elapsed = start.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(200) + INTERVAL);

        let message = err.to_string();
        assert!(message.contains("never"));
        assert!(message.contains("200ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_longer_than_timeout_is_clamped() {
        let start = Instant::now();

        let err = wait_until(
            || false,
            "slow poll",
            Duration::from_millis(25),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        let elapsed = start.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_millis(25));
        assert!(elapsed < Duration::from_millis(25) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_error_is_not_retried() {
        let calls = AtomicUsize::new(0);

        let err = wait_for(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<Option<()>, _>(std::io::Error::other("broken check"))
            },
            "broken",
            Duration::from_secs(1),
            INTERVAL,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, WaitError::Condition { .. }));
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("broken check"));
    }

    #[tokio::test]
    async fn test_misconfiguration_fails_before_first_check() {
        let calls = AtomicUsize::new(0);
        let check = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Some(()))
        };

        let err = wait_for(check, "zero timeout", Duration::ZERO, INTERVAL)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidConfig { .. }));

        let err = wait_for(check, "zero interval", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidConfig { .. }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_cancelled_token_fails_fast() {
        let token = CancellationToken::new();
        token.cancel();
        let spec = WaitSpec::new("teardown", Duration::from_secs(5)).with_cancellation(token);

        let err = poll_until(&spec, || Ok::<Option<()>, Infallible>(None))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.elapsed(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_sleep() {
        let token = CancellationToken::new();
        let spec = WaitSpec::new("hung operation", Duration::from_secs(5))
            .with_interval(Duration::from_secs(1))
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            token.cancel();
        });

        let start = Instant::now();
        let err = poll_until(&spec, || Ok::<Option<()>, Infallible>(None))
            .await
            .unwrap_err();
        canceller.await.unwrap();

        let elapsed = start.elapsed();
        assert!(err.is_cancelled());
        assert!(elapsed >= Duration::from_millis(30));
        assert!(elapsed < Duration::from_secs(1));
        assert!(err.to_string().contains("hung operation"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_condition_bounded_by_deadline() {
        let spec = WaitSpec::new("slow read", Duration::from_millis(100));
        let start = Instant::now();

        let err = poll_until_async(&spec, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<Option<()>, Infallible>(None)
        })
        .await
        .unwrap_err();

        let elapsed = start.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(100) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_slow_condition() {
        let token = CancellationToken::new();
        let spec = WaitSpec::new("stuck read", Duration::from_secs(30)).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let start = Instant::now();
        let err = poll_until_async(&spec, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<Option<()>, Infallible>(None)
        })
        .await
        .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_condition_sees_background_progress() {
        let counter = Arc::new(AtomicUsize::new(0));
        let producer = {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                for _ in 0..3 {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let spec = WaitSpec::new("three increments", Duration::from_secs(1));
        let seen = poll_until_async(&spec, || {
            let counter = Arc::clone(&counter);
            async move {
                let value = counter.load(Ordering::SeqCst);
                Ok::<_, Infallible>((value >= 3).then_some(value))
            }
        })
        .await
        .unwrap();

        producer.await.unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_blocking_waits_for_other_thread() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = {
            let flag = Arc::clone(&flag);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                flag.store(true, Ordering::SeqCst);
            })
        };

        let spec = WaitSpec::new("flag set", Duration::from_secs(5)).with_interval(Duration::from_millis(5));
        poll_until_blocking(&spec, || {
            Ok::<_, Infallible>(flag.load(Ordering::SeqCst).then_some(()))
        })
        .unwrap();

        setter.join().unwrap();
    }

    #[test]
    fn test_blocking_timeout_reports_description() {
        let spec = WaitSpec::new("never set", Duration::from_millis(50)).with_interval(Duration::from_millis(5));
        let start = std::time::Instant::now();

        let err = poll_until_blocking(&spec, || Ok::<Option<()>, Infallible>(None)).unwrap_err();

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("never set"));
    }

    #[test]
    fn test_blocking_observes_cancellation() {
        let token = CancellationToken::new();
        let spec = WaitSpec::new("aborted", Duration::from_secs(5))
            .with_interval(Duration::from_millis(5))
            .with_cancellation(token.clone());

        let calls = AtomicUsize::new(0);
        let err = poll_until_blocking(&spec, || {
            if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                token.cancel();
            }
            Ok::<Option<()>, Infallible>(None)
        })
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

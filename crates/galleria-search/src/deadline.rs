//! Bounded store calls.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::warn;

use galleria_core::{Error, Result};

/// Run one store call under a deadline.
///
/// Elapsed deadlines and store-side errors both come back as
/// [`Error::RetrievalFailure`]; client errors pass through. Calls slower
/// than `slow_threshold` are logged at WARN.
pub(crate) async fn bounded<T, F>(
    backend: &'static str,
    op: &'static str,
    timeout: Duration,
    slow_threshold: Duration,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, call).await;
    let elapsed = start.elapsed();

    if elapsed >= slow_threshold {
        warn!(
            subsystem = "search",
            component = "store",
            backend,
            op,
            duration_ms = elapsed.as_millis() as u64,
            slow = true,
            "Slow store call"
        );
    }

    match outcome {
        Ok(result) => result.map_err(Error::into_retrieval_failure),
        Err(_) => Err(Error::RetrievalFailure(format!(
            "{} {} timed out after {}ms",
            backend,
            op,
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_passes_value_through() {
        let value = bounded("memory", "count", LONG, LONG, async { Ok(3u64) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retrieval_failure() {
        let short = Duration::from_millis(10);
        let result: Result<u64> = bounded("memory", "count", short, LONG, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(1)
        })
        .await;
        match result {
            Err(Error::RetrievalFailure(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected RetrievalFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_wrapped() {
        let result: Result<u64> = bounded("postgres", "find", LONG, LONG, async {
            Err(Error::Config("connection refused".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::RetrievalFailure(_))));
    }

    #[tokio::test]
    async fn test_client_errors_pass_through() {
        let result: Result<u64> = bounded("memory", "find", LONG, LONG, async {
            Err(Error::invalid_parameter("limit"))
        })
        .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}

use crate::errors::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Polls `condition` every `interval` until it holds or `timeout` passes.
/// Returns whether the condition was observed; errors from the condition
/// are propagated.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn stops_as_soon_as_condition_holds() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let start = Instant::now();
        let seen = poll_until(Duration::from_secs(5), Duration::from_millis(250), move || async move {
            Ok(calls.fetch_add(1, Ordering::SeqCst) == 2)
        })
        .await
        .unwrap();
        assert!(seen);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_timeout() {
        let start = Instant::now();
        let seen = poll_until(Duration::from_secs(1), Duration::from_millis(250), || async { Ok(false) })
            .await
            .unwrap();
        assert!(!seen);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn propagates_condition_errors() {
        let result = poll_until(Duration::from_secs(1), Duration::from_millis(10), || async {
            Err(AgentError::JavaScriptTimeout)
        })
        .await;
        assert!(matches!(result, Err(AgentError::JavaScriptTimeout)));
    }
}

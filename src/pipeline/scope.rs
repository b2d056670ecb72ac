use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancellation scope for one analysis: a child of the caller's token that is
/// also cancelled when `duration` elapses, and when the scope is dropped.
///
/// Whichever fires first wins; cancellation never reverts.
#[derive(Debug)]
pub struct DeadlineScope {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl DeadlineScope {
    /// Must be called from within a tokio runtime
    pub fn new(parent: &CancellationToken, duration: Duration) -> Self {
        let token = parent.child_token();

        let timer_token = token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => timer_token.cancel(),
                _ = timer_token.cancelled() => {}
            }
        });

        Self { token, timer }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for DeadlineScope {
    fn drop(&mut self) {
        self.token.cancel();
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};

    #[tokio::test]
    async fn test_deadline_cancels_scope() {
        let parent = CancellationToken::new();
        let scope = DeadlineScope::new(&parent, Duration::from_millis(50));
        let start = Instant::now();

        timeout(Duration::from_secs(2), scope.token().cancelled())
            .await
            .expect("scope should be cancelled by its deadline");

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancellation_propagates() {
        let parent = CancellationToken::new();
        let scope = DeadlineScope::new(&parent, Duration::from_secs(60));

        parent.cancel();
        timeout(Duration::from_secs(1), scope.token().cancelled())
            .await
            .expect("parent cancellation should reach the scope");
    }

    #[tokio::test]
    async fn test_already_cancelled_parent() {
        let parent = CancellationToken::new();
        parent.cancel();

        let scope = DeadlineScope::new(&parent, Duration::from_secs(60));
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_scope() {
        let parent = CancellationToken::new();
        let scope = DeadlineScope::new(&parent, Duration::from_secs(60));
        let token = scope.token();

        drop(scope);
        assert!(token.is_cancelled());
        assert!(!parent.is_cancelled());
    }
}

use std::time::Duration;

use async_trait::async_trait;

/// Injectable sleep so pacing and backoff are testable without real
/// elapsed time. Production code uses `TokioSleeper`; tests record the
/// requested delays instead of waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// src/gateway/deadline.rs
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::GenerationError;

/// The deadline elapsed before the operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineElapsed(pub Duration);

impl From<DeadlineElapsed> for GenerationError {
    fn from(elapsed: DeadlineElapsed) -> Self {
        GenerationError::Timeout(elapsed.0)
    }
}

/// Race `operation` against a timer. If the timer wins the operation is dropped
/// and its eventual result is never observed.
pub async fn with_deadline<F, T>(operation: F, duration: Duration) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    timeout(duration, operation)
        .await
        .map_err(|_| DeadlineElapsed(duration))
}

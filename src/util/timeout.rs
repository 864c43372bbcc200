//! Deadlines for whole operations.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ParleyError, Result};

/// Run `operation` under a deadline covering every await inside it.
///
/// On expiry the future is dropped, so nothing it produced so far is used.
pub async fn within<T>(
    deadline: Duration,
    operation: &str,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    let ms = deadline.as_millis() as u64;
    tokio::time::timeout(deadline, future).await.unwrap_or_else(|_| {
        warn!(operation, ms, "deadline exceeded");
        Err(ParleyError::Timeout(ms))
    })
}

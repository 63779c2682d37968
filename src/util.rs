//! Shared utility functions.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::{Error, Result};

/// Bound a collaborator call; elapsed time becomes `Error::Timeout`.
pub async fn with_timeout<F, T>(duration: Duration, f: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, f).await {
        Ok(inner) => inner,
        Err(_) => Err(Error::Timeout(duration)),
    }
}

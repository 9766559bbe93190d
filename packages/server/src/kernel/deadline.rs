//! Deadline for calls into external stores.
//!
//! A call that outlives the limit fails like any other store error, so callers
//! map it to `StoreUnavailable` through the usual `?` conversion.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;

pub async fn with_deadline<T>(limit: Duration, op: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("store call exceeded {:?}", limit)),
    }
}

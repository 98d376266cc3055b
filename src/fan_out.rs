//! Concurrent fan-out helpers.
//!
//! Every unit of work is started at once and joined at a single merge point.
//! Callers choose between failing on the first error and collecting every
//! outcome; nothing here retries or times out.

use std::future::Future;

use anyhow::Result;
use futures::future::{join_all, try_join_all};

/// Run all futures concurrently. The first error aborts the whole set.
pub async fn all_or_nothing<I, F, T>(tasks: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    try_join_all(tasks).await
}

/// Run all futures concurrently and keep every outcome, in input order.
pub async fn settled<I, F, T>(tasks: I) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    join_all(tasks).await
}

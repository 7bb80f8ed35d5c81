//! # perf::optimistic
//!
//! Three-phase update: apply locally, await the durable call, then commit
//! (keep the local change) or roll back.
//!
//! `rollback` must be idempotent and free of side effects other than undoing
//! `apply`; it is only awaited on failure.

use std::future::Future;

pub async fn optimistic<T, E, A, C, R>(apply: A, call: C, rollback: R) -> Result<T, E>
where
    A: Future<Output = ()>,
    C: Future<Output = Result<T, E>>,
    R: Future<Output = ()>,
{
    apply.await;
    match call.await {
        Ok(value) => Ok(value),
        Err(err) => {
            rollback.await;
            Err(err)
        }
    }
}

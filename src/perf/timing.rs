//! # perf::timing
//!
//! Wraps a fallible future and logs how long it took.

use std::{fmt::Display, future::Future};

use tokio::time::Instant;
use tracing::{debug, warn};

pub async fn timed<F, T, E>(label: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(_) => debug!(label, elapsed_ms, "⚡ completed"),
        Err(e) => warn!(label, elapsed_ms, error = %e, "❌ failed"),
    }
    result
}

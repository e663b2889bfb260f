//! Conflict retry loop shared by the repositories.

use std::future::Future;

use apex_core::{LedgerError, RetryPolicy};
use tracing::{debug, warn};

use super::error::RepositoryError;

/// Runs `op`, a whole unit of work including its own `BEGIN`/`COMMIT`,
/// again after a serialization failure or deadlock, sleeping between
/// attempts.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() => {
                let conflict = LedgerError::ConcurrencyConflict;
                if !policy.should_retry(attempt, &conflict) {
                    warn!(operation, attempt, "giving up after repeated conflicts");
                    return Err(policy.exhausted(conflict).into());
                }
                debug!(operation, attempt, error = %err, "conflict, retrying unit of work");
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

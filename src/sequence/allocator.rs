//! Race-free counter allocation with bounded internal retry.

use crate::error::AppError;
use crate::sequence::{CounterStore, PgCounterStore, RetryPolicy, SequenceScope, SequenceValue};
use sqlx::{Connection, Postgres, Transaction};

/// Hands out distinct, increasing values per scope. Stateless apart from its
/// store handle; safe to share across tasks and service instances.
#[derive(Clone, Debug)]
pub struct SequenceAllocator<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: CounterStore> SequenceAllocator<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        SequenceAllocator { store, retry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Next value for the scope. Transient contention is retried here; callers only
    /// see a value, a non-transient error, or `AllocationExhausted`.
    pub async fn next_value(&self, scope: &SequenceScope) -> Result<SequenceValue, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.increment(scope).await {
                Ok(raw) => return SequenceValue::try_from(raw),
                Err(e) if e.is_transient() => self.back_off(scope, attempt, &e).await?,
                Err(e) => return Err(e),
            }
        }
    }

    async fn back_off(&self, scope: &SequenceScope, attempt: u32, e: &AppError) -> Result<(), AppError> {
        if attempt >= self.retry.max_attempts {
            tracing::error!(scope = %scope.key(), attempts = attempt, error = %e, "sequence allocation exhausted");
            return Err(AppError::AllocationExhausted {
                scope: scope.key(),
                attempts: attempt,
            });
        }
        let delay = self.retry.delay_after(attempt);
        tracing::warn!(scope = %scope.key(), attempt, delay_ms = delay.as_millis() as u64, error = %e, "sequence allocation conflict, retrying");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

impl SequenceAllocator<PgCounterStore> {
    /// Allocate inside the caller's transaction. Each attempt runs under its own
    /// savepoint so a failed attempt leaves the outer transaction usable. The counter
    /// row stays locked until the caller commits; a rollback releases the value unused.
    pub async fn next_value_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        scope: &SequenceScope,
    ) -> Result<SequenceValue, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut savepoint = Connection::begin(&mut **tx).await?;
            match self.store.increment_on(&mut savepoint, scope).await {
                Ok(raw) => {
                    savepoint.commit().await?;
                    return SequenceValue::try_from(raw);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    if !e.is_transient() {
                        return Err(e);
                    }
                    self.back_off(scope, attempt, &e).await?;
                }
            }
        }
    }
}

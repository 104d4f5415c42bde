//! Retrying store writes under contention.

use std::future::Future;

use vitis_core::store::StoreError;

use crate::config::RetryPolicy;

/// Run `op` until it succeeds, fails with a non-contention error, or
/// `policy.attempts` is exhausted. The last error is returned as is.
pub async fn with_retry<T, E, Fut>(
  policy: RetryPolicy,
  what: &str,
  mut op: impl FnMut() -> Fut,
) -> Result<T, E>
where
  E: StoreError,
  Fut: Future<Output = Result<T, E>>,
{
  let mut attempt = 1;
  loop {
    match op().await {
      Err(e) if e.is_contention() && attempt < policy.attempts => {
        let wait = policy.base * attempt;
        tracing::warn!(what, attempt, ?wait, error = %e, "store busy, retrying");
        tokio::time::sleep(wait).await;
        attempt += 1;
      }
      result => return result,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::Cell,
    fmt,
    time::Duration,
  };

  use super::*;

  #[derive(Debug)]
  struct Fake {
    contention: bool,
  }

  impl fmt::Display for Fake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "fake") }
  }

  impl std::error::Error for Fake {}

  impl StoreError for Fake {
    fn is_contention(&self) -> bool { self.contention }

    fn is_duplicate(&self) -> bool { false }
  }

  const POLICY: RetryPolicy = RetryPolicy { attempts: 3, base: Duration::ZERO };

  #[tokio::test]
  async fn retries_contention_then_succeeds() {
    let calls = Cell::new(0);
    let result = with_retry(POLICY, "test", || {
      calls.set(calls.get() + 1);
      let n = calls.get();
      async move { if n < 3 { Err(Fake { contention: true }) } else { Ok(n) } }
    })
    .await;
    assert_eq!(result.unwrap(), 3);
  }

  #[tokio::test]
  async fn gives_up_after_attempts() {
    let calls = Cell::new(0);
    let result: Result<(), _> = with_retry(POLICY, "test", || {
      calls.set(calls.get() + 1);
      async { Err(Fake { contention: true }) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.get(), 3);
  }

  #[tokio::test]
  async fn other_errors_are_not_retried() {
    let calls = Cell::new(0);
    let result: Result<(), _> = with_retry(POLICY, "test", || {
      calls.set(calls.get() + 1);
      async { Err(Fake { contention: false }) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.get(), 1);
  }
}

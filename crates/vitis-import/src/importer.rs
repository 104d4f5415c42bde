use std::{future::Future, time::Duration};

use vitis_core::store::GrapeStore;
use vitis_scrape::{VivcUrls, encyclopedia::EncyclopediaUrls};

use crate::{
  Error, Fetcher, Result, Settings,
  config::{Pacing, RetryPolicy},
  retry::with_retry,
};

/// Everything a pass needs: the store, a fetcher, URL builders, pacing and
/// the retry policy. The passes themselves are methods defined in their
/// own modules.
pub struct Importer<'a, S, F> {
  pub store:        &'a S,
  pub fetcher:      &'a F,
  pub vivc:         VivcUrls,
  pub encyclopedia: EncyclopediaUrls,
  pub pacing:       Pacing,
  pub retry:        RetryPolicy,
}

impl<'a, S: GrapeStore, F: Fetcher> Importer<'a, S, F> {
  pub fn new(store: &'a S, fetcher: &'a F, settings: &Settings) -> Result<Self> {
    Ok(Self {
      store,
      fetcher,
      vivc: VivcUrls::new(&settings.vivc_base_url)?,
      encyclopedia: EncyclopediaUrls::new(&settings.encyclopedia_base_url)?,
      pacing: settings.pacing(),
      retry: settings.retry(),
    })
  }

  /// A store write, retried under contention.
  pub(crate) async fn write<T, Fut>(&self, what: &str, op: impl FnMut() -> Fut) -> Result<T>
  where
    Fut: Future<Output = Result<T, S::Error>>,
  {
    with_retry(self.retry, what, op).await.map_err(Error::store)
  }

  pub(crate) async fn pause(&self, delay: Duration) {
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
  }
}

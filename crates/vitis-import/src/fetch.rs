//! Page fetching.

use std::{future::Future, time::Duration};

use reqwest::Client;

use crate::error::FetchError;

/// Source of page bodies, keyed by absolute URL.
pub trait Fetcher: Send + Sync {
  /// Body of the page at `url`. Non-2xx answers are errors.
  fn fetch<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<String, FetchError>> + Send + 'a;
}

/// [`Fetcher`] over HTTP with a fixed per-request timeout.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(user_agent)
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  async fn fetch<'a>(&'a self, url: &'a str) -> Result<String, FetchError> {
    let transport = |source: reqwest::Error| FetchError::Transport { url: url.to_owned(), source };

    tracing::debug!(url, "GET");
    let resp = self.client.get(url).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status { url: url.to_owned(), status: status.as_u16() });
    }
    resp.text().await.map_err(transport)
  }
}

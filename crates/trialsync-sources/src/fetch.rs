//! HTTP access for the adapters.

use std::{future::Future, time::Duration};

use reqwest::Client;

use crate::{Error, Result};

/// Retrieve the body of a URL as text.
///
/// A non-2xx response is an error, the same as a transport failure.
pub trait Fetch: Send + Sync {
  fn get<'a>(&'a self, url: &'a str) -> impl Future<Output = Result<String>> + Send + 'a;
}

/// [`Fetch`] over a shared [`reqwest::Client`].
///
/// Cheap to clone; the inner client is `Arc`-based.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(concat!("trialsync/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client })
  }
}

impl Fetch for HttpFetcher {
  async fn get(&self, url: &str) -> Result<String> {
    let resp = self.client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        url:    url.to_owned(),
        status: status.as_u16(),
      });
    }
    Ok(resp.text().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn returns_body_on_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/page")
      .with_status(200)
      .with_body("hello")
      .create_async()
      .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = fetcher.get(&format!("{}/page", server.url())).await.unwrap();
    assert_eq!(body, "hello");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/page")
      .with_status(503)
      .create_async()
      .await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
      .get(&format!("{}/page", server.url()))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
  }
}

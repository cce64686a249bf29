use crate::pinning::protocol::NetworkError;
use reqwest::{header::CONTENT_LENGTH, Client, Url};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Learns the size of remote content with a `HEAD` request.
#[derive(Debug, Clone)]
pub struct SizeProbe {
  client: Client,
  timeout: Duration,
}

impl SizeProbe {
  pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| NetworkError::from_reqwest("", e))?;

    Ok(Self { client, timeout })
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Returns the advertised `Content-Length`, or `None` when the server does
  /// not send one.
  pub async fn probe(
    &self,
    url: &Url,
    cancel: &CancellationToken,
  ) -> Result<Option<u64>, NetworkError> {
    log::debug!("Probing size of {url}");

    let response = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        log::debug!("Probe of {url} cancelled");
        return Err(NetworkError::Cancelled);
      }
      response = self.client.head(url.clone()).send() => {
        response.map_err(|e| NetworkError::from_reqwest(url.as_str(), e))?
      }
    };

    let status = response.status();
    if !status.is_success() {
      return Err(NetworkError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    // Response::content_length reports the empty body of a HEAD response.
    let size = response
      .headers()
      .get(CONTENT_LENGTH)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse::<u64>().ok());

    log::debug!("Probe of {url}: {size:?} bytes");

    Ok(size)
  }
}

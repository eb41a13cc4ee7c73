//! HTTP source probing.
//!
//! Implements [`SourceProber`] with a single `HEAD` request: redirects are
//! followed (up to [`MAX_REDIRECTS`] hops) and `Content-Length` is read from
//! the final response. Any failure degrades to "nothing known" instead of an
//! error.

use std::time::Duration;

use async_trait::async_trait;
use introskip_core::{Error, Result, SourceDescriptor, SourceProber};
use reqwest::header::CONTENT_LENGTH;
use reqwest::redirect::Policy;

/// Redirect hops followed before giving up on a source.
pub const MAX_REDIRECTS: usize = 10;

/// A [`SourceProber`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSourceProber {
    client: reqwest::Client,
}

impl HttpSourceProber {
    /// Create a prober whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Probe `url`, reporting failures instead of degrading.
    pub async fn try_probe(&self, url: &str) -> Result<SourceDescriptor> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("HEAD request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Probe(format!("HEAD returned {status}")));
        }

        // Read the header rather than the body size hint, which is zero for
        // HEAD responses.
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        Ok(SourceDescriptor {
            final_url: response.url().to_string(),
            content_length,
        })
    }
}

#[async_trait]
impl SourceProber for HttpSourceProber {
    fn name(&self) -> &'static str {
        "http-head"
    }

    async fn probe(&self, url: &str) -> SourceDescriptor {
        match self.try_probe(url).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!(error = %e, "Probe failed; assuming unknown length");
                SourceDescriptor::unknown(url)
            }
        }
    }
}

//! The [`SourceProber`] trait for resolving a remote source before any byte
//! ranges are computed.

use async_trait::async_trait;

use crate::source::SourceDescriptor;

/// Resolves redirects and the total length of a remote media URL.
///
/// Implementations never fail: when the origin cannot be reached they return
/// [`SourceDescriptor::unknown`] so the pipeline carries on with the original
/// URL and an unknown length.
#[async_trait]
pub trait SourceProber: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe `url` without fetching its body.
    async fn probe(&self, url: &str) -> SourceDescriptor;
}

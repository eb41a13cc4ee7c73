//! The [`OffsetResolver`] trait mapping a playback time to a byte offset.

use async_trait::async_trait;

/// Finds the byte offset of the last keyframe at or before a given time.
///
/// `None` covers every way the lookup can fail (tool missing, non-zero exit,
/// timeout, unparseable output, no keyframe in range). It is a downgrade
/// signal for the caller, never an error.
#[async_trait]
pub trait OffsetResolver: Send + Sync {
    /// Human-readable name identifying this resolver implementation.
    fn name(&self) -> &'static str;

    /// Resolve `time_secs` within the media at `url`.
    ///
    /// Implementations must return `None` without doing any work when
    /// `time_secs <= 0`.
    async fn resolve_offset(&self, url: &str, time_secs: f64) -> Option<u64>;
}

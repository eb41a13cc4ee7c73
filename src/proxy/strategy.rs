//! Manifest strategies, tried strongest first.
//!
//! Each [`Strategy`] either produces a playlist or returns `None`, which
//! means "downgrade to the next one". Nothing here returns an error: every
//! failure is logged and turned into a downgrade.

use std::fmt;

use dashmap::DashMap;
use introskip_core::{BreakPoint, OffsetResolver, SourceDescriptor, SpliceRequest};
use introskip_hls::{ManifestBuilder, MediaPlaylist};

/// Order in which strategies are attempted.
pub const STRATEGY_CHAIN: [Strategy; 2] = [Strategy::Splice, Strategy::SimpleSkip];

/// One way of turning a request into a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cut `[intro_start, intro_end)` out of the source.
    Splice,
    /// Start playback at a single marker.
    SimpleSkip,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Splice => "splice",
            Strategy::SimpleSkip => "simple-skip",
        }
    }

    /// Try this strategy, returning the playlist on success.
    pub async fn attempt(self, ctx: &StrategyContext<'_>) -> Option<MediaPlaylist> {
        match self {
            Strategy::Splice => attempt_splice(ctx).await,
            Strategy::SimpleSkip => attempt_simple_skip(ctx).await,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a strategy needs for one request.
///
/// Offset lookups go through [`StrategyContext::break_point`], which remembers
/// every answer (including misses) so a later tier never repeats a lookup an
/// earlier tier already paid for.
pub struct StrategyContext<'a> {
    pub resolver: &'a dyn OffsetResolver,
    pub builder: ManifestBuilder,
    pub declared_duration: u32,
    pub request: &'a SpliceRequest,
    pub source: &'a SourceDescriptor,
    resolved: DashMap<u64, Option<BreakPoint>>,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        resolver: &'a dyn OffsetResolver,
        builder: ManifestBuilder,
        declared_duration: u32,
        request: &'a SpliceRequest,
        source: &'a SourceDescriptor,
    ) -> Self {
        Self {
            resolver,
            builder,
            declared_duration,
            request,
            source,
            resolved: DashMap::new(),
        }
    }

    /// Keyframe break point for `time_secs` in the probed source, resolved at
    /// most once per request.
    pub async fn break_point(&self, time_secs: f64) -> Option<BreakPoint> {
        let key = time_secs.to_bits();
        let known = self.resolved.get(&key).map(|entry| *entry);
        if let Some(point) = known {
            return point;
        }

        let point = self
            .resolver
            .resolve_offset(&self.source.final_url, time_secs)
            .await
            .map(|byte_offset| BreakPoint {
                time_secs,
                byte_offset,
            });
        self.resolved.insert(key, point);
        point
    }
}

async fn attempt_splice(ctx: &StrategyContext<'_>) -> Option<MediaPlaylist> {
    let request = ctx.request;
    if !request.is_splice() {
        return None;
    }

    let url = ctx.source.final_url.as_str();
    let (start, end) = tokio::join!(
        ctx.break_point(request.intro_start),
        ctx.break_point(request.intro_end),
    );

    let (Some(start), Some(end)) = (start, end) else {
        tracing::warn!(
            intro_start = request.intro_start,
            intro_end = request.intro_end,
            start_found = start.is_some(),
            end_found = end.is_some(),
            "Failed to find splice points"
        );
        return None;
    };

    match ctx.builder.splice(
        url,
        ctx.declared_duration,
        start.byte_offset,
        end.byte_offset,
        ctx.source.content_length,
    ) {
        Ok(playlist) => {
            tracing::info!(
                start_offset = start.byte_offset,
                end_offset = end.byte_offset,
                "Splicing at bytes"
            );
            Some(playlist)
        }
        Err(e) => {
            tracing::warn!(
                start_secs = start.time_secs,
                end_secs = end.time_secs,
                error = %e,
                "Splice manifest rejected"
            );
            None
        }
    }
}

async fn attempt_simple_skip(ctx: &StrategyContext<'_>) -> Option<MediaPlaylist> {
    let target = ctx.request.skip_target()?;
    let url = ctx.source.final_url.as_str();

    let offset = match ctx.break_point(target).await.map(|p| p.byte_offset) {
        // A keyframe at byte 0 would replay everything.
        Some(0) | None => {
            tracing::warn!(target_secs = target, "Failed to find offset for skip target");
            return None;
        }
        Some(offset) => offset,
    };

    match ctx.builder.simple_skip(
        url,
        ctx.declared_duration,
        offset,
        ctx.source.content_length,
        target,
    ) {
        Ok(playlist) => {
            tracing::info!(target_secs = target, offset, "Skipping to byte offset");
            Some(playlist)
        }
        Err(e) => {
            tracing::warn!(target_secs = target, error = %e, "Skip manifest rejected");
            None
        }
    }
}

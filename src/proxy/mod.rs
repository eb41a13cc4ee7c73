//! The manifest proxy.
//!
//! [`SkipProxy::resolve`] turns a source URL and an intro interval into either
//! a byte-range playlist or an instruction to play the original source:
//!
//! 1. a cached manifest for the same request is returned as-is;
//! 2. the source is probed for redirects and length;
//! 3. [`STRATEGY_CHAIN`] is walked until one strategy yields a playlist,
//!    which is cached and returned;
//! 4. otherwise the caller is sent back to the original URL. Fallbacks are
//!    never cached, so a transient failure heals on the next request.

mod cache;
mod strategy;

pub use cache::{start_cleanup_task, ManifestCache};
pub use strategy::{Strategy, StrategyContext, STRATEGY_CHAIN};

use std::path::PathBuf;
use std::sync::Arc;

use introskip_av::FfprobeOffsetResolver;
use introskip_core::config::Config;
use introskip_core::{ManifestResult, OffsetResolver, SourceProber, SpliceRequest};
use introskip_hls::ManifestBuilder;

use crate::probe::HttpSourceProber;

/// Request-level orchestration of probing, offset lookup and synthesis.
pub struct SkipProxy {
    prober: Arc<dyn SourceProber>,
    resolver: Arc<dyn OffsetResolver>,
    cache: Arc<ManifestCache>,
    builder: ManifestBuilder,
    declared_duration: u32,
}

impl SkipProxy {
    pub fn new(
        prober: Arc<dyn SourceProber>,
        resolver: Arc<dyn OffsetResolver>,
        cache: Arc<ManifestCache>,
        builder: ManifestBuilder,
        declared_duration: u32,
    ) -> Self {
        Self {
            prober,
            resolver,
            cache,
            builder,
            declared_duration,
        }
    }

    /// Wire the HTTP prober and ffprobe resolver from configuration.
    pub fn from_config(config: &Config, cache: Arc<ManifestCache>) -> introskip_core::Result<Self> {
        let proxy = &config.proxy;
        let prober = HttpSourceProber::new(proxy.probe_timeout())?;
        let resolver = FfprobeOffsetResolver::from_config(&config.tools, proxy.offset_timeout())
            .unwrap_or_else(|| {
                tracing::warn!("ffprobe not found; every request will fall back to the source");
                FfprobeOffsetResolver::new(PathBuf::from("ffprobe"), proxy.offset_timeout())
            });

        Ok(Self::new(
            Arc::new(prober),
            Arc::new(resolver),
            cache,
            ManifestBuilder::new(proxy.header_budget_bytes),
            proxy.declared_duration_secs,
        ))
    }

    /// The cache this proxy writes successful manifests to.
    pub fn cache(&self) -> &Arc<ManifestCache> {
        &self.cache
    }

    /// Resolve a skip/splice request. Never fails.
    pub async fn resolve(&self, source_url: &str, intro_start: f64, intro_end: f64) -> ManifestResult {
        self.resolve_request(&SpliceRequest::new(source_url, intro_start, intro_end))
            .await
    }

    /// Resolve an already-built request. Never fails.
    pub async fn resolve_request(&self, request: &SpliceRequest) -> ManifestResult {
        let key = request.cache_key();
        if let Some(document) = self.cache.get(&key) {
            tracing::debug!(
                intro_start = request.intro_start,
                intro_end = request.intro_end,
                "Serving cached manifest"
            );
            return ManifestResult::manifest(document.to_string());
        }

        tracing::info!(
            intro_start = request.intro_start,
            intro_end = request.intro_end,
            "Generating manifest"
        );

        let source = self.prober.probe(&request.source_url).await;
        if source.final_url != request.source_url {
            tracing::info!(final_url = %source.final_url, "Resolved redirect");
        }
        tracing::debug!(content_length = ?source.content_length, "Probed source");

        let ctx = StrategyContext::new(
            self.resolver.as_ref(),
            self.builder,
            self.declared_duration,
            request,
            &source,
        );

        for strategy in STRATEGY_CHAIN {
            if let Some(playlist) = strategy.attempt(&ctx).await {
                let body = playlist.render();
                self.cache.insert(key, body.as_str());
                tracing::info!(strategy = %strategy, "Manifest generated");
                return ManifestResult::manifest(body);
            }
            tracing::debug!(strategy = %strategy, "Strategy produced no manifest");
        }

        tracing::info!("Falling back to original source");
        ManifestResult::fallback(request.source_url.clone())
    }
}

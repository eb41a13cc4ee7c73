//! Shared test doubles for integration tests.
//!
//! Provides a [`FixedProber`] and a [`TableResolver`] that count their calls,
//! plus [`TestHarness`] which wires them into a [`SkipProxy`] and router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use introskip::proxy::{ManifestCache, SkipProxy};
use introskip::server::{create_router, AppContext};
use introskip_core::{OffsetResolver, SourceDescriptor, SourceProber};
use introskip_hls::ManifestBuilder;

/// Prober returning a fixed descriptor for every URL.
pub struct FixedProber {
    final_url: Option<String>,
    content_length: Option<u64>,
    calls: AtomicUsize,
}

impl FixedProber {
    /// Report `final_url` (or the request URL when `None`) and `content_length`.
    pub fn new(final_url: Option<&str>, content_length: Option<u64>) -> Self {
        Self {
            final_url: final_url.map(str::to_string),
            content_length,
            calls: AtomicUsize::new(0),
        }
    }

    /// Behave like a failed probe.
    pub fn unreachable() -> Self {
        Self::new(None, None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProber for FixedProber {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn probe(&self, url: &str) -> SourceDescriptor {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SourceDescriptor {
            final_url: self.final_url.clone().unwrap_or_else(|| url.to_string()),
            content_length: self.content_length,
        }
    }
}

/// Resolver answering from a seconds → byte offset table.
pub struct TableResolver {
    offsets: HashMap<u64, u64>,
    calls: AtomicUsize,
}

impl TableResolver {
    pub fn new(entries: &[(f64, u64)]) -> Self {
        Self {
            offsets: entries.iter().map(|&(t, o)| (t.to_bits(), o)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OffsetResolver for TableResolver {
    fn name(&self) -> &'static str {
        "table"
    }

    async fn resolve_offset(&self, _url: &str, time_secs: f64) -> Option<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.offsets.get(&time_secs.to_bits()).copied()
    }
}

/// A proxy built from counting doubles, with handles kept for assertions.
pub struct TestHarness {
    pub prober: Arc<FixedProber>,
    pub resolver: Arc<TableResolver>,
    pub cache: Arc<ManifestCache>,
    pub proxy: Arc<SkipProxy>,
}

impl TestHarness {
    pub fn new(prober: FixedProber, resolver: TableResolver) -> Self {
        let prober = Arc::new(prober);
        let resolver = Arc::new(resolver);
        let cache = Arc::new(ManifestCache::new(64, None));
        let proxy = Arc::new(SkipProxy::new(
            prober.clone(),
            resolver.clone(),
            cache.clone(),
            ManifestBuilder::default(),
            7200,
        ));

        Self {
            prober,
            resolver,
            cache,
            proxy,
        }
    }

    pub fn router(&self) -> Router {
        create_router(AppContext {
            proxy: self.proxy.clone(),
        })
    }
}

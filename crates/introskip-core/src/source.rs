//! Request-scoped domain types.
//!
//! Nothing here is persisted: a [`SpliceRequest`] arrives from the caller, the
//! prober produces a [`SourceDescriptor`], each resolved time marker becomes a
//! [`BreakPoint`], and the pipeline ends in a [`ManifestResult`].

use serde::{Deserialize, Serialize};

/// MIME type of every manifest document.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// What is known about a remote source after probing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// URL after following every redirect. Byte ranges must target this.
    pub final_url: String,
    /// Total length in bytes. `None` when the origin did not report one;
    /// `Some(0)` is a real, empty resource.
    pub content_length: Option<u64>,
}

impl SourceDescriptor {
    /// Descriptor that assumes nothing: original URL, unknown length.
    pub fn unknown(url: impl Into<String>) -> Self {
        Self {
            final_url: url.into(),
            content_length: None,
        }
    }
}

/// A requested time marker mapped to the byte offset of its keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakPoint {
    pub time_secs: f64,
    pub byte_offset: u64,
}

/// A caller's request to skip or splice out part of a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceRequest {
    pub source_url: String,
    pub intro_start: f64,
    pub intro_end: f64,
}

impl SpliceRequest {
    /// Build a request, clamping negative or non-finite markers to `0`.
    pub fn new(source_url: impl Into<String>, intro_start: f64, intro_end: f64) -> Self {
        Self {
            source_url: source_url.into(),
            intro_start: sanitize_marker(intro_start),
            intro_end: sanitize_marker(intro_end),
        }
    }

    /// Both markers are set and describe a non-empty interval.
    pub fn is_splice(&self) -> bool {
        self.intro_start > 0.0 && self.intro_end > self.intro_start
    }

    /// Time a simple skip should jump to: the end marker when set, else the
    /// start marker. `None` when neither is positive.
    pub fn skip_target(&self) -> Option<f64> {
        let target = if self.intro_end > 0.0 {
            self.intro_end
        } else {
            self.intro_start
        };
        (target > 0.0).then_some(target)
    }

    /// Key under which a successful manifest for this request is cached.
    pub fn cache_key(&self) -> String {
        format!("{}_{}_{}", self.source_url, self.intro_start, self.intro_end)
    }
}

fn sanitize_marker(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

/// The only two outcomes visible to a playback client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestResult {
    /// A rendered playlist to serve as-is.
    Manifest {
        content_type: &'static str,
        body: String,
    },
    /// Send the client to the original, unmodified source.
    Fallback { redirect_to: String },
}

impl ManifestResult {
    pub fn manifest(body: impl Into<String>) -> Self {
        ManifestResult::Manifest {
            content_type: PLAYLIST_CONTENT_TYPE,
            body: body.into(),
        }
    }

    pub fn fallback(redirect_to: impl Into<String>) -> Self {
        ManifestResult::Fallback {
            redirect_to: redirect_to.into(),
        }
    }

    pub fn is_manifest(&self) -> bool {
        matches!(self, ManifestResult::Manifest { .. })
    }
}

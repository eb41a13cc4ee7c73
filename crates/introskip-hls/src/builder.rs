//! Manifest synthesis from resolved byte offsets.
//!
//! Both builders are pure: they take offsets already resolved against the
//! source and lay out byte-range segments of that same URL. Every document
//! starts with a header segment `[0, header_budget)` so a player that begins
//! decoding mid-file still has the container's leading metadata.
//!
//! Builders refuse (with [`Error::Invariant`]) rather than emit a playlist
//! containing an empty or inverted range.

use introskip_core::config::HEADER_BUDGET_BYTES;
use introskip_core::{Error, Result};

use crate::playlist::{ByteRange, MediaPlaylist, SegmentEntry};

/// Nominal EXTINF of the header segment.
const HEADER_SEGMENT_SECS: f64 = 1.0;

/// Lays out skip and splice playlists against a remote source.
#[derive(Debug, Clone, Copy)]
pub struct ManifestBuilder {
    header_budget: u64,
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new(HEADER_BUDGET_BYTES)
    }
}

impl ManifestBuilder {
    pub fn new(header_budget: u64) -> Self {
        Self { header_budget }
    }

    pub fn header_budget(&self) -> u64 {
        self.header_budget
    }

    /// Playlist that plays the header, then everything from `byte_offset`.
    ///
    /// `total_length == None` leaves the body open-ended. `start_time_secs` is
    /// only recorded as the body segment title.
    pub fn simple_skip(
        &self,
        url: &str,
        declared_duration: u32,
        byte_offset: u64,
        total_length: Option<u64>,
        start_time_secs: f64,
    ) -> Result<MediaPlaylist> {
        self.check_layout(declared_duration)?;

        let body = match total_length {
            Some(total) if byte_offset >= total => {
                return Err(Error::invariant(format!(
                    "skip offset {byte_offset} is not before end of source ({total} bytes)"
                )));
            }
            Some(total) => ByteRange::new(byte_offset, total),
            None => ByteRange::open(byte_offset),
        };

        let mut playlist = MediaPlaylist::vod(declared_duration);
        playlist.push(self.header_segment(url));
        playlist.push(SegmentEntry {
            duration: f64::from(declared_duration),
            uri: url.to_string(),
            title: Some(format!("skip={start_time_secs:.3}")),
            discontinuity: false,
            byte_range: body,
        });
        Ok(playlist)
    }

    /// Playlist that plays everything except `[start_offset, end_offset)`.
    ///
    /// Content between the header budget and `start_offset` is kept as its
    /// own segment; when `start_offset` falls inside the budget the header
    /// already covers it. The post-interval segment is flagged as a
    /// discontinuity.
    ///
    /// An interval that ends inside the header budget cannot be removed, since
    /// the header segment would still play it, and is rejected.
    pub fn splice(
        &self,
        url: &str,
        declared_duration: u32,
        start_offset: u64,
        end_offset: u64,
        total_length: Option<u64>,
    ) -> Result<MediaPlaylist> {
        self.check_layout(declared_duration)?;

        if start_offset >= end_offset {
            return Err(Error::invariant(format!(
                "splice end offset {end_offset} is not after start offset {start_offset}"
            )));
        }

        if end_offset <= self.header_budget {
            return Err(Error::invariant(format!(
                "splice end offset {end_offset} lies inside the {} byte header",
                self.header_budget
            )));
        }

        let post = match total_length {
            Some(total) if end_offset >= total => {
                return Err(Error::invariant(format!(
                    "splice end offset {end_offset} leaves nothing of a {total} byte source"
                )));
            }
            Some(total) => ByteRange::new(end_offset, total),
            None => ByteRange::open(end_offset),
        };

        let mut playlist = MediaPlaylist::vod(declared_duration);
        playlist.push(self.header_segment(url));

        if start_offset > self.header_budget {
            playlist.push(SegmentEntry {
                duration: f64::from(declared_duration),
                uri: url.to_string(),
                title: None,
                discontinuity: false,
                byte_range: ByteRange::new(self.header_budget, start_offset),
            });
        }

        playlist.push(SegmentEntry {
            duration: f64::from(declared_duration),
            uri: url.to_string(),
            title: None,
            discontinuity: true,
            byte_range: post,
        });
        Ok(playlist)
    }

    fn check_layout(&self, declared_duration: u32) -> Result<()> {
        if declared_duration == 0 {
            return Err(Error::invariant("declared duration must be positive"));
        }
        if self.header_budget == 0 {
            return Err(Error::invariant("header budget must be positive"));
        }
        Ok(())
    }

    fn header_segment(&self, url: &str) -> SegmentEntry {
        SegmentEntry {
            duration: HEADER_SEGMENT_SECS,
            uri: url.to_string(),
            title: None,
            discontinuity: false,
            byte_range: ByteRange::new(0, self.header_budget),
        }
    }
}

//! HLS media playlist structures.

use std::fmt::{self, Write};

/// Exclusive upper bound written for a range whose end is unknown.
///
/// Origins clamp a byte range that runs past the resource to its last byte,
/// so this reads "to the end of the file". Must stay exactly representable
/// as an `f64`: hls.js computes `offset + length` in floating point.
pub const OPEN_RANGE_END: u64 = 1 << 53;

/// A half-open byte range `[start, end)` of the source. `end == None` runs to
/// the end of the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn open(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Number of bytes a player will request for this range.
    pub fn len(&self) -> u64 {
        self.end.unwrap_or(OPEN_RANGE_END).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ByteRange {
    /// `<length>@<offset>`, the `EXT-X-BYTERANGE` value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.len(), self.start)
    }
}

/// A segment entry in the playlist.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    /// Duration in seconds.
    pub duration: f64,
    /// Segment URI.
    pub uri: String,
    /// Optional title.
    pub title: Option<String>,
    /// Discontinuity before this segment.
    pub discontinuity: bool,
    /// Addressed bytes of `uri`.
    pub byte_range: ByteRange,
}

/// A VOD media playlist whose segments are byte ranges of remote files.
#[derive(Debug, Clone)]
pub struct MediaPlaylist {
    /// Target duration in seconds.
    pub target_duration: u32,
    /// Media sequence number.
    pub media_sequence: u32,
    /// Segment entries.
    pub segments: Vec<SegmentEntry>,
}

impl MediaPlaylist {
    /// Create an empty VOD playlist.
    pub fn vod(target_duration: u32) -> Self {
        Self {
            target_duration,
            media_sequence: 0,
            segments: Vec::new(),
        }
    }

    /// Append a segment.
    pub fn push(&mut self, segment: SegmentEntry) {
        self.segments.push(segment);
    }

    /// Render to M3U8 string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "#EXTM3U")?;
        // EXT-X-BYTERANGE needs protocol version 4.
        writeln!(out, "#EXT-X-VERSION:4")?;
        writeln!(out, "#EXT-X-TARGETDURATION:{}", self.target_duration)?;
        writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{}", self.media_sequence)?;
        writeln!(out, "#EXT-X-PLAYLIST-TYPE:VOD")?;

        for segment in &self.segments {
            if segment.discontinuity {
                writeln!(out, "#EXT-X-DISCONTINUITY")?;
            }
            writeln!(out, "#EXT-X-BYTERANGE:{}", segment.byte_range)?;
            match segment.title {
                Some(ref title) => writeln!(out, "#EXTINF:{:.6},{}", segment.duration, title)?,
                None => writeln!(out, "#EXTINF:{:.6},", segment.duration)?,
            }
            writeln!(out, "{}", segment.uri)?;
        }

        writeln!(out, "#EXT-X-ENDLIST")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_playlist_render() {
        let mut playlist = MediaPlaylist::vod(7200);
        playlist.push(SegmentEntry {
            duration: 1.0,
            uri: "http://cdn/v.mp4".to_string(),
            title: None,
            discontinuity: false,
            byte_range: ByteRange::new(0, 1_000_000),
        });
        playlist.push(SegmentEntry {
            duration: 7200.0,
            uri: "http://cdn/v.mp4".to_string(),
            title: Some("skip=90.000".to_string()),
            discontinuity: true,
            byte_range: ByteRange::new(5_000_000, 9_000_000),
        });

        let m3u8 = playlist.render();

        assert!(m3u8.starts_with("#EXTM3U\n"));
        assert!(m3u8.contains("#EXT-X-VERSION:4"));
        assert!(m3u8.contains("#EXT-X-TARGETDURATION:7200"));
        assert!(m3u8.contains("#EXT-X-MEDIA-SEQUENCE:0"));
        assert!(m3u8.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
        assert!(m3u8.contains("#EXT-X-BYTERANGE:1000000@0"));
        assert!(m3u8.contains("#EXTINF:1.000000,\n"));
        assert!(m3u8.contains("#EXT-X-DISCONTINUITY\n#EXT-X-BYTERANGE:4000000@5000000"));
        assert!(m3u8.contains("#EXTINF:7200.000000,skip=90.000"));
        assert_eq!(m3u8.matches("http://cdn/v.mp4").count(), 2);
        assert!(m3u8.ends_with("#EXT-X-ENDLIST\n"));
    }

    #[test]
    fn test_empty_playlist_still_terminated() {
        let m3u8 = MediaPlaylist::vod(6).render();
        assert!(m3u8.contains("#EXT-X-TARGETDURATION:6"));
        assert!(!m3u8.contains("#EXTINF"));
        assert!(m3u8.ends_with("#EXT-X-ENDLIST\n"));
    }

    #[test]
    fn test_byte_range_lengths() {
        assert_eq!(ByteRange::new(1000, 5000).len(), 4000);
        assert_eq!(ByteRange::new(1000, 5000).to_string(), "4000@1000");
        assert!(ByteRange::new(10, 10).is_empty());
        assert!(ByteRange::new(20, 10).is_empty());
        assert_eq!(ByteRange::open(1000).len(), OPEN_RANGE_END - 1000);
        assert_eq!(ByteRange::open(0).to_string(), "9007199254740992@0");
    }

    #[test]
    fn open_range_end_survives_float_arithmetic() {
        let range = ByteRange::open(123_456_789);
        let end = range.start as f64 + range.len() as f64;
        assert_eq!(end, OPEN_RANGE_END as f64);
        assert_eq!(end as u64, OPEN_RANGE_END);
        assert!(OPEN_RANGE_END < i64::MAX as u64);
    }
}

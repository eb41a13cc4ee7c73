//! HLS playlist synthesis.
//!
//! This crate generates M3U8 media playlists whose segments are byte ranges
//! of a remote source. It never touches the network: [`ManifestBuilder`]
//! turns resolved offsets into a [`MediaPlaylist`], which renders itself.

mod builder;
mod playlist;

pub use builder::ManifestBuilder;
pub use playlist::{ByteRange, MediaPlaylist, SegmentEntry, OPEN_RANGE_END};

//! FFprobe-based [`OffsetResolver`] implementation.
//!
//! Shells out to
//! `ffprobe -v error -select_streams v:0 -skip_frame nokey -show_entries packet=pts_time,pos,flags:format=start_time -read_intervals %+<t> -of json <url>`
//! and picks the last video keyframe at or before `t`.
//!
//! `t` is playback time, counted from the container's `start_time`. Packet
//! timestamps are absolute, so sources that do not start at zero (MPEG-TS,
//! MP4 with edit lists) are compared against `start_time + t`.
//! ffprobe reads the remote file over HTTP itself; nothing is downloaded by
//! introskip.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use introskip_core::config::ToolsConfig;
use introskip_core::{BreakPoint, OffsetResolver};
use serde::Deserialize;

use crate::command::ToolCommand;
use crate::tools;

/// Extra seconds read past the target so a keyframe sitting exactly on it is
/// not cut off by the interval end.
const READ_SLACK_SECS: f64 = 1.0;

/// An [`OffsetResolver`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeOffsetResolver {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
    /// Hard limit for one lookup.
    timeout: Duration,
}

impl FfprobeOffsetResolver {
    /// Create a resolver using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Create a resolver from the tools config, or `None` if ffprobe cannot
    /// be found.
    pub fn from_config(tools_config: &ToolsConfig, timeout: Duration) -> Option<Self> {
        tools::locate_ffprobe(tools_config).map(|p| Self::new(p, timeout))
    }

    fn command(&self, url: &str, time_secs: f64) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v", "error",
            "-select_streams", "v:0",
            "-skip_frame", "nokey",
            "-show_entries", "packet=pts_time,pos,flags:format=start_time",
        ]);
        // `%+d` reads d seconds from the first packet, wherever the source starts.
        cmd.arg("-read_intervals")
            .arg(format!("%+{:.3}", time_secs + READ_SLACK_SECS));
        cmd.args(["-of", "json"]);
        cmd.arg(url);
        cmd.timeout(self.timeout);
        cmd
    }
}

#[async_trait]
impl OffsetResolver for FfprobeOffsetResolver {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn resolve_offset(&self, url: &str, time_secs: f64) -> Option<u64> {
        if !time_secs.is_finite() || time_secs <= 0.0 {
            return None;
        }

        let output = match self.command(url, time_secs).execute().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(time_secs, error = %e, "Keyframe lookup failed");
                return None;
            }
        };

        let index = match parse_packets(&output.stdout) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(time_secs, error = %e, "Unparseable ffprobe output");
                return None;
            }
        };

        match index.at_or_before(time_secs) {
            Some(point) => {
                tracing::debug!(
                    requested = time_secs,
                    keyframe = point.time_secs - index.start_time,
                    start_time = index.start_time,
                    offset = point.byte_offset,
                    "Resolved keyframe"
                );
                Some(point.byte_offset)
            }
            None => {
                tracing::warn!(
                    time_secs,
                    keyframes = index.keyframes.len(),
                    start_time = index.start_time,
                    "No keyframe at or before requested time"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobePackets {
    #[serde(default)]
    packets: Vec<FfprobePacket>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobePacket {
    pts_time: Option<String>,
    pos: Option<String>,
    flags: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Keyframes of one lookup, with timestamps as ffprobe reported them.
#[derive(Debug)]
struct KeyframeIndex {
    /// Container start time; `0` when ffprobe did not report one.
    start_time: f64,
    keyframes: Vec<BreakPoint>,
}

impl KeyframeIndex {
    /// Last keyframe at or before playback time `time_secs`.
    fn at_or_before(&self, time_secs: f64) -> Option<BreakPoint> {
        select_keyframe(&self.keyframes, self.start_time + time_secs)
    }
}

/// Parse ffprobe's JSON into keyframe break points, dropping non-keyframes
/// and packets without a usable timestamp or position.
fn parse_packets(stdout: &str) -> introskip_core::Result<KeyframeIndex> {
    if stdout.trim().is_empty() {
        return Err(introskip_core::Error::tool("ffprobe", "empty output"));
    }

    let parsed: FfprobePackets = serde_json::from_str(stdout)
        .map_err(|e| introskip_core::Error::tool("ffprobe", format!("JSON parse error: {e}")))?;

    let start_time = parsed
        .format
        .and_then(|f| f.start_time)
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|t| t.is_finite())
        .unwrap_or(0.0);

    let keyframes = parsed
        .packets
        .into_iter()
        .filter(|p| p.flags.as_deref().is_some_and(|f| f.contains('K')))
        .filter_map(|p| {
            let time_secs = p.pts_time?.parse::<f64>().ok()?;
            let byte_offset = p.pos?.parse::<u64>().ok()?;
            time_secs.is_finite().then_some(BreakPoint {
                time_secs,
                byte_offset,
            })
        })
        .collect();

    Ok(KeyframeIndex {
        start_time,
        keyframes,
    })
}

/// The keyframe with the greatest timestamp not after `time_secs`.
fn select_keyframe(keyframes: &[BreakPoint], time_secs: f64) -> Option<BreakPoint> {
    keyframes
        .iter()
        .filter(|k| k.time_secs <= time_secs)
        .max_by(|a, b| a.time_secs.total_cmp(&b.time_secs))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "packets": [
            { "pts_time": "0.000000", "pos": "48213", "flags": "K__" },
            { "pts_time": "4.004000", "pos": "1204871", "flags": "K__" },
            { "pts_time": "5.005000", "pos": "1398022", "flags": "___" },
            { "pts_time": "8.008000", "pos": "2519302", "flags": "K__" },
            { "pts_time": "12.012000", "pos": "3880114", "flags": "K__" }
        ]
    }"#;

    #[test]
    fn picks_last_keyframe_not_after_target() {
        let keyframes = parse_packets(SAMPLE).unwrap().keyframes;
        let point = select_keyframe(&keyframes, 10.0).unwrap();
        assert_eq!(point.byte_offset, 2519302);
        assert!((point.time_secs - 8.008).abs() < 1e-9);
    }

    #[test]
    fn keyframe_exactly_on_target_is_used() {
        let keyframes = parse_packets(SAMPLE).unwrap().keyframes;
        let point = select_keyframe(&keyframes, 12.012).unwrap();
        assert_eq!(point.byte_offset, 3880114);
    }

    #[test]
    fn never_selects_a_later_keyframe() {
        let keyframes = parse_packets(SAMPLE).unwrap().keyframes;
        // Between the first two keyframes: must stay on the first.
        let point = select_keyframe(&keyframes, 3.9).unwrap();
        assert_eq!(point.byte_offset, 48213);
    }

    #[test]
    fn non_keyframes_are_ignored() {
        let keyframes = parse_packets(SAMPLE).unwrap().keyframes;
        assert_eq!(keyframes.len(), 4);
        assert!(keyframes.iter().all(|k| k.byte_offset != 1398022));
    }

    #[test]
    fn packets_order_does_not_matter() {
        let json = r#"{"packets": [
            { "pts_time": "8.0", "pos": "800", "flags": "K_" },
            { "pts_time": "2.0", "pos": "200", "flags": "K_" },
            { "pts_time": "6.0", "pos": "600", "flags": "K_" }
        ]}"#;
        let keyframes = parse_packets(json).unwrap().keyframes;
        assert_eq!(select_keyframe(&keyframes, 7.0).unwrap().byte_offset, 600);
    }

    #[test]
    fn packets_missing_fields_are_skipped() {
        let json = r#"{"packets": [
            { "pts_time": "N/A", "pos": "100", "flags": "K_" },
            { "pts_time": "1.0", "flags": "K_" },
            { "pts_time": "2.0", "pos": "300" },
            { "pts_time": "3.0", "pos": "400", "flags": "K_" }
        ]}"#;
        let keyframes = parse_packets(json).unwrap().keyframes;
        assert_eq!(keyframes.len(), 1);
        assert_eq!(keyframes[0].byte_offset, 400);
    }

    #[test]
    fn nothing_before_target_is_not_found() {
        let keyframes = parse_packets(SAMPLE).unwrap().keyframes;
        assert!(select_keyframe(&keyframes, -1.0).is_none());
        assert!(select_keyframe(&[], 10.0).is_none());
    }

    const OFFSET_START: &str = r#"{
        "packets": [
            { "pts_time": "1.400000", "pos": "564", "flags": "K__" },
            { "pts_time": "11.300000", "pos": "1880000", "flags": "K__" },
            { "pts_time": "21.300000", "pos": "3760000", "flags": "K__" }
        ],
        "format": { "start_time": "1.400000" }
    }"#;

    #[test]
    fn target_is_relative_to_container_start() {
        let index = parse_packets(OFFSET_START).unwrap();
        assert!((index.start_time - 1.4).abs() < 1e-9);
        // Playback 10s is pts 11.4, past the keyframe at 11.3.
        assert_eq!(index.at_or_before(10.0).unwrap().byte_offset, 1880000);
        // Playback 19.5s is pts 20.9, still before the third keyframe.
        assert_eq!(index.at_or_before(19.5).unwrap().byte_offset, 1880000);
        assert_eq!(index.at_or_before(20.0).unwrap().byte_offset, 3760000);
    }

    #[test]
    fn missing_or_unusable_start_time_counts_as_zero() {
        assert_eq!(parse_packets(SAMPLE).unwrap().start_time, 0.0);
        let json = r#"{"packets": [], "format": { "start_time": "N/A" }}"#;
        assert_eq!(parse_packets(json).unwrap().start_time, 0.0);
        let json = r#"{"packets": [], "format": {}}"#;
        assert_eq!(parse_packets(json).unwrap().start_time, 0.0);
    }

    #[test]
    fn empty_or_garbage_output_is_an_error() {
        assert!(parse_packets("").is_err());
        assert!(parse_packets("   \n").is_err());
        assert!(parse_packets("not json").is_err());
        assert!(parse_packets("{}").unwrap().keyframes.is_empty());
    }

    #[test]
    fn command_reads_up_to_target() {
        let resolver = FfprobeOffsetResolver::new(PathBuf::from("ffprobe"), Duration::from_secs(5));
        let cmd = resolver.command("http://cdn/v.mkv", 90.0);
        let args = cmd.get_args();
        let pos = args.iter().position(|a| a == "-read_intervals").unwrap();
        assert_eq!(args[pos + 1], "%+91.000");
        assert!(args.iter().any(|a| a.ends_with(":format=start_time")));
        assert_eq!(args.last().map(String::as_str), Some("http://cdn/v.mkv"));
    }

    #[tokio::test]
    async fn non_positive_time_skips_the_tool() {
        // Pointing at a missing binary: any attempt to run it would log a
        // spawn failure, but the answer must be None either way.
        let resolver = FfprobeOffsetResolver::new(
            PathBuf::from("nonexistent_tool_xyz_12345"),
            Duration::from_secs(1),
        );
        assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", 0.0).await, None);
        assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", -5.0).await, None);
        assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", f64::NAN).await, None);
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let resolver = FfprobeOffsetResolver::new(
            PathBuf::from("nonexistent_tool_xyz_12345"),
            Duration::from_secs(1),
        );
        assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", 30.0).await, None);
    }

    #[cfg(unix)]
    mod fake_ffprobe {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("ffprobe");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn resolves_offset_from_tool_output() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(&dir, &format!("cat <<'JSON'\n{SAMPLE}\nJSON"));
            let resolver = FfprobeOffsetResolver::new(path, Duration::from_secs(5));
            assert_eq!(
                resolver.resolve_offset("http://cdn/v.mkv", 10.0).await,
                Some(2519302)
            );
        }

        #[tokio::test]
        async fn offset_start_source_resolves_playback_time() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(&dir, &format!("cat <<'JSON'\n{OFFSET_START}\nJSON"));
            let resolver = FfprobeOffsetResolver::new(path, Duration::from_secs(5));
            assert_eq!(
                resolver.resolve_offset("http://cdn/v.ts", 10.0).await,
                Some(1880000)
            );
        }

        #[tokio::test]
        async fn non_zero_exit_is_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(&dir, "echo 'Server returned 403 Forbidden' >&2\nexit 1");
            let resolver = FfprobeOffsetResolver::new(path, Duration::from_secs(5));
            assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", 10.0).await, None);
        }

        #[tokio::test]
        async fn slow_tool_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(&dir, "sleep 10");
            let resolver = FfprobeOffsetResolver::new(path, Duration::from_millis(200));
            let started = std::time::Instant::now();
            assert_eq!(resolver.resolve_offset("http://cdn/v.mkv", 10.0).await, None);
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
}

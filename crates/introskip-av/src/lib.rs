//! # introskip-av
//!
//! External media tooling for the introskip proxy.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`tools`]) -- find `ffprobe` from config or `PATH`
//!   and report its version.
//! - **Command execution** ([`ToolCommand`]) -- async builder with a hard
//!   timeout for running external processes.
//! - **Keyframe lookup** ([`FfprobeOffsetResolver`]) -- implements
//!   [`introskip_core::OffsetResolver`] by asking ffprobe for keyframe byte
//!   positions in a remote file.

pub mod command;
pub mod keyframe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use keyframe::FfprobeOffsetResolver;
pub use tools::{check_ffprobe, locate_ffprobe, ToolInfo};

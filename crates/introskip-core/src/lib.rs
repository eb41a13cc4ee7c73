//! introskip-core: shared types, errors, configuration and the collaborator
//! traits of the manifest proxy.
//!
//! This crate is the foundational dependency for the other introskip crates.
//! It defines the request/response model ([`SpliceRequest`],
//! [`SourceDescriptor`], [`ManifestResult`]), the unified [`Error`], the
//! application [`config`], and the two seams the proxy is built around:
//! [`SourceProber`] and [`OffsetResolver`].

pub mod config;
pub mod error;
pub mod offset;
pub mod prober;
pub mod source;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use offset::OffsetResolver;
pub use prober::SourceProber;
pub use source::*;

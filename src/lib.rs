//! clipfetch - bulk media downloader for dynamically-rendered profile pages.
//!
//! Two-stage pipeline: a discovery stage renders the profile, triggers lazy
//! loading, and converges on a stable set of item references; a fetch stage
//! resolves each reference to a concrete media URL through a prioritized
//! chain of extraction heuristics, then streams and validates the payload
//! under a fixed concurrency bound.

pub mod browser;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod resolver;

pub use config::Settings;
pub use error::{ErrorKind, FetchError};
pub use models::{DownloadOutcome, FetchSummary, ItemReference, ResolvedAsset};

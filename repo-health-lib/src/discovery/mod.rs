//! Repository discovery
//!
//! Searches for repositories matching a [`DiscoveryFilter`], then either enqueues one
//! work item per repository for the health worker, or writes the results straight
//! to a CSV table in the object store.
//!
//! Discovery never fails because of the remote API: throttling and errors end the
//! search early and the partial result is used as-is.

mod export;
mod fan_out;
mod search;

use serde::{Deserialize, Serialize};

pub use export::{ExportRow, export_key, export_rows, write_export};
pub use fan_out::{FanOutReport, fan_out};
pub use search::{DiscoveredRepo, Discovery, DiscoveryEnd, DiscoveryFilter, discover};

/// Where discovered repositories go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Enqueue a work item per repository
    #[default]
    Queue,

    /// Write a CSV table of the results
    Export,
}

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repo-health
//!
//! This library holds all functionality for the `repo-health` tool, which discovers
//! GitHub repositories, fans them out through a work queue, scores each repository's
//! health, and rolls daily snapshots up into weekly summaries.
//!
//! # Module Organization
//!
//! - [`hosting`]: Rate-limited GitHub API client and response models
//! - [`discovery`]: Repository search, queue fan-out, and direct export
//! - [`worker`]: Work item processing, health scoring, and snapshot storage
//! - [`aggregate`]: Weekly rollup of daily snapshots
//! - [`reports`]: JSON and CSV serializations
//! - [`storage`]: Object store abstraction and implementations
//! - [`queue`]: Work queue abstraction and implementations
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod aggregate;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod discovery;

#[doc(hidden)]
pub mod hosting;

#[doc(hidden)]
pub mod queue;

#[doc(hidden)]
pub mod reports;

#[doc(hidden)]
pub mod storage;

#[doc(hidden)]
pub mod worker;

pub use crate::commands::{Host, run};

//! Access to the GitHub REST API
//!
//! The [`Client`] wraps every call with a bounded timeout and a bounded rate-limit
//! retry loop. Failures never surface as errors: anything other than a decoded
//! `200 OK` response comes back as [`ApiResult::SoftFailure`], which callers treat
//! as "skip this item/page" rather than as a fatal condition.
//!
//! Counting sub-resources (contributors, commits) goes through
//! [`Client::count_items`], which asks for a single item per page and reads the
//! total from the `rel="last"` pagination link instead of downloading every page.

mod client;
mod models;
mod pagination;

pub use client::{ApiResponse, ApiResult, Client, ClientSettings, SoftFailure};
pub use models::{License, Repository, SearchPage};
pub use pagination::last_page;

//! Object key utilities.

use crate::Result;
use ohno::bail;

/// Sanitize a string for use as a single object key component
///
/// Replaces path separators, traversal sequences, and characters that are unsafe
/// on common filesystems, so a repository name such as `owner/name` becomes
/// `owner_name`.
///
/// # Examples
///
/// ```ignore
/// // This is an internal utility function
/// assert_eq!(sanitize_key_component("pallets/flask"), "pallets_flask");
/// assert_eq!(sanitize_key_component("../../etc/passwd"), "______etc_passwd");
/// ```
#[must_use]
pub fn sanitize_key_component(s: &str) -> String {
    // Replace ".." first but allow single "." so names like "socket.io" survive
    let s = s.replace("..", "__");
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

/// Split a key into its segments, rejecting anything that could escape a bucket.
pub(super) fn key_segments(key: &str) -> Result<Vec<&str>> {
    if key.is_empty() {
        bail!("object key must not be empty");
    }

    if key.contains('\\') {
        bail!("object key must not contain backslashes: '{key}'");
    }

    let segments: Vec<&str> = key.split('/').collect();
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        bail!("invalid object key: '{key}'");
    }

    Ok(segments)
}

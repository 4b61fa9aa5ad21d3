//! Object storage
//!
//! The pipeline persists everything as blobs addressed by slash-delimited keys.
//! [`ObjectStore`] is the narrow interface the core consumes: `put`, `get`, and
//! `list` by prefix, with no transactional semantics. `put` overwrites, which is
//! what makes snapshot writes idempotent.
//!
//! Two implementations ship with the crate: [`FsObjectStore`] maps a bucket onto a
//! directory tree, and [`MemoryObjectStore`] keeps everything in a map.

use crate::Result;
use async_trait::async_trait;

mod fs;
mod keys;
mod memory;

pub use fs::FsObjectStore;
pub use keys::sanitize_key_component;
pub use memory::MemoryObjectStore;

#[async_trait]
pub trait ObjectStore: Send + Sync + core::fmt::Debug {
    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Read the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// List every key starting with `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

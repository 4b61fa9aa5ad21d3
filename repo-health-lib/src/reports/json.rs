use crate::Result;
use ohno::IntoAppError;
use serde_json::{Map, Value};

/// Render summary records as a pretty-printed JSON array.
pub fn generate(records: &[Map<String, Value>]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(records).into_app_err("serializing summary records")
}

//! Upstream response rewriting.

use bytes::Bytes;
use serde_json::Value;

use crate::error::ProxyError;

/// Replace the `model` field of a buffered upstream body with the public id.
///
/// Bodies that parse but are not objects have no `model` to rewrite and are
/// re-emitted as they are.
pub fn rewrite_response_model(body: &[u8], public_model: &str) -> Result<Bytes, ProxyError> {
    let mut value: Value =
        serde_json::from_slice(body).map_err(ProxyError::MalformedUpstreamResponse)?;

    if let Value::Object(object) = &mut value {
        object.insert("model".to_string(), Value::String(public_model.to_string()));
    }
    Ok(Bytes::from(value.to_string()))
}

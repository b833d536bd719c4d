//! # HaloCare shared response shapes
//!
//! Per-resource request types live next to their models. This module holds
//! the envelopes several handlers share.

use serde::Serialize;
use uuid::Uuid;

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// Bulk delete confirmation (journal clear-all)
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// Standard success message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Success/failure envelope for the outbound widget calls. Always sent with
/// HTTP 200; the client renders its error state from `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resource<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> From<anyhow::Result<T>> for Resource<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(data) => Resource::Success { data },
            Err(e) => Resource::Error {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_success_shape() {
        let json = serde_json::to_value(Resource::Success { data: 5 }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "data": 5 }));
    }

    #[test]
    fn test_resource_from_error() {
        let r: Resource<i32> = Err(anyhow::anyhow!("timed out")).into();
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "error", "message": "timed out" }));
    }
}

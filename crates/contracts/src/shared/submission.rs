//! DTOs exchanged with the record gateway
//!
//! A fetched record carries its attachment values already
//! transport-encoded, so edit mode can rebuild server-origin attachments
//! without any extra round-trip. A submission payload carries touched
//! attachment slots only: an encoded string means "store this", an empty
//! string means "clear the stored value", an absent key means "leave
//! unchanged".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Explicit operator identity passed to the engine at construction,
/// instead of being read from ambient browser storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorContext {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub role: String,
}

/// One stored attachment as returned by `fetch_by_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedAttachment {
    /// Transport-encoded value, reusable as-is on an unchanged submit
    pub encoded: String,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// One persisted collection item as returned by `fetch_by_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedItem {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub attachments: HashMap<String, FetchedAttachment>,
}

/// A record as returned by `fetch_by_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub id: String,
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub attachments: HashMap<String, FetchedAttachment>,
    #[serde(default)]
    pub items: Vec<FetchedItem>,
}

/// One collection item inside a submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Present for items that already exist on the server, so the backend
    /// can reconcile adds vs updates
    #[serde(rename = "serverId", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub position: usize,
    pub fields: HashMap<String, String>,
    pub attachments: HashMap<String, String>,
}

/// Assembled payload for `create`/`update`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "recordType")]
    pub record_type: String,
    pub fields: HashMap<String, String>,
    /// Touched slots only; "" clears the stored value
    pub attachments: HashMap<String, String>,
    pub items: Vec<ItemPayload>,
    #[serde(rename = "submittedBy")]
    pub submitted_by: String,
}

/// Gateway response to a successful create/update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id: String,
    pub message: Option<String>,
}

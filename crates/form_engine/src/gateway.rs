//! Ports consumed by the engine
//!
//! The engine never builds HTTP requests itself; it talks to a
//! [`RecordGateway`] and reports outcomes through the notification port.
//! Implementations live with the page layer.

use async_trait::async_trait;
use thiserror::Error;

use contracts::shared::submission::{FetchedRecord, SaveResponse, SubmissionPayload};

/// Backend-reported failure of a gateway call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 4xx with a message the user can act on
    #[error("Server rejected the request: {0}")]
    ServerValidation(String),

    /// 5xx
    #[error("Server fault: HTTP {0}")]
    ServerFault(u16),

    /// No response at all
    #[error("Network unreachable")]
    NetworkUnreachable,
}

/// Fetch/create/update endpoints for one record type
#[async_trait(?Send)]
pub trait RecordGateway {
    async fn fetch_by_id(&self, record_type: &str, id: &str)
        -> Result<FetchedRecord, GatewayError>;

    async fn create(&self, payload: SubmissionPayload) -> Result<SaveResponse, GatewayError>;

    async fn update(&self, payload: SubmissionPayload) -> Result<SaveResponse, GatewayError>;

    /// Delete one persisted collection item (family member, nominee)
    async fn delete_collection_item(
        &self,
        record_type: &str,
        item_server_id: &str,
    ) -> Result<(), GatewayError>;
}

/// User confirmation before destructive actions
pub trait ConfirmationPort {
    fn confirm(&self, message: &str) -> bool;
}

/// Fire-and-forget success/error announcements (toasts in the page layer)
pub trait NotificationPort {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy for one block's compression workflow.
///
/// Every variant is caught at the orchestrator boundary: the user gets a
/// transient notification and the block's guard entry is cleared, so the
/// same reference becomes eligible again on the next edit.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Compression server URL not configured")]
    ConfigMissing,
    #[error("Failed to fetch image: {0}")]
    Fetch(String),
    #[error("Graph path unavailable")]
    GraphUnavailable,
    #[error("Unsupported image path: {0}")]
    UnsupportedReference(String),
    #[error("Compression result is empty")]
    EmptyResult,
    #[error("Failed to write compressed image to asset storage")]
    StorageWrite,
    #[error("Block no longer exists: {0}")]
    BlockGone(Uuid),
}

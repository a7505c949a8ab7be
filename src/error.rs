use thiserror::Error;

/// Errors raised by the reflection engine.
///
/// The two not-found variants are client-addressable and map to 404 responses;
/// anything else is an unclassified internal failure. Per-relation fetch
/// failures never surface here at all: they degrade to zero-valued stubs at
/// the call site.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Unknown or excluded model name, or an undeclared relation on a known
    /// model (an unknown relation is a lookup failure, not a distinct kind).
    #[error("{0}")]
    ModelNotFound(String),
    /// The model resolved but the identifier matched no record.
    #[error("{0}")]
    RecordNotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InspectError {
    pub fn model_not_found(name: &str) -> Self {
        Self::ModelNotFound(format!("Model '{}' not found", name))
    }

    pub fn relation_not_found(model: &str, relation: &str) -> Self {
        Self::ModelNotFound(format!("Relation '{}' not found on {}", relation, model))
    }

    pub fn record_not_found(model: &str, id: &str) -> Self {
        Self::RecordNotFound(format!("{}#{} not found", model, id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound(_) | Self::RecordNotFound(_))
    }
}

/// Fatal at process start: the host registered no supported mapping layer.
/// This is a configuration error, never a per-request one.
#[derive(Debug, Error)]
#[error("no supported mapping layer detected (expected a relational or document registry)")]
pub struct AdapterDetectionError;

/// Rejection reasons for an imported graph snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {0} (expected {expected})", expected = crate::model::SNAPSHOT_VERSION)]
    UnsupportedVersion(u32),
}

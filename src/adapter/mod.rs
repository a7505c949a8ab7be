pub mod document;
pub mod relational;
pub mod traits;

pub use document::*;
pub use relational::*;
pub use traits::*;

use crate::error::AdapterDetectionError;
use std::sync::Arc;

/// Host-side registration point: a process exposes whichever mapping layer
/// it actually runs. Exactly one registry is expected.
#[derive(Default)]
pub struct HostMapping {
    pub relational: Option<RelationalRegistry>,
    pub document: Option<DocumentRegistry>,
}

impl HostMapping {
    pub fn relational(registry: RelationalRegistry) -> Self {
        Self {
            relational: Some(registry),
            ..Self::default()
        }
    }

    pub fn document(registry: DocumentRegistry) -> Self {
        Self {
            document: Some(registry),
            ..Self::default()
        }
    }
}

/// Detects the active mapping paradigm, once, at process start. The document
/// registry wins when both are somehow present. The returned adapter is held
/// for the process lifetime (the paradigm does not change at runtime), and a
/// host with neither registry is a fatal configuration error, not a
/// per-request one.
pub fn detect(host: HostMapping) -> Result<Arc<dyn MappingAdapter>, AdapterDetectionError> {
    if let Some(registry) = host.document {
        log::info!("document mapping layer detected");
        return Ok(Arc::new(DocumentAdapter::new(registry)));
    }
    if let Some(registry) = host.relational {
        log::info!("relational mapping layer detected");
        return Ok(Arc::new(RelationalAdapter::new(registry)));
    }
    Err(AdapterDetectionError)
}

use crate::model::{Cardinality, InstanceNode};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// 2D layout position, client-owned but round-tripped through snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRef {
    pub model: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(flatten)]
    pub instance: InstanceNode,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(rename = "macro")]
    pub cardinality: Option<Cardinality>,
}

/// Versioned export of a client graph: the full node set with positions, the
/// edge set, expanded-relation markers and the root identity. Import rejects
/// any version other than [`SNAPSHOT_VERSION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub version: u32,
    pub timestamp: String,
    pub root: Option<RootRef>,
    pub nodes: Vec<SnapshotNode>,
    pub expanded_relations: Vec<String>,
    pub edges: Vec<SnapshotEdge>,
}

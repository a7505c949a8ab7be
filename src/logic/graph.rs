use crate::adapter::MappingAdapter;
use crate::config::InspectorConfig;
use crate::error::{InspectError, SnapshotError};
use crate::logic::expand::RelationExpander;
use crate::logic::inspect::InstanceInspector;
use crate::model::{
    node_key, split_key, Cardinality, ExpansionResult, GraphSnapshot, InstanceNode, Position,
    RootRef, SnapshotEdge, SnapshotNode, SNAPSHOT_VERSION,
};
use parking_lot::Mutex;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Display palette for model classes.
pub const PALETTE: [&str; 15] = [
    "#4F46E5", "#0891B2", "#059669", "#D97706", "#DC2626", "#7C3AED", "#DB2777", "#2563EB",
    "#65A30D", "#EA580C", "#6D28D9", "#0D9488", "#CA8A04", "#E11D48", "#1D4ED8",
];

/// Color assignment is a pure hash of the model name, so unrelated graph
/// sessions agree on colors without any shared assignment table.
pub fn palette_index(model: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in model.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    (hash % PALETTE.len() as u64) as usize
}

pub fn model_color(model: &str) -> &'static str {
    PALETTE[palette_index(model)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub instance: InstanceNode,
    /// Minimum depth at which this node has been reached from the root.
    pub depth: u32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub cardinality: Option<Cardinality>,
}

/// Pending next-page marker for a partially expanded relation. At most one
/// exists per (source, relation) pair at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct MorePlaceholder {
    pub id: String,
    pub source_key: String,
    pub relation: String,
    pub next_page: usize,
    pub remaining: u64,
}

/// Accumulated exploration state: the node/edge set reachable from the
/// current root. An owned value with pure operations: merging is a plain
/// function of (state, expansion result), so it unit-tests without any
/// rendering environment.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: BTreeMap<String, GraphNode>,
    edges: BTreeMap<String, GraphEdge>,
    more: BTreeMap<String, MorePlaceholder>,
    expanded: BTreeSet<String>,
    root: Option<String>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &MorePlaceholder> {
        self.more.values()
    }

    pub fn placeholder_for(&self, source_key: &str, relation: &str) -> Option<&MorePlaceholder> {
        self.more.get(&Self::relation_key(source_key, relation))
    }

    pub fn root_key(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_expanded(&self, source_key: &str, relation: &str) -> bool {
        self.expanded.contains(&Self::relation_key(source_key, relation))
    }

    pub fn relation_key(source_key: &str, relation: &str) -> String {
        format!("{}:{}", source_key, relation)
    }

    pub fn edge_id(source_key: &str, relation: &str, target_key: &str) -> String {
        format!("e:{}->{}:{}", source_key, target_key, relation)
    }

    /// Replaces the whole graph with a single root node at depth 0.
    pub fn load_root(&mut self, node: InstanceNode) {
        *self = Self::default();
        self.root = Some(node.key.clone());
        self.nodes.insert(
            node.key.clone(),
            GraphNode {
                instance: node,
                depth: 0,
                position: Position::default(),
            },
        );
    }

    /// Merges one expansion result. The whole sequence (drop the stale
    /// "more" placeholder, mark expanded, merge nodes and edges, append the
    /// next placeholder) happens under one `&mut self` call, so a renderer
    /// never observes a partial intermediate state.
    ///
    /// Idempotent per page: re-applying the same page is a strict no-op.
    pub fn apply_expansion(&mut self, result: &ExpansionResult) {
        let relation_key = Self::relation_key(&result.source_key, &result.relation);
        // whatever page this is, the previous placeholder is stale now
        self.more.remove(&relation_key);
        self.expanded.insert(relation_key.clone());

        let source = self.nodes.get(&result.source_key);
        let depth = source.map(|n| n.depth + 1).unwrap_or(1);
        let cardinality = source.and_then(|n| {
            n.instance
                .relations
                .iter()
                .find(|s| s.name == result.relation)
                .map(|s| s.cardinality)
        });

        for instance in &result.nodes {
            match self.nodes.entry(instance.key.clone()) {
                // an already-known node is never overwritten; only its depth
                // can improve
                Entry::Occupied(mut entry) => {
                    let node = entry.get_mut();
                    node.depth = node.depth.min(depth);
                }
                Entry::Vacant(entry) => {
                    entry.insert(GraphNode {
                        instance: instance.clone(),
                        depth,
                        position: Position::default(),
                    });
                }
            }

            let edge_id = Self::edge_id(&result.source_key, &result.relation, &instance.key);
            self.edges.entry(edge_id.clone()).or_insert_with(|| GraphEdge {
                id: edge_id,
                source: result.source_key.clone(),
                target: instance.key.clone(),
                relation: result.relation.clone(),
                cardinality,
            });
        }

        if result.has_more {
            let next_page = result.page + 1;
            let shown = (result.page as u64) * (result.per_page as u64);
            self.more.insert(
                relation_key,
                MorePlaceholder {
                    id: format!("more:{}:{}:{}", result.source_key, result.relation, next_page),
                    source_key: result.source_key.clone(),
                    relation: result.relation.clone(),
                    next_page,
                    remaining: result.total.saturating_sub(shown),
                },
            );
        }
    }

    pub fn set_position(&mut self, key: &str, position: Position) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Serializes the full state as a versioned snapshot, root node first.
    pub fn export(&self) -> GraphSnapshot {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root.as_deref().and_then(|key| self.nodes.get(key)) {
            nodes.push(SnapshotNode {
                instance: root.instance.clone(),
                position: root.position,
            });
        }
        for node in self.nodes.values() {
            if self.root.as_deref() == Some(node.instance.key.as_str()) {
                continue;
            }
            nodes.push(SnapshotNode {
                instance: node.instance.clone(),
                position: node.position,
            });
        }

        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            timestamp: chrono::Utc::now().to_rfc3339(),
            root: self.root.as_deref().and_then(split_key).map(|(model, id)| RootRef {
                model: model.to_string(),
                id: id.to_string(),
            }),
            nodes,
            expanded_relations: self.expanded.iter().cloned().collect(),
            edges: self
                .edges
                .values()
                .map(|edge| SnapshotEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    relation: edge.relation.clone(),
                    cardinality: edge.cardinality,
                })
                .collect(),
        }
    }

    /// Restores a snapshot, rejecting unknown versions. Imported non-root
    /// nodes land at depth 1: the snapshot does not record depths, and the
    /// next expansion re-derives them.
    pub fn import(snapshot: GraphSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        let root = snapshot.root.as_ref().map(|r| node_key(&r.model, &r.id));
        let mut state = Self {
            root: root.clone(),
            ..Self::default()
        };

        for node in snapshot.nodes {
            let depth = u32::from(root.as_deref() != Some(node.instance.key.as_str()));
            state.nodes.insert(
                node.instance.key.clone(),
                GraphNode {
                    instance: node.instance,
                    depth,
                    position: node.position,
                },
            );
        }
        for edge in snapshot.edges {
            let id = Self::edge_id(&edge.source, &edge.relation, &edge.target);
            state.edges.insert(
                id.clone(),
                GraphEdge {
                    id,
                    source: edge.source,
                    target: edge.target,
                    relation: edge.relation,
                    cardinality: edge.cardinality,
                },
            );
        }
        state.expanded = snapshot.expanded_relations.into_iter().collect();

        Ok(state)
    }
}

/// Shared graph state with serialized merges.
///
/// Independent expansions may run concurrently; the read-modify-write into
/// the node/edge set is atomic per call. A root generation counter guards
/// against resurrection: a response that arrives after a newer
/// `load_root`/`clear`/`import` is returned to its caller but never merged.
#[derive(Default)]
pub struct GraphSession {
    state: Mutex<GraphState>,
    generation: AtomicU64,
}

impl GraphSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_state(&self) -> GraphState {
        self.state.lock().clone()
    }

    pub fn export(&self) -> GraphSnapshot {
        self.state.lock().export()
    }

    pub fn import(&self, snapshot: GraphSnapshot) -> Result<(), SnapshotError> {
        let imported = GraphState::import(snapshot)?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = imported;
        Ok(())
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.lock().clear();
    }

    pub async fn load_root(
        &self,
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        model: &str,
        id: &str,
    ) -> Result<InstanceNode, InspectError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let node = InstanceInspector::inspect(adapter, config, model, id).await?;

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            state.load_root(node.clone());
        }
        Ok(node)
    }

    pub async fn expand(
        &self,
        adapter: &dyn MappingAdapter,
        config: &InspectorConfig,
        source_key: &str,
        relation: &str,
        page: usize,
    ) -> Result<ExpansionResult, InspectError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (model, id) =
            split_key(source_key).ok_or_else(|| InspectError::model_not_found(source_key))?;
        let result =
            RelationExpander::expand(adapter, config, model, id, relation, page, None).await?;

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            state.apply_expansion(&result);
        }
        Ok(result)
    }
}

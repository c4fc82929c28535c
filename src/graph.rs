use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CanvasError, Result};
use crate::geometry::Point;

/// Closed vocabulary of node tags. Core logic never branches on it; skins and
/// the navigation boundary do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Task,
    Decision,
    End,
    Goal,
    Workflow,
    Timeline,
    Process,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Start,
        NodeKind::Task,
        NodeKind::Decision,
        NodeKind::End,
        NodeKind::Goal,
        NodeKind::Workflow,
        NodeKind::Timeline,
        NodeKind::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Task => "task",
            NodeKind::Decision => "decision",
            NodeKind::End => "end",
            NodeKind::Goal => "goal",
            NodeKind::Workflow => "workflow",
            NodeKind::Timeline => "timeline",
            NodeKind::Process => "process",
        }
    }

    /// Page that owns documents of this kind.
    pub fn route(&self) -> Option<&'static str> {
        match self {
            NodeKind::Goal => Some("/goals"),
            NodeKind::Workflow => Some("/workflows"),
            NodeKind::Timeline => Some("/timeline"),
            NodeKind::Task => Some("/tasks"),
            NodeKind::Process => Some("/process"),
            NodeKind::Start | NodeKind::Decision | NodeKind::End => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Point,
    #[serde(default, alias = "title")]
    pub text: String,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Domain attributes the editor does not interpret, kept for export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        position: Point,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            text: text.into(),
            connections: Vec::new(),
            description: None,
            scale: None,
            color: None,
            extra: Map::new(),
        }
    }

    pub fn with_connections<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn points_to(&self, target: &str) -> bool {
        self.connections.iter().any(|id| id == target)
    }
}

/// Field-wise update for [`Graph::update_node`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub kind: Option<NodeKind>,
    pub position: Option<Point>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub scale: Option<f32>,
    pub color: Option<String>,
}

impl NodePatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn apply(&self, node: &mut Node) {
        if let Some(kind) = self.kind {
            node.kind = kind;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(text) = &self.text {
            node.text = text.clone();
        }
        if let Some(description) = &self.description {
            node.description = Some(description.clone());
        }
        if let Some(scale) = self.scale {
            node.scale = Some(scale);
        }
        if let Some(color) = &self.color {
            node.color = Some(color.clone());
        }
    }
}

/// Directed edge read off the source node's `connections` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

/// Nodes keyed by id plus their declaration order, which doubles as z-order
/// (later nodes draw on top).
///
/// Every editing operation is pure: it returns a new graph and leaves `self`
/// untouched, so a graph can be stored directly as a history snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes<I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert(node)?;
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn to_nodes(&self) -> Vec<Node> {
        self.nodes().cloned().collect()
    }

    pub fn add_node(&self, node: Node) -> Result<Self> {
        let mut next = self.clone();
        next.insert(node)?;
        Ok(next)
    }

    /// Drops the node and detaches every edge pointing at it.
    pub fn remove_node(&self, id: &str) -> Self {
        if !self.contains(id) {
            return self.clone();
        }

        let mut next = self.clone();
        next.nodes.remove(id);
        next.order.retain(|existing| existing != id);
        for node in next.nodes.values_mut() {
            node.connections.retain(|target| target != id);
        }
        next
    }

    /// Merges `patch` into the node. Unknown ids leave the graph unchanged.
    pub fn update_node(&self, id: &str, patch: &NodePatch) -> Self {
        let mut next = self.clone();
        if let Some(node) = next.nodes.get_mut(id) {
            patch.apply(node);
        }
        next
    }

    /// Appends `to` to the source's connections.
    ///
    /// Self-loops, unknown sources and edges that already exist are no-ops.
    /// The target does not have to exist.
    pub fn connect(&self, from: &str, to: &str) -> Self {
        let mut next = self.clone();
        if from == to {
            return next;
        }
        if let Some(node) = next.nodes.get_mut(from) {
            if !node.points_to(to) {
                node.connections.push(to.to_string());
            }
        }
        next
    }

    /// Removes every occurrence of `to` from the source's connections.
    pub fn disconnect(&self, from: &str, to: &str) -> Self {
        let mut next = self.clone();
        if let Some(node) = next.nodes.get_mut(from) {
            node.connections.retain(|target| target != to);
        }
        next
    }

    /// Edges whose target resolves, in source order. Dangling entries are skipped.
    pub fn connections(&self) -> Vec<Connection> {
        let mut edges = Vec::new();
        for node in self.nodes() {
            for target in &node.connections {
                if self.contains(target) {
                    edges.push(Connection {
                        from: node.id.clone(),
                        to: target.clone(),
                    });
                } else {
                    tracing::debug!(from = %node.id, to = %target, "skipping dangling connection");
                }
            }
        }
        edges
    }

    pub fn dangling_references(&self) -> Vec<Connection> {
        self.nodes()
            .flat_map(|node| {
                node.connections
                    .iter()
                    .filter(|target| !self.contains(target))
                    .map(|target| Connection {
                        from: node.id.clone(),
                        to: target.clone(),
                    })
            })
            .collect()
    }

    fn insert(&mut self, node: Node) -> Result<()> {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => Err(CanvasError::DuplicateId { id: node.id }),
            Entry::Vacant(entry) => {
                self.order.push(node.id.clone());
                entry.insert(node);
                Ok(())
            }
        }
    }
}

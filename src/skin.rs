//! Per-page node vocabularies. A skin decides how big a node is, where its
//! connection anchor sits, and how it is painted; the editor core only asks
//! for anchors.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::geometry::{AnchorSide, Point, Size, anchor_point};
use crate::graph::{Node, NodeKind};

pub const DEFAULT_STROKE: &str = "#94a3b8";
pub const PREVIEW_STROKE: &str = "#3b82f6";
const FALLBACK_FILL: &str = "#f3f4f6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeShape {
    RoundedRect,
    Circle,
}

pub trait NodeSkin: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Unscaled bounding box of a node of this kind, in world units.
    fn node_size(&self, kind: NodeKind) -> Size;

    fn fill_color(&self, node: &Node) -> String;

    /// `stroke-dasharray` for connection lines, `None` for solid.
    fn connection_dash(&self) -> Option<&'static str> {
        None
    }

    fn shape(&self) -> NodeShape {
        NodeShape::RoundedRect
    }

    /// Effective box for a concrete node, honouring its own `scale`.
    fn footprint(&self, node: &Node) -> Size {
        let base = self.node_size(node.kind);
        match node.scale {
            Some(scale) if scale > 0.0 => Size::new(base.width * scale, base.height * scale),
            _ => base,
        }
    }

    /// Fixed offset from the node's position to its connection anchor.
    fn anchor_offset(&self, kind: NodeKind) -> Point {
        self.node_size(kind).center()
    }

    fn anchor(&self, node: &Node, side: AnchorSide) -> Point {
        match side {
            AnchorSide::Center => node.position + self.anchor_offset(node.kind),
            _ => anchor_point(node.position, self.node_size(node.kind), side),
        }
    }
}

/// Workflow builder: small boxes, solid arrows.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowSkin;

impl NodeSkin for WorkflowSkin {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn node_size(&self, _kind: NodeKind) -> Size {
        Size::new(100.0, 64.0)
    }

    fn fill_color(&self, node: &Node) -> String {
        match node.kind {
            NodeKind::Task => "#dbeafe",
            NodeKind::Decision => "#fef3c7",
            NodeKind::Start => "#dcfce7",
            NodeKind::End => "#fee2e2",
            _ => FALLBACK_FILL,
        }
        .to_string()
    }
}

/// Document tree: large preview cards shrunk by their own `scale`, dashed links.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentSkin;

impl NodeSkin for DocumentSkin {
    fn name(&self) -> &'static str {
        "document"
    }

    fn node_size(&self, _kind: NodeKind) -> Size {
        Size::new(400.0, 300.0)
    }

    fn fill_color(&self, node: &Node) -> String {
        match node.kind {
            NodeKind::Goal => "#eff6ff",
            NodeKind::Workflow => "#f0fdf4",
            NodeKind::Timeline => "#faf5ff",
            NodeKind::Task => "#fefce8",
            NodeKind::Process => "#fdf2f8",
            _ => FALLBACK_FILL,
        }
        .to_string()
    }

    fn connection_dash(&self) -> Option<&'static str> {
        Some("4")
    }
}

/// Goal network: circular nodes tinted by their category colour.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalSkin;

impl NodeSkin for GoalSkin {
    fn name(&self) -> &'static str {
        "goal"
    }

    fn node_size(&self, _kind: NodeKind) -> Size {
        Size::new(128.0, 128.0)
    }

    fn fill_color(&self, node: &Node) -> String {
        node.color
            .clone()
            .unwrap_or_else(|| crate::goals::CATEGORIES[0].color.to_string())
    }

    fn connection_dash(&self) -> Option<&'static str> {
        Some("4")
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Circle
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinKind {
    #[default]
    Workflow,
    Document,
    Goal,
}

impl SkinKind {
    pub fn skin(self) -> Arc<dyn NodeSkin> {
        match self {
            SkinKind::Workflow => Arc::new(WorkflowSkin),
            SkinKind::Document => Arc::new(DocumentSkin),
            SkinKind::Goal => Arc::new(GoalSkin),
        }
    }
}

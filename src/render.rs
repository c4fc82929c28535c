//! Render adapter: turns canvas state into plain drawable records and SVG.
//!
//! Nothing here feeds back into the editor. A host UI can draw the [`Scene`]
//! records itself or use [`Scene::to_svg`].

use std::fmt::Write;

use serde::Serialize;

use crate::error::Result;
use crate::geometry::{AnchorSide, Point, Size, Viewport, world_to_screen};
use crate::graph::{Graph, NodeKind};
use crate::interaction::{Canvas, InteractionState};
use crate::skin::{DEFAULT_STROKE, NodeShape, NodeSkin, PREVIEW_STROKE};
use crate::utils::escape_xml;

const SVG_MARGIN: f32 = 40.0;
const MIN_SVG_EXTENT: f32 = 200.0;
const SELECTED_STROKE: &str = "#3b82f6";
const NODE_STROKE: &str = "#d1d5db";
const LABEL_COLOR: &str = "#1f2937";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBox {
    pub id: String,
    pub kind: NodeKind,
    /// Label text, or the live edit buffer while the label is being edited.
    pub label: String,
    pub origin: Point,
    pub size: Size,
    pub fill: String,
    pub selected: bool,
    pub editing: bool,
}

impl NodeBox {
    pub fn center(&self) -> Point {
        self.origin + self.size.center()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionLine {
    pub from: String,
    pub to: String,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewLine {
    pub start: Point,
    pub end: Point,
}

/// Drawable snapshot of one canvas, in world coordinates plus the viewport
/// that maps them to the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub viewport: Viewport,
    /// Graph order; later boxes draw on top.
    pub nodes: Vec<NodeBox>,
    pub connections: Vec<ConnectionLine>,
    pub preview: Option<PreviewLine>,
    pub shape: NodeShape,
    pub connection_dash: Option<&'static str>,
}

impl Scene {
    pub fn build(canvas: &Canvas) -> Self {
        Self::from_parts(
            canvas.graph(),
            canvas.viewport(),
            canvas.skin(),
            canvas.selection(),
            canvas.state(),
        )
    }

    pub fn from_parts(
        graph: &Graph,
        viewport: &Viewport,
        skin: &dyn NodeSkin,
        selection: Option<&str>,
        state: &InteractionState,
    ) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| {
                let (label, editing) = match state {
                    InteractionState::EditingLabel { node_id, buffer } if *node_id == node.id => {
                        (buffer.clone(), true)
                    }
                    _ => (node.text.clone(), false),
                };
                NodeBox {
                    id: node.id.clone(),
                    kind: node.kind,
                    label,
                    origin: node.position,
                    size: skin.footprint(node),
                    fill: skin.fill_color(node),
                    selected: selection == Some(node.id.as_str()),
                    editing,
                }
            })
            .collect();

        let connections = graph
            .connections()
            .into_iter()
            .filter_map(|edge| {
                let from = graph.get(&edge.from)?;
                let to = graph.get(&edge.to)?;
                Some(ConnectionLine {
                    start: skin.anchor(from, AnchorSide::Center),
                    end: skin.anchor(to, AnchorSide::Center),
                    from: edge.from,
                    to: edge.to,
                })
            })
            .collect();

        let preview = match state {
            InteractionState::Connecting {
                source_id,
                preview_end,
            } => graph.get(source_id).map(|source| PreviewLine {
                start: skin.anchor(source, AnchorSide::Center),
                end: *preview_end,
            }),
            _ => None,
        };

        Self {
            viewport: *viewport,
            nodes,
            connections,
            preview,
            shape: skin.shape(),
            connection_dash: skin.connection_dash(),
        }
    }

    /// Screen-space extent needed to show every node, with a margin.
    pub fn screen_size(&self) -> Size {
        let mut width = MIN_SVG_EXTENT;
        let mut height = MIN_SVG_EXTENT;
        for node in &self.nodes {
            let corner = Point::new(
                node.origin.x + node.size.width,
                node.origin.y + node.size.height,
            );
            let corner = world_to_screen(corner, &self.viewport);
            width = width.max(corner.x + SVG_MARGIN);
            height = height.max(corner.y + SVG_MARGIN);
        }
        Size::new(width, height)
    }

    pub fn to_svg(&self, background: &str) -> Result<String> {
        let size = self.screen_size();
        let mut svg = String::new();
        write!(
            svg,
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" font-family="Inter, system-ui, sans-serif">
  <defs>
    <marker id="arrowhead" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
      <polygon points="0 0, 10 3.5, 0 7" fill="{}" />
    </marker>
    <marker id="arrowhead-preview" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
      <polygon points="0 0, 10 3.5, 0 7" fill="{}" />
    </marker>
  </defs>
  <rect width="100%" height="100%" fill="{}" />
  <g transform="scale({}) translate({:.1}, {:.1})">
"##,
            size.width,
            size.height,
            size.width,
            size.height,
            DEFAULT_STROKE,
            PREVIEW_STROKE,
            escape_xml(background),
            self.viewport.scale,
            self.viewport.offset.x,
            self.viewport.offset.y,
        )?;

        let dash_attr = match self.connection_dash {
            Some(dash) => format!(" stroke-dasharray=\"{dash}\""),
            None => String::new(),
        };

        for line in &self.connections {
            writeln!(
                svg,
                "    <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrowhead)\"{} data-from=\"{}\" data-to=\"{}\" />",
                line.start.x,
                line.start.y,
                line.end.x,
                line.end.y,
                DEFAULT_STROKE,
                dash_attr,
                escape_xml(&line.from),
                escape_xml(&line.to),
            )?;
        }

        if let Some(preview) = &self.preview {
            writeln!(
                svg,
                "    <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"5,5\" marker-end=\"url(#arrowhead-preview)\" />",
                preview.start.x, preview.start.y, preview.end.x, preview.end.y, PREVIEW_STROKE,
            )?;
        }

        for node in &self.nodes {
            let (stroke, stroke_width) = if node.selected {
                (SELECTED_STROKE, 3)
            } else {
                (NODE_STROKE, 1)
            };
            writeln!(svg, "    <g data-node=\"{}\">", escape_xml(&node.id))?;
            match self.shape {
                NodeShape::RoundedRect => writeln!(
                    svg,
                    "      <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" />",
                    node.origin.x,
                    node.origin.y,
                    node.size.width,
                    node.size.height,
                    escape_xml(&node.fill),
                    stroke,
                    stroke_width,
                )?,
                NodeShape::Circle => {
                    let center = node.center();
                    writeln!(
                        svg,
                        "      <ellipse cx=\"{:.1}\" cy=\"{:.1}\" rx=\"{:.1}\" ry=\"{:.1}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" />",
                        center.x,
                        center.y,
                        node.size.width / 2.0,
                        node.size.height / 2.0,
                        escape_xml(&node.fill),
                        stroke,
                        stroke_width,
                    )?
                }
            }
            let center = node.center();
            let font_style = if node.editing { " font-style=\"italic\"" } else { "" };
            writeln!(
                svg,
                "      <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"14\" text-anchor=\"middle\" dominant-baseline=\"middle\"{}>{}</text>",
                center.x,
                center.y,
                LABEL_COLOR,
                font_style,
                escape_xml(&node.label),
            )?;
            writeln!(svg, "    </g>")?;
        }

        svg.push_str("  </g>\n</svg>\n");
        Ok(svg)
    }
}

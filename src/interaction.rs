//! Pointer/keyboard gesture handling for a single canvas.
//!
//! [`Canvas`] owns the graph, viewport, selection and undo history of one
//! editor surface and is the only thing allowed to mutate them. Every event
//! handler is total: events that do not apply to the current mode come back as
//! [`Outcome::Ignored`] instead of failing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::CanvasConfig;
use crate::error::Result;
use crate::geometry::{
    self, AnchorSide, Point, Viewport, ZoomDirection, screen_to_world, snap_to_grid,
};
use crate::graph::{Graph, Node, NodeKind, NodePatch};
use crate::history::History;
use crate::import::GraphDocument;
use crate::skin::{NodeSkin, WorkflowSkin};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InteractionState {
    #[default]
    Idle,
    /// `grab_offset` is the world-space distance from the node origin to the
    /// pointer at pointer-down, so the node does not jump under the cursor.
    DraggingNode { node_id: String, grab_offset: Point },
    /// Last pointer position in screen space.
    Panning { last_pointer: Point },
    /// `preview_end` is in world space.
    Connecting { source_id: String, preview_end: Point },
    EditingLabel { node_id: String, buffer: String },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::DraggingNode { .. } => "dragging",
            InteractionState::Panning { .. } => "panning",
            InteractionState::Connecting { .. } => "connecting",
            InteractionState::EditingLabel { .. } => "editing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Node the current gesture is anchored to, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            InteractionState::DraggingNode { node_id, .. }
            | InteractionState::EditingLabel { node_id, .. } => Some(node_id),
            InteractionState::Connecting { source_id, .. } => Some(source_id),
            InteractionState::Idle | InteractionState::Panning { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerTarget {
    Node(String),
    Canvas,
}

/// Input accepted by [`Canvas::dispatch`]. Pointer coordinates are screen
/// coordinates relative to the canvas element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CanvasEvent {
    PointerDown { target: PointerTarget, at: Point },
    PointerMove { at: Point },
    PointerUp,
    PointerLeave,
    Click { target: PointerTarget },
    DoubleClick { node: String },
    StartConnection { node: String },
    EditInput { text: String },
    ConfirmEdit,
    Cancel,
    AddNode { kind: NodeKind },
    DeleteNode { node: String },
    Disconnect { from: String, to: String },
    Undo,
    Redo,
    Zoom { direction: ZoomDirection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// The event does not apply in the current mode.
    Ignored,
    /// Mode, selection, preview or viewport changed; the graph did not.
    ViewChanged,
    /// The graph changed inside an open gesture and is not in history yet.
    GraphPending,
    /// The graph changed and a snapshot was committed.
    Committed,
    /// An open gesture was abandoned without touching the graph.
    Cancelled,
    /// Undo or redo replaced the graph with a stored snapshot.
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    pub route: &'static str,
    pub node_id: String,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    graph: Graph,
    viewport: Viewport,
    history: History<Graph>,
    state: InteractionState,
    selection: Option<String>,
    config: CanvasConfig,
    skin: Arc<dyn NodeSkin>,
}

impl Canvas {
    pub fn new(graph: Graph) -> Self {
        Self::with_config(graph, CanvasConfig::default(), Arc::new(WorkflowSkin))
    }

    pub fn with_config(graph: Graph, config: CanvasConfig, skin: Arc<dyn NodeSkin>) -> Self {
        Self {
            history: History::with_initial(graph.clone()),
            graph,
            viewport: Viewport::default(),
            state: InteractionState::Idle,
            selection: None,
            config,
            skin,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Viewport {
            offset: viewport.offset,
            scale: self.config.zoom.clamp(viewport.scale),
        };
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn history(&self) -> &History<Graph> {
        &self.history
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn skin(&self) -> &dyn NodeSkin {
        self.skin.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Copy of the graph taken synchronously, for export.
    pub fn snapshot(&self) -> Graph {
        self.graph.clone()
    }

    /// Replaces the graph with freshly loaded data as one undoable step.
    pub fn load(&mut self, graph: Graph) {
        self.graph = graph;
        self.state = InteractionState::Idle;
        self.selection = None;
        self.commit();
    }

    /// Parses and loads an import document. On error nothing changes.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let graph = GraphDocument::parse(json)?;
        debug!(nodes = graph.len(), "imported graph");
        self.load(graph);
        Ok(())
    }

    pub fn dispatch(&mut self, event: CanvasEvent) -> Outcome {
        let before = self.state.name();
        let outcome = match event.clone() {
            CanvasEvent::PointerDown { target, at } => self.pointer_down(target, at),
            CanvasEvent::PointerMove { at } => self.pointer_move(at),
            CanvasEvent::PointerUp => self.pointer_up(),
            CanvasEvent::PointerLeave => self.pointer_leave(),
            CanvasEvent::Click { target } => self.click(target),
            CanvasEvent::DoubleClick { node } => self.double_click(&node),
            CanvasEvent::StartConnection { node } => self.start_connection(&node),
            CanvasEvent::EditInput { text } => self.edit_input(text),
            CanvasEvent::ConfirmEdit => self.confirm_edit(),
            CanvasEvent::Cancel => self.cancel(),
            CanvasEvent::AddNode { kind } => self.add_node(kind),
            CanvasEvent::DeleteNode { node } => self.delete_node(&node),
            CanvasEvent::Disconnect { from, to } => self.disconnect(&from, &to),
            CanvasEvent::Undo => self.undo(),
            CanvasEvent::Redo => self.redo(),
            CanvasEvent::Zoom { direction } => self.zoom(direction),
        };

        if outcome == Outcome::Ignored {
            trace!(mode = before, ?event, "event ignored");
        } else {
            debug!(from = before, to = self.state.name(), ?outcome, "handled canvas event");
        }
        outcome
    }

    pub fn pointer_down(&mut self, target: PointerTarget, at: Point) -> Outcome {
        let blurred = self.blur_editor(&target);
        if !self.state.is_idle() {
            return blurred.unwrap_or(Outcome::Ignored);
        }
        let outcome = match target {
            PointerTarget::Node(id) => match self.graph.get(&id) {
                Some(node) => {
                    let grab_offset = screen_to_world(at, &self.viewport) - node.position;
                    self.state = InteractionState::DraggingNode {
                        node_id: id,
                        grab_offset,
                    };
                    Outcome::ViewChanged
                }
                None => Outcome::Ignored,
            },
            PointerTarget::Canvas => {
                self.state = InteractionState::Panning { last_pointer: at };
                Outcome::ViewChanged
            }
        };
        blurred.unwrap_or(outcome)
    }

    pub fn pointer_move(&mut self, at: Point) -> Outcome {
        match &mut self.state {
            InteractionState::DraggingNode {
                node_id,
                grab_offset,
            } => {
                let mut position = screen_to_world(at, &self.viewport) - *grab_offset;
                if let Some(grid) = self.config.grid_size {
                    position = snap_to_grid(position, grid);
                }
                let id = node_id.clone();
                let next = self.graph.update_node(&id, &NodePatch::position(position));
                if next == self.graph {
                    return Outcome::Ignored;
                }
                self.graph = next;
                Outcome::GraphPending
            }
            InteractionState::Panning { last_pointer } => {
                let delta = at - *last_pointer;
                *last_pointer = at;
                self.viewport = geometry::pan(&self.viewport, delta);
                Outcome::ViewChanged
            }
            InteractionState::Connecting { preview_end, .. } => {
                *preview_end = screen_to_world(at, &self.viewport);
                Outcome::ViewChanged
            }
            InteractionState::Idle | InteractionState::EditingLabel { .. } => Outcome::Ignored,
        }
    }

    /// Ends a drag or pan. A drag commits whatever position the last move left.
    pub fn pointer_up(&mut self) -> Outcome {
        match &self.state {
            InteractionState::DraggingNode { .. } => {
                self.state = InteractionState::Idle;
                if self.commit() {
                    Outcome::Committed
                } else {
                    Outcome::ViewChanged
                }
            }
            InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
                Outcome::ViewChanged
            }
            _ => Outcome::Ignored,
        }
    }

    pub fn pointer_leave(&mut self) -> Outcome {
        match self.state {
            InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
                Outcome::ViewChanged
            }
            _ => Outcome::Ignored,
        }
    }

    /// Completing a pending connection wins over selection.
    pub fn click(&mut self, target: PointerTarget) -> Outcome {
        let blurred = self.blur_editor(&target);
        let outcome = match (self.state.clone(), target) {
            (InteractionState::Connecting { source_id, .. }, PointerTarget::Node(target_id)) => {
                self.complete_connection(&source_id, &target_id)
            }
            (InteractionState::Connecting { .. }, PointerTarget::Canvas) => {
                self.state = InteractionState::Idle;
                self.selection = None;
                Outcome::Cancelled
            }
            (InteractionState::Idle, PointerTarget::Node(id)) => {
                if !self.graph.contains(&id) {
                    Outcome::Ignored
                } else if self.selection.as_deref() == Some(id.as_str()) {
                    self.selection = None;
                    Outcome::ViewChanged
                } else {
                    self.selection = Some(id);
                    Outcome::ViewChanged
                }
            }
            (InteractionState::Idle, PointerTarget::Canvas) => {
                if self.selection.take().is_some() {
                    Outcome::ViewChanged
                } else {
                    Outcome::Ignored
                }
            }
            _ => Outcome::Ignored,
        };
        blurred.unwrap_or(outcome)
    }

    pub fn double_click(&mut self, node_id: &str) -> Outcome {
        let blurred = self.blur_editor(&PointerTarget::Node(node_id.to_string()));
        if !self.state.is_idle() {
            return blurred.unwrap_or(Outcome::Ignored);
        }
        let Some(node) = self.graph.get(node_id) else {
            return blurred.unwrap_or(Outcome::Ignored);
        };
        self.state = InteractionState::EditingLabel {
            node_id: node_id.to_string(),
            buffer: node.text.clone(),
        };
        blurred.unwrap_or(Outcome::ViewChanged)
    }

    pub fn start_connection(&mut self, source_id: &str) -> Outcome {
        let blurred = self.blur_editor(&PointerTarget::Canvas);
        if matches!(
            self.state,
            InteractionState::DraggingNode { .. } | InteractionState::Panning { .. }
        ) {
            return Outcome::Ignored;
        }
        let Some(node) = self.graph.get(source_id) else {
            return blurred.unwrap_or(Outcome::Ignored);
        };
        let preview_end = self.skin.anchor(node, AnchorSide::Center);
        self.state = InteractionState::Connecting {
            source_id: source_id.to_string(),
            preview_end,
        };
        blurred.unwrap_or(Outcome::ViewChanged)
    }

    pub fn edit_input(&mut self, text: String) -> Outcome {
        match &mut self.state {
            InteractionState::EditingLabel { buffer, .. } => {
                *buffer = text;
                Outcome::ViewChanged
            }
            _ => Outcome::Ignored,
        }
    }

    pub fn confirm_edit(&mut self) -> Outcome {
        match self.finish_edit() {
            Some(outcome) => outcome,
            None => Outcome::Ignored,
        }
    }

    /// Escape: drops a pending connection, label edit or pan. Drags are not
    /// cancellable.
    pub fn cancel(&mut self) -> Outcome {
        match self.state {
            InteractionState::Connecting { .. }
            | InteractionState::EditingLabel { .. }
            | InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
                Outcome::Cancelled
            }
            InteractionState::Idle | InteractionState::DraggingNode { .. } => Outcome::Ignored,
        }
    }

    /// Adds a default node of `kind` with a generated id and selects it.
    pub fn add_node(&mut self, kind: NodeKind) -> Outcome {
        let node = Node::new(
            format!("node-{}", Uuid::new_v4()),
            kind,
            self.config.new_node_position,
            self.config.new_node_text.clone(),
        );
        match self.insert_node(node) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("failed to add node: {err}");
                Outcome::Ignored
            }
        }
    }

    pub fn insert_node(&mut self, node: Node) -> Result<Outcome> {
        let id = node.id.clone();
        self.graph = self.graph.add_node(node)?;
        self.selection = Some(id);
        self.commit();
        Ok(Outcome::Committed)
    }

    pub fn delete_node(&mut self, node_id: &str) -> Outcome {
        if !self.graph.contains(node_id) {
            return Outcome::Ignored;
        }
        if self.state.subject() == Some(node_id) {
            debug!(node = node_id, mode = self.state.name(), "gesture subject deleted");
            self.state = InteractionState::Idle;
        }
        if self.selection.as_deref() == Some(node_id) {
            self.selection = None;
        }
        self.graph = self.graph.remove_node(node_id);
        self.commit();
        Outcome::Committed
    }

    pub fn disconnect(&mut self, from: &str, to: &str) -> Outcome {
        let next = self.graph.disconnect(from, to);
        if next == self.graph {
            return Outcome::Ignored;
        }
        self.graph = next;
        self.commit();
        Outcome::Committed
    }

    /// Ignored mid-drag: the drag commits on pointer-up like any other edit.
    pub fn undo(&mut self) -> Outcome {
        if matches!(self.state, InteractionState::DraggingNode { .. }) {
            return Outcome::Ignored;
        }
        let Some(snapshot) = self.history.undo().cloned() else {
            return Outcome::Ignored;
        };
        self.restore(snapshot);
        Outcome::Restored
    }

    pub fn redo(&mut self) -> Outcome {
        if matches!(self.state, InteractionState::DraggingNode { .. }) {
            return Outcome::Ignored;
        }
        let Some(snapshot) = self.history.redo().cloned() else {
            return Outcome::Ignored;
        };
        self.restore(snapshot);
        Outcome::Restored
    }

    pub fn zoom(&mut self, direction: ZoomDirection) -> Outcome {
        let next = geometry::zoom(&self.viewport, direction, &self.config.zoom);
        if next == self.viewport {
            return Outcome::Ignored;
        }
        self.viewport = next;
        Outcome::ViewChanged
    }

    /// Source anchor and pointer end of the live connection line, in world space.
    pub fn connection_preview(&self) -> Option<(Point, Point)> {
        match &self.state {
            InteractionState::Connecting {
                source_id,
                preview_end,
            } => {
                let source = self.graph.get(source_id)?;
                Some((self.skin.anchor(source, AnchorSide::Center), *preview_end))
            }
            _ => None,
        }
    }

    pub fn navigation_request(&self, node_id: &str) -> Option<NavigationRequest> {
        let node = self.graph.get(node_id)?;
        let route = node.kind.route()?;
        Some(NavigationRequest {
            route,
            node_id: node.id.clone(),
        })
    }

    fn complete_connection(&mut self, source_id: &str, target_id: &str) -> Outcome {
        if !self.graph.contains(target_id) {
            return Outcome::Ignored;
        }
        self.state = InteractionState::Idle;
        if source_id == target_id {
            return Outcome::Cancelled;
        }
        self.graph = self.graph.connect(source_id, target_id);
        if self.commit() {
            Outcome::Committed
        } else {
            Outcome::ViewChanged
        }
    }

    /// Treats an interaction elsewhere as blur for an open label editor.
    fn blur_editor(&mut self, target: &PointerTarget) -> Option<Outcome> {
        let inside = match (&self.state, target) {
            (InteractionState::EditingLabel { node_id, .. }, PointerTarget::Node(id)) => {
                node_id == id
            }
            (InteractionState::EditingLabel { .. }, PointerTarget::Canvas) => false,
            _ => return None,
        };
        if inside { None } else { self.finish_edit() }
    }

    fn finish_edit(&mut self) -> Option<Outcome> {
        if !matches!(self.state, InteractionState::EditingLabel { .. }) {
            return None;
        }
        let InteractionState::EditingLabel { node_id, buffer } = std::mem::take(&mut self.state)
        else {
            return None;
        };
        self.graph = self.graph.update_node(&node_id, &NodePatch::text(buffer));
        if self.commit() {
            Some(Outcome::Committed)
        } else {
            Some(Outcome::ViewChanged)
        }
    }

    fn restore(&mut self, snapshot: Graph) {
        self.graph = snapshot;
        self.state = InteractionState::Idle;
        if self
            .selection
            .as_deref()
            .is_some_and(|id| !self.graph.contains(id))
        {
            self.selection = None;
        }
    }

    /// Pushes the live graph unless it already matches the current snapshot.
    fn commit(&mut self) -> bool {
        if self.history.current() == Some(&self.graph) {
            return false;
        }
        self.history.commit(self.graph.clone());
        debug!(
            index = self.history.index(),
            nodes = self.graph.len(),
            "committed snapshot"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> Graph {
        Graph::from_nodes([
            Node::new("n1", NodeKind::Start, Point::new(103.0, 47.0), "Start")
                .with_connections(["n2"]),
            Node::new("n2", NodeKind::Task, Point::new(300.0, 200.0), "Research"),
            Node::new("n3", NodeKind::End, Point::new(300.0, 400.0), "Done"),
        ])
        .unwrap()
    }

    fn canvas() -> Canvas {
        Canvas::with_config(workflow(), test_config(), Arc::new(WorkflowSkin))
    }

    fn test_config() -> CanvasConfig {
        CanvasConfig {
            grid_size: Some(20.0),
            ..CanvasConfig::default()
        }
    }

    fn node(id: &str) -> PointerTarget {
        PointerTarget::Node(id.to_string())
    }

    #[test]
    fn drag_snaps_and_commits_once_on_release() {
        let mut canvas = canvas();
        assert_eq!(
            canvas.pointer_down(node("n1"), Point::new(103.0, 47.0)),
            Outcome::ViewChanged
        );
        assert_eq!(canvas.pointer_move(Point::new(180.0, 90.0)), Outcome::GraphPending);
        assert_eq!(canvas.pointer_move(Point::new(238.0, 119.0)), Outcome::GraphPending);
        assert_eq!(canvas.history().len(), 1);

        assert_eq!(canvas.pointer_up(), Outcome::Committed);
        assert_eq!(canvas.graph().get("n1").unwrap().position, Point::new(240.0, 120.0));
        assert_eq!(canvas.history().len(), 2);
        assert!(canvas.state().is_idle());
    }

    #[test]
    fn drag_keeps_grab_offset_and_respects_viewport() {
        let mut canvas = canvas().with_viewport(Viewport::new(Point::new(10.0, 10.0), 2.0));
        // n2 at world (300, 200) shows at screen (620, 420); grab it 20px right of its origin.
        canvas.pointer_down(node("n2"), Point::new(640.0, 420.0));
        canvas.pointer_move(Point::new(680.0, 460.0));
        assert_eq!(canvas.graph().get("n2").unwrap().position, Point::new(320.0, 220.0));
    }

    #[test]
    fn click_without_movement_leaves_history_alone() {
        let mut canvas = canvas();
        canvas.pointer_down(node("n2"), Point::new(300.0, 200.0));
        assert_eq!(canvas.pointer_up(), Outcome::ViewChanged);
        assert_eq!(canvas.click(node("n2")), Outcome::ViewChanged);
        assert_eq!(canvas.selection(), Some("n2"));
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn drag_cannot_be_cancelled() {
        let mut canvas = canvas();
        canvas.pointer_down(node("n2"), Point::new(300.0, 200.0));
        canvas.pointer_move(Point::new(400.0, 200.0));
        assert_eq!(canvas.cancel(), Outcome::Ignored);
        assert_eq!(canvas.pointer_up(), Outcome::Committed);
        assert_eq!(canvas.graph().get("n2").unwrap().position, Point::new(400.0, 200.0));
    }

    #[test]
    fn panning_moves_offset_by_raw_screen_delta() {
        let mut canvas = canvas().with_viewport(Viewport::new(Point::ZERO, 2.0));
        canvas.pointer_down(PointerTarget::Canvas, Point::new(10.0, 10.0));
        canvas.pointer_move(Point::new(20.0, 15.0));
        canvas.pointer_move(Point::new(30.0, 20.0));
        assert_eq!(canvas.viewport().offset, Point::new(20.0, 10.0));
        assert_eq!(canvas.pointer_leave(), Outcome::ViewChanged);
        assert!(canvas.state().is_idle());
        // Viewport changes never reach history.
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn connection_completes_on_target_click() {
        let mut canvas = canvas();
        assert_eq!(canvas.start_connection("n2"), Outcome::ViewChanged);
        let (start, end) = canvas.connection_preview().unwrap();
        assert_eq!(start, Point::new(350.0, 232.0));
        assert_eq!(end, start);

        canvas.pointer_move(Point::new(500.0, 500.0));
        assert_eq!(canvas.connection_preview().unwrap().1, Point::new(500.0, 500.0));

        assert_eq!(canvas.click(node("n3")), Outcome::Committed);
        assert_eq!(canvas.graph().get("n2").unwrap().connections, vec!["n3"]);
        assert!(canvas.state().is_idle());
        assert!(canvas.connection_preview().is_none());
    }

    #[test]
    fn connection_takes_precedence_over_selection() {
        let mut canvas = canvas();
        canvas.click(node("n3"));
        canvas.start_connection("n2");
        canvas.pointer_down(node("n3"), Point::new(300.0, 400.0));
        assert!(matches!(canvas.state(), InteractionState::Connecting { .. }));
        canvas.click(node("n3"));
        assert_eq!(canvas.selection(), Some("n3"));
        assert!(canvas.graph().get("n2").unwrap().points_to("n3"));
    }

    #[test]
    fn connection_to_self_or_existing_edge_commits_nothing() {
        let mut canvas = canvas();
        canvas.start_connection("n1");
        assert_eq!(canvas.click(node("n1")), Outcome::Cancelled);

        canvas.start_connection("n1");
        assert_eq!(canvas.click(node("n2")), Outcome::ViewChanged);
        assert_eq!(canvas.graph().get("n1").unwrap().connections, vec!["n2"]);
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn canvas_click_cancels_connection() {
        let mut canvas = canvas();
        canvas.click(node("n2"));
        canvas.start_connection("n2");
        assert_eq!(canvas.click(PointerTarget::Canvas), Outcome::Cancelled);
        assert!(canvas.state().is_idle());
        assert_eq!(canvas.selection(), None);
        assert_eq!(canvas.graph(), &workflow());
    }

    #[test]
    fn selection_toggles() {
        let mut canvas = canvas();
        canvas.click(node("n2"));
        assert_eq!(canvas.selection(), Some("n2"));
        canvas.click(node("n2"));
        assert_eq!(canvas.selection(), None);
        assert_eq!(canvas.click(PointerTarget::Canvas), Outcome::Ignored);
    }

    #[test]
    fn label_edit_commits_on_confirm() {
        let mut canvas = canvas();
        assert_eq!(canvas.double_click("n2"), Outcome::ViewChanged);
        canvas.edit_input("Research ideas".into());
        assert_eq!(canvas.graph().get("n2").unwrap().text, "Research");
        assert_eq!(canvas.confirm_edit(), Outcome::Committed);
        assert_eq!(canvas.graph().get("n2").unwrap().text, "Research ideas");
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn label_edit_commits_on_blur_and_discards_on_cancel() {
        let mut canvas = canvas();
        canvas.double_click("n3");
        canvas.edit_input("Shipped".into());
        assert_eq!(canvas.click(PointerTarget::Canvas), Outcome::Committed);
        assert_eq!(canvas.graph().get("n3").unwrap().text, "Shipped");

        canvas.double_click("n3");
        canvas.edit_input("Nope".into());
        assert_eq!(canvas.cancel(), Outcome::Cancelled);
        assert_eq!(canvas.graph().get("n3").unwrap().text, "Shipped");
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn typing_inside_edited_node_does_not_blur() {
        let mut canvas = canvas();
        canvas.double_click("n2");
        assert_eq!(canvas.click(node("n2")), Outcome::Ignored);
        assert!(matches!(canvas.state(), InteractionState::EditingLabel { .. }));
    }

    #[test]
    fn deleting_gesture_subject_returns_to_idle() {
        let mut canvas = canvas();
        canvas.start_connection("n1");
        assert_eq!(canvas.delete_node("n1"), Outcome::Committed);
        assert!(canvas.state().is_idle());

        canvas.pointer_down(node("n2"), Point::new(300.0, 200.0));
        canvas.delete_node("n2");
        assert!(canvas.state().is_idle());
        assert_eq!(canvas.pointer_move(Point::new(0.0, 0.0)), Outcome::Ignored);
        assert_eq!(canvas.graph().ids(), ["n3"]);
    }

    #[test]
    fn delete_clears_selection_and_detaches() {
        let mut canvas = canvas();
        canvas.click(node("n2"));
        canvas.delete_node("n2");
        assert_eq!(canvas.selection(), None);
        assert!(canvas.graph().get("n1").unwrap().connections.is_empty());
        assert_eq!(canvas.delete_node("n2"), Outcome::Ignored);
    }

    #[test]
    fn add_node_selects_and_commits() {
        let mut canvas = canvas();
        assert_eq!(canvas.add_node(NodeKind::Decision), Outcome::Committed);
        let id = canvas.selection().unwrap().to_string();
        assert!(id.starts_with("node-"));
        let node = canvas.graph().get(&id).unwrap();
        assert_eq!(node.text, "New Node");
        assert_eq!(node.position, Point::new(100.0, 100.0));
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn insert_node_rejects_duplicates_without_side_effects() {
        let mut canvas = canvas();
        let err = canvas
            .insert_node(Node::new("n1", NodeKind::Task, Point::ZERO, "dup"))
            .unwrap_err();
        assert!(matches!(err, crate::CanvasError::DuplicateId { .. }));
        assert_eq!(canvas.graph(), &workflow());
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn undo_redo_restore_snapshots_and_reset_mode() {
        let mut canvas = canvas();
        canvas.delete_node("n3");
        canvas.start_connection("n2");
        assert_eq!(canvas.undo(), Outcome::Restored);
        assert!(canvas.state().is_idle());
        assert!(canvas.graph().contains("n3"));
        assert_eq!(canvas.undo(), Outcome::Ignored);
        assert_eq!(canvas.redo(), Outcome::Restored);
        assert!(!canvas.graph().contains("n3"));
        assert_eq!(canvas.redo(), Outcome::Ignored);
    }

    #[test]
    fn redo_branch_is_dropped_after_new_edit() {
        let mut canvas = canvas();
        canvas.delete_node("n3");
        canvas.undo();
        canvas.disconnect("n1", "n2");
        assert!(!canvas.can_redo());
        assert_eq!(canvas.redo(), Outcome::Ignored);
    }

    #[test]
    fn undo_drops_selection_of_vanished_node() {
        let mut canvas = canvas();
        canvas.add_node(NodeKind::Task);
        assert!(canvas.selection().is_some());
        canvas.undo();
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let mut canvas = canvas();
        assert_eq!(canvas.pointer_up(), Outcome::Ignored);
        assert_eq!(canvas.pointer_move(Point::new(5.0, 5.0)), Outcome::Ignored);
        assert_eq!(canvas.confirm_edit(), Outcome::Ignored);
        assert_eq!(canvas.edit_input("x".into()), Outcome::Ignored);
        assert_eq!(canvas.cancel(), Outcome::Ignored);
        assert_eq!(canvas.start_connection("ghost"), Outcome::Ignored);
        assert_eq!(canvas.double_click("ghost"), Outcome::Ignored);
        assert_eq!(canvas.pointer_down(node("ghost"), Point::ZERO), Outcome::Ignored);
        assert_eq!(canvas.graph(), &workflow());
    }

    #[test]
    fn zoom_is_clamped_and_outside_history() {
        let mut canvas = canvas();
        for _ in 0..10 {
            canvas.zoom(ZoomDirection::In);
        }
        assert_eq!(canvas.viewport().scale, 2.0);
        assert_eq!(canvas.zoom(ZoomDirection::In), Outcome::Ignored);
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn undo_and_redo_wait_for_an_open_drag() {
        let mut canvas = canvas();
        canvas.delete_node("n3");
        canvas.pointer_down(node("n2"), Point::new(300.0, 200.0));
        canvas.pointer_move(Point::new(400.0, 200.0));

        assert_eq!(canvas.undo(), Outcome::Ignored);
        assert_eq!(canvas.redo(), Outcome::Ignored);
        assert!(matches!(canvas.state(), InteractionState::DraggingNode { .. }));
        assert!(!canvas.graph().contains("n3"));

        assert_eq!(canvas.pointer_up(), Outcome::Committed);
        assert_eq!(canvas.undo(), Outcome::Restored);
        assert_eq!(canvas.graph().get("n2").unwrap().position, Point::new(300.0, 200.0));
        assert!(!canvas.graph().contains("n3"));
    }

    #[test]
    fn crossed_zoom_limits_never_panic() {
        let mut config = test_config();
        config.zoom.min_scale = 3.0;
        let mut canvas = Canvas::with_config(workflow(), config, Arc::new(WorkflowSkin))
            .with_viewport(Viewport::new(Point::ZERO, 1.0));
        assert_eq!(canvas.viewport().scale, 3.0);
        assert_eq!(canvas.zoom(ZoomDirection::In), Outcome::Ignored);
        assert_eq!(canvas.zoom(ZoomDirection::Out), Outcome::Ignored);
        assert_eq!(canvas.viewport().scale, 3.0);
    }

    #[test]
    fn state_serializes_with_camel_case_fields() {
        let mut canvas = canvas();
        canvas.start_connection("n2");
        let json = serde_json::to_value(canvas.state()).unwrap();
        assert_eq!(json["mode"], "connecting");
        assert_eq!(json["sourceId"], "n2");
        assert_eq!(json["previewEnd"], serde_json::json!({ "x": 350.0, "y": 232.0 }));
    }

    #[test]
    fn failed_import_leaves_canvas_untouched() {
        let mut canvas = canvas();
        canvas.click(node("n1"));
        let err = canvas
            .import_json(
                r#"[{"id":"x","type":"task","position":{"x":0,"y":0}},
                    {"id":"x","type":"end","position":{"x":0,"y":0}}]"#,
            )
            .unwrap_err();
        assert!(matches!(err, crate::CanvasError::MalformedImport(_)));
        assert_eq!(canvas.graph(), &workflow());
        assert_eq!(canvas.selection(), Some("n1"));
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn import_is_undoable() {
        let mut canvas = canvas();
        canvas
            .import_json(r#"[{"id":"solo","type":"task","position":{"x":0,"y":0},"text":"Solo"}]"#)
            .unwrap();
        assert_eq!(canvas.graph().ids(), ["solo"]);
        canvas.undo();
        assert_eq!(canvas.graph(), &workflow());
    }

    #[test]
    fn dispatch_routes_json_events() {
        let mut canvas = canvas();
        let events: Vec<CanvasEvent> = serde_json::from_str(
            r#"[
                {"event": "startConnection", "node": "n2"},
                {"event": "pointerMove", "at": {"x": 10, "y": 10}},
                {"event": "click", "target": {"node": "n3"}},
                {"event": "zoom", "direction": "in"},
                {"event": "click", "target": "canvas"}
            ]"#,
        )
        .unwrap();
        let outcomes: Vec<Outcome> = events.into_iter().map(|e| canvas.dispatch(e)).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::ViewChanged,
                Outcome::ViewChanged,
                Outcome::Committed,
                Outcome::ViewChanged,
                Outcome::Ignored,
            ]
        );
        assert!(canvas.graph().get("n2").unwrap().points_to("n3"));
    }

    #[test]
    fn navigation_only_for_document_kinds() {
        let canvas = canvas();
        assert_eq!(
            canvas.navigation_request("n2"),
            Some(NavigationRequest {
                route: "/tasks",
                node_id: "n2".into()
            })
        );
        assert_eq!(canvas.navigation_request("n1"), None);
        assert_eq!(canvas.navigation_request("ghost"), None);
    }
}

pub mod config;
pub mod error;
pub mod geometry;
pub mod goals;
pub mod graph;
pub mod history;
pub mod import;
pub mod interaction;
pub mod render;
pub mod skin;
pub mod utils;

pub use config::CanvasConfig;
pub use error::{CanvasError, Result};
pub use geometry::{
    AnchorSide, Point, Size, Viewport, ZoomDirection, ZoomLimits, anchor_point, pan,
    screen_to_world, snap_to_grid, world_to_screen, zoom,
};
pub use goals::{
    CATEGORIES, Category, GoalActivation, GoalEntry, GoalRecord, GoalTree, category_named,
};
pub use graph::{Connection, Graph, Node, NodeKind, NodePatch};
pub use history::History;
pub use import::{GraphDocument, WorkflowDocument, WorkflowLibrary};
pub use interaction::{
    Canvas, CanvasEvent, InteractionState, NavigationRequest, Outcome, PointerTarget,
};
pub use render::{ConnectionLine, NodeBox, PreviewLine, Scene};
pub use skin::{DocumentSkin, GoalSkin, NodeShape, NodeSkin, SkinKind, WorkflowSkin};

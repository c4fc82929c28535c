//! JSON documents crossing the import/export boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CanvasError, Result};
use crate::graph::{Graph, Node};
use crate::utils::slugify;

const IMPORTED_ID: &str = "imported";
const IMPORTED_TITLE: &str = "Imported Workflow";

/// One workflow as exported by the builder page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            goal_id: None,
            nodes: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validated graph built from `nodes`.
    pub fn graph(&self) -> Result<Graph> {
        validate(self.nodes.clone())
    }

    /// Copy of this document carrying the nodes of `graph`.
    pub fn with_graph(&self, graph: &Graph) -> Self {
        Self {
            nodes: graph.to_nodes(),
            ..self.clone()
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export_file_name(&self) -> String {
        format!("{}-workflow.json", slugify(&self.title))
    }
}

/// Bundle of workflow templates, as shipped in the app's import file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLibrary {
    #[serde(default, alias = "workflowTemplates")]
    pub workflows: Vec<WorkflowDocument>,
}

impl WorkflowLibrary {
    pub fn parse(json: &str) -> Result<Self> {
        let library: WorkflowLibrary = serde_json::from_str(json)?;
        for workflow in &library.workflows {
            workflow.graph().map_err(|err| {
                CanvasError::malformed(format!("workflow `{}`: {err}", workflow.id))
            })?;
        }
        Ok(library)
    }

    pub fn find(&self, id: &str) -> Option<&WorkflowDocument> {
        self.workflows.iter().find(|workflow| workflow.id == id)
    }
}

/// Anything the canvas accepts on import: a full workflow document or a bare
/// array of nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphDocument {
    Workflow(WorkflowDocument),
    Nodes(Vec<Node>),
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(_) => Ok(GraphDocument::Nodes(serde_json::from_value(value)?)),
            Value::Object(_) => Ok(GraphDocument::Workflow(serde_json::from_value(value)?)),
            other => Err(CanvasError::malformed(format!(
                "expected a workflow object or an array of nodes, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parses and validates in one step.
    pub fn parse(json: &str) -> Result<Graph> {
        Self::from_json(json)?.into_graph()
    }

    pub fn nodes(&self) -> &[Node] {
        match self {
            GraphDocument::Workflow(workflow) => &workflow.nodes,
            GraphDocument::Nodes(nodes) => nodes,
        }
    }

    pub fn into_graph(self) -> Result<Graph> {
        match self {
            GraphDocument::Workflow(workflow) => validate(workflow.nodes),
            GraphDocument::Nodes(nodes) => validate(nodes),
        }
    }

    /// The document as a workflow; bare node arrays get a placeholder header.
    pub fn into_workflow(self) -> WorkflowDocument {
        match self {
            GraphDocument::Workflow(workflow) => workflow,
            GraphDocument::Nodes(nodes) => WorkflowDocument {
                nodes,
                ..WorkflowDocument::new(IMPORTED_ID, IMPORTED_TITLE)
            },
        }
    }
}

fn validate(nodes: Vec<Node>) -> Result<Graph> {
    if let Some(position) = nodes.iter().position(|node| node.id.trim().is_empty()) {
        return Err(CanvasError::malformed(format!(
            "node at index {position} has an empty id"
        )));
    }

    let graph = Graph::from_nodes(nodes).map_err(|err| match err {
        CanvasError::DuplicateId { id } => {
            warn!(%id, "rejecting import with duplicate node id");
            CanvasError::malformed(format!("duplicate node id `{id}`"))
        }
        other => other,
    })?;

    let dangling = graph.dangling_references();
    if !dangling.is_empty() {
        debug!(count = dangling.len(), "imported graph has dangling connections");
    }
    Ok(graph)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

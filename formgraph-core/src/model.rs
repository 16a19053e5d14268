use crate::error::{Diagnostic, DiagnosticKind};
use formgraph_forms::ItemHandle;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Destination cell value meaning "submit the form".
pub const END: &str = "END";
/// Destination cell value for a go-to target that could not be resolved.
pub const UNKNOWN_SECTION: &str = "UNKNOWN_SECTION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Section,  // page break
    Question, // multiple choice with navigation
    Unsupported(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Section => "Section",
            NodeType::Question => "Question",
            NodeType::Unsupported(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Section" => NodeType::Section,
            "Question" => NodeType::Question,
            other => NodeType::Unsupported(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: String,
    pub node_type: NodeType,
    pub text: String,
    pub description: String,
    pub external_id: Option<ItemHandle>,
}

impl Node {
    pub fn new(node_id: impl Into<String>, node_type: NodeType, text: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            text: text.into(),
            description: String::new(),
            external_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_external_id(mut self, handle: ItemHandle) -> Self {
        self.external_id = Some(handle);
        self
    }

    pub fn is_question(&self) -> bool {
        self.node_type == NodeType::Question
    }
}

/// Navigation outcome of a choice, as written in the Destination ID column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Node(String),
    End,
    Fallthrough,
    Unknown,
}

impl Destination {
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim() {
            "" => Destination::Fallthrough,
            END => Destination::End,
            UNKNOWN_SECTION => Destination::Unknown,
            id => Destination::Node(id.to_string()),
        }
    }

    pub fn as_cell(&self) -> &str {
        match self {
            Destination::Node(id) => id,
            Destination::End => END,
            Destination::Fallthrough => "",
            Destination::Unknown => UNKNOWN_SECTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub choice_text: String,
    pub destination: Destination,
}

impl Edge {
    pub fn new(
        source_id: impl Into<String>,
        choice_text: impl Into<String>,
        destination: Destination,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            choice_text: choice_text.into(),
            destination,
        }
    }
}

/// Group edges by source id, keeping table order within each group.
pub fn edges_by_source(edges: &[Edge]) -> HashMap<&str, Vec<&Edge>> {
    let mut grouped: HashMap<&str, Vec<&Edge>> = HashMap::new();
    for edge in edges {
        grouped.entry(edge.source_id.as_str()).or_default().push(edge);
    }
    grouped
}

/// Check that every choice's navigation can be resolved, without touching a form.
pub fn check_graph(nodes: &[Node], edges: &[Edge]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut by_id: HashMap<&str, &Node> = HashMap::new();
    let mut seen = HashSet::new();

    for node in nodes {
        if let NodeType::Unsupported(label) = &node.node_type {
            diagnostics.push(Diagnostic::warn(
                DiagnosticKind::UnsupportedNodeType,
                &node.node_id,
                format!("Type '{}' is neither Section nor Question", label),
            ));
        }
        if !seen.insert(node.node_id.as_str()) {
            diagnostics.push(Diagnostic::warn(
                DiagnosticKind::DuplicateNodeId,
                &node.node_id,
                "Node ID appears more than once",
            ));
            continue;
        }
        by_id.insert(node.node_id.as_str(), node);
    }

    for edge in edges {
        let subject = format!("{} -> \"{}\"", edge.source_id, edge.choice_text);
        match by_id.get(edge.source_id.as_str()) {
            Some(source) if source.is_question() => {}
            Some(_) => diagnostics.push(Diagnostic::warn(
                DiagnosticKind::OrphanEdge,
                &subject,
                format!("Source {} is not a Question", edge.source_id),
            )),
            None => diagnostics.push(Diagnostic::warn(
                DiagnosticKind::OrphanEdge,
                &subject,
                format!("Source {} does not exist", edge.source_id),
            )),
        }

        match &edge.destination {
            Destination::End | Destination::Fallthrough => {}
            Destination::Unknown => diagnostics.push(Diagnostic::warn(
                DiagnosticKind::UnresolvedDestination,
                &subject,
                "Destination was never resolved (UNKNOWN_SECTION)",
            )),
            Destination::Node(id) => match by_id.get(id.as_str()) {
                Some(target) if target.node_type == NodeType::Section => {}
                Some(_) => diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::UnresolvedDestination,
                    &subject,
                    format!("Destination {} is not a Section", id),
                )),
                None => diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::UnresolvedDestination,
                    &subject,
                    format!("Destination {} does not exist", id),
                )),
            },
        }
    }

    diagnostics
}

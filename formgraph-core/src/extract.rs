// Graph extraction: live form items -> node and edge tables

use crate::error::{Diagnostic, DiagnosticKind};
use crate::ident::IdAllocator;
use crate::model::{Destination, Edge, Node, NodeType};
use formgraph_forms::{FormItem, ItemHandle, ItemKind, Navigation};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub diagnostics: Vec<Diagnostic>,
    /// Items that are neither page breaks nor multiple choice questions
    pub skipped_items: usize,
}

fn classify(kind: ItemKind) -> Option<NodeType> {
    match kind {
        ItemKind::PageBreak => Some(NodeType::Section),
        ItemKind::MultipleChoice => Some(NodeType::Question),
        _ => None,
    }
}

/// Build the node and edge tables for a list of form items in document order.
///
/// Runs two passes so go-to targets later in the form resolve like earlier
/// ones. A target that maps to no node becomes `UNKNOWN_SECTION` and is
/// reported as a diagnostic rather than failing the read.
pub fn extract(items: &[FormItem]) -> Extraction {
    let mut extraction = Extraction::default();
    let mut ids = IdAllocator::new();
    let mut node_for_item: HashMap<&ItemHandle, usize> = HashMap::new();

    for item in items {
        let Some(node_type) = classify(item.kind) else {
            debug!("Skipping {} item {}", item.kind.as_str(), item.handle);
            extraction.skipped_items += 1;
            continue;
        };

        let node_id = ids.allocate(&item.title);
        node_for_item.insert(&item.handle, extraction.nodes.len());
        extraction.nodes.push(Node {
            node_id,
            node_type,
            text: item.title.clone(),
            description: item.help_text.clone(),
            external_id: Some(item.handle.clone()),
        });
    }

    for item in items.iter().filter(|i| i.kind == ItemKind::MultipleChoice) {
        let Some(&index) = node_for_item.get(&item.handle) else {
            continue;
        };
        let source = &extraction.nodes[index];

        for choice in &item.choices {
            let destination = match &choice.navigation {
                Navigation::GoTo(target) => match node_for_item.get(target) {
                    Some(&target_index) => {
                        Destination::Node(extraction.nodes[target_index].node_id.clone())
                    }
                    None => {
                        extraction.diagnostics.push(Diagnostic::warn(
                            DiagnosticKind::UnresolvedDestination,
                            format!("{} -> \"{}\"", source.node_id, choice.value),
                            format!(
                                "Destination section {} not found for choice \"{}\" in question \"{}\"",
                                target, choice.value, source.text
                            ),
                        ));
                        Destination::Unknown
                    }
                },
                Navigation::Submit => Destination::End,
                Navigation::Continue | Navigation::Restart => Destination::Fallthrough,
            };

            extraction.edges.push(Edge {
                source_id: source.node_id.clone(),
                choice_text: choice.value.clone(),
                destination,
            });
        }
    }

    info!(
        "Extracted {} nodes and {} edges ({} items skipped)",
        extraction.nodes.len(),
        extraction.edges.len(),
        extraction.skipped_items
    );
    extraction
}

// Graph materialization: node and edge tables -> live form

use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::ident::IdAllocator;
use crate::model::{Destination, Edge, Node, NodeType, edges_by_source};
use crate::reconcile::reconcile;
use formgraph_forms::{Choice, FormItem, FormService, ItemHandle, ItemKind, Navigation};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// What a materialization did to the live form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    /// (node id, new handle) for every item created
    pub created: Vec<(String, ItemHandle)>,
    pub updated: usize,
    pub unchanged: usize,
    /// Node ids generated for rows that had none
    pub assigned_ids: Vec<String>,
    pub moves: usize,
    pub choice_lists: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl MaterializeReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated == 0 && self.moves == 0
    }
}

/// Apply the node and edge tables to a live form.
///
/// `live_items` is the form's item list as read before the call. Nodes are
/// mutated in place: rows without an id get one, and newly created items have
/// their handle stored in `external_id` so the caller can persist it.
pub fn materialize<F>(
    form: &mut F,
    nodes: &mut [Node],
    edges: &[Edge],
    live_items: &[FormItem],
) -> Result<MaterializeReport>
where
    F: FormService + ?Sized,
{
    let mut report = MaterializeReport::default();
    assign_missing_ids(nodes, &mut report);

    // Step A: create or update one live item per node
    let live_by_handle: HashMap<&ItemHandle, &FormItem> =
        live_items.iter().map(|i| (&i.handle, i)).collect();
    let mut handles: HashMap<String, ItemHandle> = HashMap::new();
    let mut kinds: HashMap<ItemHandle, ItemKind> =
        live_items.iter().map(|i| (i.handle.clone(), i.kind)).collect();
    let mut created_order: Vec<ItemHandle> = Vec::new();

    for node in nodes.iter_mut() {
        let live = node
            .external_id
            .as_ref()
            .and_then(|h| live_by_handle.get(h).copied());

        let handle = match live {
            Some(item) if expected_kind(&node.node_type).is_some_and(|k| k != item.kind) => {
                report.diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::ItemKindMismatch,
                    &node.node_id,
                    format!(
                        "Google ID {} is a {} item but the row says {}, skipping",
                        item.handle,
                        item.kind.as_str(),
                        node.node_type.as_str()
                    ),
                ));
                continue;
            }
            Some(item) => {
                if item.title != node.text || item.help_text != node.description {
                    form.set_title(&item.handle, &node.text)?;
                    form.set_help_text(&item.handle, &node.description)?;
                    report.updated += 1;
                } else {
                    report.unchanged += 1;
                }
                item.handle.clone()
            }
            None => {
                if let Some(stale) = &node.external_id {
                    report.diagnostics.push(Diagnostic::warn(
                        DiagnosticKind::StaleExternalId,
                        &node.node_id,
                        format!("Google ID {} no longer exists in the form, recreating", stale),
                    ));
                }
                let handle = match node.node_type {
                    NodeType::Section => form.create_page_break(&node.text, &node.description)?,
                    NodeType::Question => {
                        form.create_multiple_choice(&node.text, &node.description)?
                    }
                    NodeType::Unsupported(ref label) => {
                        report.diagnostics.push(Diagnostic::warn(
                            DiagnosticKind::UnsupportedNodeType,
                            &node.node_id,
                            format!("Cannot create an item of type '{}', skipping", label),
                        ));
                        continue;
                    }
                };
                if let Some(kind) = expected_kind(&node.node_type) {
                    kinds.insert(handle.clone(), kind);
                }
                debug!("Created item {} for node {}", handle, node.node_id);
                node.external_id = Some(handle.clone());
                report.created.push((node.node_id.clone(), handle.clone()));
                created_order.push(handle.clone());
                handle
            }
        };

        if handles.contains_key(&node.node_id) {
            report.diagnostics.push(Diagnostic::warn(
                DiagnosticKind::DuplicateNodeId,
                &node.node_id,
                "Node ID appears more than once; navigation uses the first row",
            ));
        } else {
            handles.insert(node.node_id.clone(), handle);
        }
    }

    // Step B: reorder live items to follow table order
    let desired: Vec<ItemHandle> = nodes.iter().filter_map(|n| n.external_id.clone()).collect();
    let current: Vec<ItemHandle> = live_items
        .iter()
        .map(|i| i.handle.clone())
        .chain(created_order)
        .collect();
    report.moves = reconcile(&desired, &current, |handle, before| {
        form.move_item(handle, before)
    })?;

    // Step C: rebuild every question's choice list from its edges
    let is_kind = |handle: &ItemHandle, kind: ItemKind| kinds.get(handle) == Some(&kind);
    let sections: HashSet<&str> = handles
        .iter()
        .filter(|(_, handle)| is_kind(*handle, ItemKind::PageBreak))
        .map(|(id, _)| id.as_str())
        .collect();
    let grouped = edges_by_source(edges);

    for node in nodes.iter().filter(|n| n.is_question()) {
        let Some(handle) = handles
            .get(&node.node_id)
            .filter(|h| is_kind(*h, ItemKind::MultipleChoice))
        else {
            continue;
        };
        let choices: Vec<Choice> = grouped
            .get(node.node_id.as_str())
            .map(|edges| {
                edges
                    .iter()
                    .map(|edge| build_choice(edge, &handles, &sections, &mut report))
                    .collect()
            })
            .unwrap_or_default();

        debug!("Setting {} choices on {}", choices.len(), node.node_id);
        form.set_choices(handle, choices)?;
        report.choice_lists += 1;
    }

    let questions: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.is_question())
        .map(|n| n.node_id.as_str())
        .collect();
    for edge in edges.iter().filter(|e| !questions.contains(e.source_id.as_str())) {
        report.diagnostics.push(Diagnostic::warn(
            DiagnosticKind::OrphanEdge,
            format!("{} -> \"{}\"", edge.source_id, edge.choice_text),
            format!("Source {} is not a Question node, edge ignored", edge.source_id),
        ));
    }

    info!(
        "Materialized {} nodes: {} created, {} updated, {} moves, {} choice lists",
        nodes.len(),
        report.created.len(),
        report.updated,
        report.moves,
        report.choice_lists
    );
    Ok(report)
}

fn expected_kind(node_type: &NodeType) -> Option<ItemKind> {
    match node_type {
        NodeType::Section => Some(ItemKind::PageBreak),
        NodeType::Question => Some(ItemKind::MultipleChoice),
        NodeType::Unsupported(_) => None,
    }
}

fn assign_missing_ids(nodes: &mut [Node], report: &mut MaterializeReport) {
    let mut ids = IdAllocator::with_existing(
        nodes
            .iter()
            .filter(|n| !n.node_id.is_empty())
            .map(|n| n.node_id.clone()),
    );
    for node in nodes.iter_mut().filter(|n| n.node_id.is_empty()) {
        node.node_id = ids.allocate(&node.text);
        debug!("Assigned id {} to \"{}\"", node.node_id, node.text);
        report.assigned_ids.push(node.node_id.clone());
    }
}

fn build_choice(
    edge: &Edge,
    handles: &HashMap<String, ItemHandle>,
    sections: &HashSet<&str>,
    report: &mut MaterializeReport,
) -> Choice {
    let navigation = match &edge.destination {
        Destination::End => Navigation::Submit,
        Destination::Fallthrough => Navigation::Continue,
        Destination::Node(id) if sections.contains(id.as_str()) => match handles.get(id) {
            Some(handle) => Navigation::GoTo(handle.clone()),
            None => Navigation::Continue,
        },
        other => {
            report.diagnostics.push(Diagnostic::warn(
                DiagnosticKind::UnresolvedDestination,
                format!("{} -> \"{}\"", edge.source_id, edge.choice_text),
                format!(
                    "Destination '{}' does not resolve to a section, continuing instead",
                    other.as_cell()
                ),
            ));
            Navigation::Continue
        }
    };
    Choice::new(edge.choice_text.clone(), navigation)
}

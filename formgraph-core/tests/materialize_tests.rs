use formgraph_core::extract::extract;
use formgraph_core::materialize::materialize;
use formgraph_core::{Destination, DiagnosticKind, Edge, Node, NodeType};
use formgraph_forms::{
    Choice, FormItem, FormService, ItemHandle, ItemKind, MemoryForm, Navigation,
};

/// Records every mutating call made against the wrapped form.
struct RecordingForm {
    inner: MemoryForm,
    calls: Vec<String>,
}

impl RecordingForm {
    fn new() -> Self {
        Self {
            inner: MemoryForm::new("Troubleshooting"),
            calls: Vec::new(),
        }
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn titles(&self) -> Vec<String> {
        self.inner
            .list_items()
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect()
    }

    fn item(&self, handle: &ItemHandle) -> FormItem {
        self.inner.item(handle).cloned().unwrap()
    }
}

impl FormService for RecordingForm {
    fn list_items(&self) -> formgraph_forms::error::Result<Vec<FormItem>> {
        self.inner.list_items()
    }

    fn create_page_break(
        &mut self,
        title: &str,
        help_text: &str,
    ) -> formgraph_forms::error::Result<ItemHandle> {
        self.calls.push(format!("create_page_break {}", title));
        self.inner.create_page_break(title, help_text)
    }

    fn create_multiple_choice(
        &mut self,
        title: &str,
        help_text: &str,
    ) -> formgraph_forms::error::Result<ItemHandle> {
        self.calls.push(format!("create_multiple_choice {}", title));
        self.inner.create_multiple_choice(title, help_text)
    }

    fn set_title(&mut self, handle: &ItemHandle, title: &str) -> formgraph_forms::error::Result<()> {
        self.calls.push(format!("set_title {}", handle));
        self.inner.set_title(handle, title)
    }

    fn set_help_text(
        &mut self,
        handle: &ItemHandle,
        help_text: &str,
    ) -> formgraph_forms::error::Result<()> {
        self.calls.push(format!("set_help_text {}", handle));
        self.inner.set_help_text(handle, help_text)
    }

    fn move_item(
        &mut self,
        handle: &ItemHandle,
        before: Option<&ItemHandle>,
    ) -> formgraph_forms::error::Result<()> {
        self.calls.push(format!("move_item {}", handle));
        self.inner.move_item(handle, before)
    }

    fn set_choices(
        &mut self,
        handle: &ItemHandle,
        choices: Vec<Choice>,
    ) -> formgraph_forms::error::Result<()> {
        self.calls.push(format!("set_choices {}", handle));
        self.inner.set_choices(handle, choices)
    }
}

fn section(id: &str, text: &str) -> Node {
    Node::new(id, NodeType::Section, text)
}

fn question(id: &str, text: &str) -> Node {
    Node::new(id, NodeType::Question, text)
}

fn run(form: &mut RecordingForm, nodes: &mut [Node], edges: &[Edge]) -> formgraph_core::MaterializeReport {
    let live = form.list_items().unwrap();
    materialize(form, nodes, edges, &live).unwrap()
}

fn troubleshooting_graph() -> (Vec<Node>, Vec<Edge>) {
    let nodes = vec![
        section("START", "Start").with_description("Begin here"),
        question("POWER_Q", "Does it turn on?"),
        section("SCREEN", "Screen Problems"),
    ];
    let edges = vec![
        Edge::new("POWER_Q", "Yes", Destination::Node("SCREEN".to_string())),
        Edge::new("POWER_Q", "No", Destination::End),
    ];
    (nodes, edges)
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_creates_items_in_table_order() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();

    let report = run(&mut form, &mut nodes, &edges);

    assert_eq!(report.created.len(), 3);
    assert_eq!(report.moves, 0);
    assert_eq!(form.titles(), vec!["Start", "Does it turn on?", "Screen Problems"]);
    assert!(nodes.iter().all(|n| n.external_id.is_some()));

    let items = form.list_items().unwrap();
    assert_eq!(items[0].kind, ItemKind::PageBreak);
    assert_eq!(items[0].help_text, "Begin here");
    assert_eq!(items[1].kind, ItemKind::MultipleChoice);
}

#[test]
fn test_yes_no_choices_navigate() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    let screen = nodes[2].external_id.clone().unwrap();
    let q = form.item(nodes[1].external_id.as_ref().unwrap());
    assert_eq!(
        q.choices,
        vec![
            Choice::new("Yes", Navigation::GoTo(screen)),
            Choice::new("No", Navigation::Submit),
        ]
    );
}

#[test]
fn test_missing_node_ids_are_generated() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![
        section("PRNT_TRBLSHT", "Printing Troubleshooting"),
        section("", "Printing Troubleshooting"),
    ];
    let report = run(&mut form, &mut nodes, &[]);

    assert_eq!(nodes[1].node_id, "PRNT_TRBLSHT_1");
    assert_eq!(report.assigned_ids, vec!["PRNT_TRBLSHT_1".to_string()]);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_second_run_changes_nothing() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);
    let before = form.inner.document().clone();
    form.calls.clear();

    let report = run(&mut form, &mut nodes, &edges);

    assert!(report.is_noop());
    assert_eq!(report.unchanged, 3);
    assert_eq!(form.count("create"), 0);
    assert_eq!(form.count("move_item"), 0);
    assert_eq!(form.count("set_title"), 0);
    assert_eq!(form.inner.document(), &before);
}

#[test]
fn test_extracted_tables_round_trip_without_changes() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);
    let before = form.inner.document().clone();
    form.calls.clear();

    let extraction = extract(&form.list_items().unwrap());
    let mut read_nodes = extraction.nodes.clone();
    let report = run(&mut form, &mut read_nodes, &extraction.edges);

    assert!(report.is_noop());
    assert!(report.diagnostics.is_empty());
    assert_eq!(form.count("move_item"), 0);
    assert_eq!(form.count("set_help_text"), 0);
    assert_eq!(form.inner.document(), &before);
}

// ============================================================================
// Updates and reordering
// ============================================================================

#[test]
fn test_updates_changed_text_in_place() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    nodes[2].text = "Display Problems".to_string();
    let report = run(&mut form, &mut nodes, &edges);

    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 2);
    assert!(report.created.is_empty());
    assert_eq!(form.titles()[2], "Display Problems");
}

#[test]
fn test_reorders_live_items_to_table_order() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    nodes.rotate_left(1);
    let report = run(&mut form, &mut nodes, &edges);

    assert!(report.moves >= 1);
    assert_eq!(form.titles(), vec!["Does it turn on?", "Screen Problems", "Start"]);
}

#[test]
fn test_new_node_is_moved_into_place() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    nodes.insert(1, section("INTRO", "Intro"));
    let report = run(&mut form, &mut nodes, &edges);

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.moves, 1);
    assert_eq!(
        form.titles(),
        vec!["Start", "Intro", "Does it turn on?", "Screen Problems"]
    );
}

#[test]
fn test_unknown_live_items_are_left_alone() {
    let mut form = RecordingForm::new();
    form.inner.push_item(ItemKind::Text, "Your name", "");
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    assert_eq!(form.titles()[0], "Your name");
    assert_eq!(form.titles().len(), 4);
}

// ============================================================================
// Degraded input
// ============================================================================

#[test]
fn test_unresolvable_destinations_continue() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![
        question("Q1", "Pick one"),
        question("Q2", "Another question"),
    ];
    let edges = vec![
        Edge::new("Q1", "Missing", Destination::Node("NOPE".to_string())),
        Edge::new("Q1", "Question target", Destination::Node("Q2".to_string())),
        Edge::new("Q1", "Unknown", Destination::Unknown),
        Edge::new("Q1", "Next", Destination::Fallthrough),
    ];
    let report = run(&mut form, &mut nodes, &edges);

    let q1 = form.item(nodes[0].external_id.as_ref().unwrap());
    assert!(q1.choices.iter().all(|c| c.navigation == Navigation::Continue));
    assert_eq!(q1.choices.len(), 4);

    let unresolved = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedDestination)
        .count();
    assert_eq!(unresolved, 3);
}

#[test]
fn test_question_without_edges_gets_empty_choices() {
    let mut form = RecordingForm::new();
    let (mut nodes, edges) = troubleshooting_graph();
    run(&mut form, &mut nodes, &edges);

    let report = run(&mut form, &mut nodes, &[]);
    assert_eq!(report.choice_lists, 1);
    assert!(form.item(nodes[1].external_id.as_ref().unwrap()).choices.is_empty());
}

#[test]
fn test_orphan_edges_are_reported() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![section("S1", "Start")];
    let edges = vec![
        Edge::new("S1", "Yes", Destination::End),
        Edge::new("GHOST", "No", Destination::End),
    ];
    let report = run(&mut form, &mut nodes, &edges);

    assert_eq!(report.choice_lists, 0);
    let orphans = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::OrphanEdge)
        .count();
    assert_eq!(orphans, 2);
}

#[test]
fn test_stale_external_id_is_recreated() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![section("S1", "Start").with_external_id(ItemHandle::new("404"))];
    let report = run(&mut form, &mut nodes, &[]);

    assert_eq!(report.created.len(), 1);
    assert_ne!(nodes[0].external_id, Some(ItemHandle::new("404")));
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::StaleExternalId);
}

#[test]
fn test_unsupported_type_is_skipped() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![
        Node::new("GRID", NodeType::Unsupported("Grid".to_string()), "Rate us"),
        section("S1", "Start"),
    ];
    let report = run(&mut form, &mut nodes, &[]);

    assert_eq!(form.titles(), vec!["Start"]);
    assert!(nodes[0].external_id.is_none());
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnsupportedNodeType);
}

#[test]
fn test_duplicate_node_id_keeps_first_mapping() {
    let mut form = RecordingForm::new();
    let mut nodes = vec![
        section("TARGET", "First"),
        section("TARGET", "Second"),
        question("Q", "Where to?"),
    ];
    let edges = vec![Edge::new("Q", "Go", Destination::Node("TARGET".to_string()))];
    let report = run(&mut form, &mut nodes, &edges);

    let first = nodes[0].external_id.clone().unwrap();
    let q = form.item(nodes[2].external_id.as_ref().unwrap());
    assert_eq!(q.choices[0].navigation, Navigation::GoTo(first));
    assert!(
        report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateNodeId)
    );
}

#[test]
fn test_question_row_over_page_break_is_skipped() {
    let mut form = RecordingForm::new();
    let q = form.inner.push_item(ItemKind::MultipleChoice, "Q", "");
    let p = form.inner.push_item(ItemKind::PageBreak, "P", "");
    let mut nodes = vec![
        question("Q", "Q").with_external_id(q.clone()),
        question("P", "P").with_external_id(p.clone()),
    ];
    let edges = vec![
        Edge::new("Q", "Yes", Destination::End),
        Edge::new("P", "No", Destination::End),
    ];

    let report = run(&mut form, &mut nodes, &edges);

    assert_eq!(report.choice_lists, 1);
    assert_eq!(form.count(&format!("set_choices {}", p)), 0);
    assert_eq!(form.item(&q).choices, vec![Choice::new("Yes", Navigation::Submit)]);
    let mismatches: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ItemKindMismatch)
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].subject, "P");
}

#[test]
fn test_section_row_over_question_is_not_a_goto_target() {
    let mut form = RecordingForm::new();
    let target = form.inner.push_item(ItemKind::MultipleChoice, "Screen", "");
    let mut nodes = vec![
        question("POWER_Q", "Does it turn on?"),
        section("SCREEN", "Screen Problems").with_external_id(target.clone()),
    ];
    let edges = vec![Edge::new(
        "POWER_Q",
        "Yes",
        Destination::Node("SCREEN".to_string()),
    )];

    let report = run(&mut form, &mut nodes, &edges);

    let power = form.item(nodes[0].external_id.as_ref().unwrap());
    assert_eq!(power.choices, vec![Choice::new("Yes", Navigation::Continue)]);
    assert_eq!(form.count(&format!("set_title {}", target)), 0);
    let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::ItemKindMismatch));
    assert!(kinds.contains(&DiagnosticKind::UnresolvedDestination));
}

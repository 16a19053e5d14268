use formgraph_core::data::Workbook;
use formgraph_core::sheets::{self, EDGES_SHEET, FORM_URL_KEY, NODES_SHEET};
use formgraph_core::sync::{SyncProgressCallback, check_tables, open_form, read_form, update_form};
use formgraph_core::{DiagnosticKind, SyncError};
use formgraph_forms::{Choice, FileForm, FormService, ItemKind, Navigation};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn row(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn workbook(temp_dir: &TempDir) -> Workbook {
    let wb = Workbook::open(&temp_dir.path().join("workbook.db")).unwrap();
    sheets::setup_all(&wb).unwrap();
    wb
}

fn write_troubleshooting_tables(wb: &Workbook) {
    for cells in [
        ["", "Section", "Start", "Begin here", ""],
        ["POWER", "Question", "Does it turn on?", "", ""],
        ["SCREEN", "Section", "Screen Problems", "", ""],
    ] {
        wb.append_row(NODES_SHEET, &row(&cells)).unwrap();
    }
    wb.append_row(EDGES_SHEET, &row(&["POWER", "Yes", "SCREEN"])).unwrap();
    wb.append_row(EDGES_SHEET, &row(&["POWER", "No", "END"])).unwrap();
}

#[test]
fn test_open_form_creates_and_remembers_form() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    let forms_dir = temp_dir.path().join("forms");

    let form = open_form(&wb, &forms_dir).unwrap();
    assert_eq!(form.title(), "Troubleshooting Form");
    assert!(form.path().starts_with(&forms_dir));

    let url = sheets::get_setting(&wb, FORM_URL_KEY).unwrap().unwrap();
    assert!(url.starts_with("file://"));

    let reopened = open_form(&wb, &forms_dir).unwrap();
    assert_eq!(reopened.path(), form.path());
}

#[test]
fn test_open_form_rejects_unsupported_location() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    sheets::set_setting(&wb, FORM_URL_KEY, "https://docs.example.com/forms/1").unwrap();

    let err = open_form(&wb, temp_dir.path()).err().unwrap();
    assert!(matches!(err, SyncError::InvalidSetting { .. }));
    assert!(err.is_configuration());
}

#[test]
fn test_update_builds_form_and_writes_back_identity() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    write_troubleshooting_tables(&wb);
    let mut form = open_form(&wb, &temp_dir.path().join("forms")).unwrap();

    let report = update_form(&wb, &mut form, None).unwrap();
    assert_eq!(report.created.len(), 3);
    assert_eq!(report.assigned_ids, vec!["STRT".to_string()]);

    let table = sheets::read_node_table(&wb).unwrap();
    assert_eq!(table.nodes[0].node_id, "STRT");
    assert!(table.nodes.iter().all(|n| n.external_id.is_some()));

    // The form on disk has the same content as the one in memory
    let on_disk = FileForm::open(form.path()).unwrap();
    let items = on_disk.list_items().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].kind, ItemKind::MultipleChoice);
    assert_eq!(items[1].choices[1].navigation, Navigation::Submit);

    let again = update_form(&wb, &mut form, None).unwrap();
    assert!(again.is_noop());
}

#[test]
fn test_update_with_empty_tables_does_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    let mut form = open_form(&wb, temp_dir.path()).unwrap();

    let report = update_form(&wb, &mut form, None).unwrap();
    assert!(report.is_noop());
    assert!(form.list_items().unwrap().is_empty());
}

#[test]
fn test_update_fails_before_mutation_on_bad_headers() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    write_troubleshooting_tables(&wb);
    wb.set_row(EDGES_SHEET, 0, &row(&["Source ID", "Choice", "Destination ID"]))
        .unwrap();
    let mut form = open_form(&wb, temp_dir.path()).unwrap();

    let err = update_form(&wb, &mut form, None).unwrap_err();
    assert!(err.is_configuration());
    assert!(form.list_items().unwrap().is_empty());
}

#[test]
fn test_read_replaces_tables_with_form_contents() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    write_troubleshooting_tables(&wb);
    let mut form = open_form(&wb, temp_dir.path()).unwrap();
    update_form(&wb, &mut form, None).unwrap();

    // Stale rows that the read must discard
    wb.append_row(NODES_SHEET, &row(&["OLD", "Section", "Old", "", "999"])).unwrap();

    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = messages.clone();
    let progress: SyncProgressCallback = Arc::new(move |msg: String| sink.lock().unwrap().push(msg));

    let extraction = read_form(&wb, &form, Some(progress)).unwrap();
    assert_eq!(extraction.nodes.len(), 3);
    assert!(!messages.lock().unwrap().is_empty());

    let table = sheets::read_node_table(&wb).unwrap();
    let ids: Vec<&str> = table.nodes.iter().map(|n| n.node_id.as_str()).collect();
    assert_eq!(ids, vec!["STRT", "IT_TRN", "SCRN_PRBLMS"]);

    let edges = sheets::read_edge_table(&wb).unwrap();
    let cells: Vec<&str> = edges.edges.iter().map(|e| e.destination.as_cell()).collect();
    assert_eq!(cells, vec!["SCRN_PRBLMS", "END"]);

    // Reading back what was just read is a round trip
    let report = update_form(&wb, &mut form, None).unwrap();
    assert!(report.is_noop());
}

#[test]
fn test_read_then_update_keeps_padded_text() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    let mut form = open_form(&wb, temp_dir.path()).unwrap();
    form.create_page_break("Printer ", "Line one\n").unwrap();
    let q = form.create_multiple_choice(" Is it jammed?", "").unwrap();
    form.set_choices(&q, vec![Choice::new("Yes ", Navigation::Submit)])
        .unwrap();
    let before = form.list_items().unwrap();

    read_form(&wb, &form, None).unwrap();
    let table = sheets::read_node_table(&wb).unwrap();
    assert_eq!(table.nodes[0].text, "Printer ");
    assert_eq!(table.nodes[0].description, "Line one\n");
    let edges = sheets::read_edge_table(&wb).unwrap();
    assert_eq!(edges.edges[0].choice_text, "Yes ");

    let report = update_form(&wb, &mut form, None).unwrap();
    assert_eq!(report.updated, 0);
    assert!(report.is_noop());
    assert_eq!(form.list_items().unwrap(), before);
}

#[test]
fn test_check_tables_reports_unresolvable_navigation() {
    let temp_dir = TempDir::new().unwrap();
    let wb = workbook(&temp_dir);
    write_troubleshooting_tables(&wb);
    wb.append_row(EDGES_SHEET, &row(&["POWER", "Maybe", "NOWHERE"])).unwrap();
    wb.append_row(EDGES_SHEET, &row(&["SCREEN", "Huh", "END"])).unwrap();

    let diagnostics = check_tables(&wb).unwrap();
    let kinds: Vec<DiagnosticKind> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::UnresolvedDestination, DiagnosticKind::OrphanEdge]
    );
}

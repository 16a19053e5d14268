use crate::data::Workbook;
use crate::error::{Diagnostic, Result, SyncError};
use crate::extract::{Extraction, extract};
use crate::materialize::{MaterializeReport, materialize};
use crate::model::check_graph;
use crate::sheets::{self, EDGES_SHEET, FORM_URL_KEY, NODES_SHEET};
use formgraph_forms::{FileForm, FormError, FormService};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Title given to a form created because none is configured
pub const DEFAULT_FORM_TITLE: &str = "Troubleshooting Form";

/// Callback for reporting sync progress
pub type SyncProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

fn report(progress: &Option<SyncProgressCallback>, message: impl Into<String>) {
    if let Some(cb) = progress {
        cb(message.into());
    }
}

/// Open the form named by the `Form URL` setting.
///
/// When the setting is blank a new form document is created in `forms_dir`
/// and its URL is stored, so later runs open the same form.
pub fn open_form(wb: &Workbook, forms_dir: &Path) -> Result<FileForm> {
    if let Some(location) = sheets::get_setting(wb, FORM_URL_KEY)? {
        return FileForm::open_location(&location).map_err(|e| match e {
            FormError::InvalidLocation(reason) => SyncError::InvalidSetting {
                key: FORM_URL_KEY.to_string(),
                reason,
            },
            other => SyncError::Form(other),
        });
    }

    let path = forms_dir.join(format!("form-{}.json", uuid::Uuid::new_v4()));
    let form = FileForm::create(&path, DEFAULT_FORM_TITLE)?;
    let location = form.location()?;
    sheets::set_setting(wb, FORM_URL_KEY, location.as_str())?;
    info!("Created new form at {}", path.display());
    Ok(form)
}

/// Read the live form into the Nodes and Edges sheets, replacing their contents.
pub fn read_form<F>(
    wb: &Workbook,
    form: &F,
    progress: Option<SyncProgressCallback>,
) -> Result<Extraction>
where
    F: FormService + ?Sized,
{
    report(&progress, "Reading form items...");
    let items = form.list_items()?;
    let extraction = extract(&items);

    report(&progress, "Writing tables...");
    wb.clear_sheet(NODES_SHEET)?;
    wb.clear_sheet(EDGES_SHEET)?;
    sheets::setup_nodes_sheet(wb)?;
    sheets::setup_edges_sheet(wb)?;
    sheets::write_node_table(wb, &extraction.nodes)?;
    sheets::write_edge_table(wb, &extraction.edges)?;

    info!(
        "Read {} nodes and {} edges into the workbook",
        extraction.nodes.len(),
        extraction.edges.len()
    );
    Ok(extraction)
}

/// Apply the Nodes and Edges sheets to the live form.
pub fn update_form<F>(
    wb: &Workbook,
    form: &mut F,
    progress: Option<SyncProgressCallback>,
) -> Result<MaterializeReport>
where
    F: FormService + ?Sized,
{
    report(&progress, "Reading tables...");
    let table = sheets::read_node_table(wb)?;
    let edges = sheets::read_edge_table(wb)?;
    if table.nodes.is_empty() {
        info!("No nodes found in {}, nothing to update", NODES_SHEET);
        return Ok(MaterializeReport::default());
    }

    report(&progress, format!("Updating form from {} nodes...", table.nodes.len()));
    let live = form.list_items()?;
    let mut nodes = table.nodes.clone();
    let result = materialize(form, &mut nodes, &edges.edges, &live);

    // Handles of items created before a failure still belong in the table
    report(&progress, "Saving node identity...");
    sheets::persist_node_identity(wb, &table, &nodes)?;
    result
}

/// Check the tables for navigation that cannot be resolved.
pub fn check_tables(wb: &Workbook) -> Result<Vec<Diagnostic>> {
    let table = sheets::read_node_table(wb)?;
    let edges = sheets::read_edge_table(wb)?;
    Ok(check_graph(&table.nodes, &edges.edges))
}

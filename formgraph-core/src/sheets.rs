// Sheet layout, table codecs and setup for the workbook

use crate::data::Workbook;
use crate::error::{Result, SyncError};
use crate::model::{Destination, Edge, Node, NodeType};
use formgraph_forms::ItemHandle;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub const SETTINGS_SHEET: &str = "Settings";
pub const NODES_SHEET: &str = "Nodes";
pub const EDGES_SHEET: &str = "Edges";

pub const FORM_URL_KEY: &str = "Form URL";
pub const CHAT_WEBHOOK_KEY: &str = "Chat Webhook URL";
pub const TICKET_SHEET_KEY: &str = "Ticket Sheet";
pub const DEFAULT_TICKET_SHEET: &str = "Tickets";

pub const RECORD_ID_FIELD: &str = "Record ID";
pub const NUMBER_FIELD: &str = "Number";

/// A column identified by its header text, with a stable key used in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub key: &'static str,
}

pub const NODE_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "Node ID", key: "node_id" },
    FieldSpec { name: "Type", key: "type" },
    FieldSpec { name: "Text", key: "text" },
    FieldSpec { name: "Description", key: "description" },
    FieldSpec { name: "Google ID", key: "google_id" },
];

pub const EDGE_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "Source ID", key: "source_id" },
    FieldSpec { name: "Choice Text", key: "choice_text" },
    FieldSpec { name: "Destination ID", key: "destination_id" },
];

pub const SETTINGS_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "Setting", key: "setting" },
    FieldSpec { name: "Value", key: "value" },
];

/// Field key -> zero-based column index.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<&'static str, usize>,
    width: usize,
}

impl ColumnMap {
    /// Column for a key from the field list the map was built with.
    pub fn col(&self, key: &str) -> usize {
        self.columns[key]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Identifier-like cell, trimmed.
    fn cell<'a>(&self, row: &'a [String], key: &str) -> &'a str {
        self.text_cell(row, key).trim()
    }

    /// Free-text cell, exactly as stored.
    fn text_cell<'a>(&self, row: &'a [String], key: &str) -> &'a str {
        row.get(self.col(key)).map(String::as_str).unwrap_or("")
    }
}

/// Map every field to its column by exact header text.
pub fn column_map(wb: &Workbook, sheet: &str, fields: &[FieldSpec]) -> Result<ColumnMap> {
    if !wb.has_sheet(sheet)? {
        return Err(SyncError::MissingSheet(sheet.to_string()));
    }
    let header = wb.get_row(sheet, 0)?;
    columns_from_header(sheet, &header, fields)
}

fn columns_from_header(sheet: &str, header: &[String], fields: &[FieldSpec]) -> Result<ColumnMap> {
    let mut columns = HashMap::new();
    for field in fields {
        let index = header
            .iter()
            .position(|h| h == field.name)
            .ok_or_else(|| SyncError::MissingHeader {
                sheet: sheet.to_string(),
                field: field.name.to_string(),
            })?;
        columns.insert(field.key, index);
    }
    Ok(ColumnMap {
        columns,
        width: header.len(),
    })
}

// ============================================================================
// Node and edge tables
// ============================================================================

/// Nodes in row order, with the sheet row each one came from.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    pub nodes: Vec<Node>,
    pub rows: Vec<usize>,
    pub columns: ColumnMap,
}

#[derive(Debug, Clone, Default)]
pub struct EdgeTable {
    pub edges: Vec<Edge>,
    pub rows: Vec<usize>,
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

pub fn read_node_table(wb: &Workbook) -> Result<NodeTable> {
    let columns = column_map(wb, NODES_SHEET, NODE_FIELDS)?;
    let values = wb.get_values(NODES_SHEET)?;

    let mut table = NodeTable {
        columns,
        ..Default::default()
    };
    for (index, row) in values.iter().enumerate().skip(1) {
        if is_blank(row) {
            continue;
        }
        let c = &table.columns;
        let google_id = c.cell(row, "google_id");
        table.nodes.push(Node {
            node_id: c.cell(row, "node_id").to_string(),
            node_type: NodeType::from_label(c.cell(row, "type")),
            text: c.text_cell(row, "text").to_string(),
            description: c.text_cell(row, "description").to_string(),
            external_id: (!google_id.is_empty()).then(|| ItemHandle::new(google_id)),
        });
        table.rows.push(index);
    }
    debug!("Read {} node rows", table.nodes.len());
    Ok(table)
}

pub fn read_edge_table(wb: &Workbook) -> Result<EdgeTable> {
    let columns = column_map(wb, EDGES_SHEET, EDGE_FIELDS)?;
    let values = wb.get_values(EDGES_SHEET)?;

    let mut table = EdgeTable::default();
    for (index, row) in values.iter().enumerate().skip(1) {
        if is_blank(row) {
            continue;
        }
        table.edges.push(Edge {
            source_id: columns.cell(row, "source_id").to_string(),
            choice_text: columns.text_cell(row, "choice_text").to_string(),
            destination: Destination::from_cell(columns.cell(row, "destination_id")),
        });
        table.rows.push(index);
    }
    debug!("Read {} edge rows", table.edges.len());
    Ok(table)
}

/// Write nodes below the header, one row each, in order.
pub fn write_node_table(wb: &Workbook, nodes: &[Node]) -> Result<()> {
    let columns = column_map(wb, NODES_SHEET, NODE_FIELDS)?;
    for (i, node) in nodes.iter().enumerate() {
        let mut row = vec![String::new(); columns.width()];
        row[columns.col("node_id")] = node.node_id.clone();
        row[columns.col("type")] = node.node_type.as_str().to_string();
        row[columns.col("text")] = node.text.clone();
        row[columns.col("description")] = node.description.clone();
        row[columns.col("google_id")] = node
            .external_id
            .as_ref()
            .map(|h| h.as_str().to_string())
            .unwrap_or_default();
        wb.set_row(NODES_SHEET, i + 1, &row)?;
    }
    Ok(())
}

pub fn write_edge_table(wb: &Workbook, edges: &[Edge]) -> Result<()> {
    let columns = column_map(wb, EDGES_SHEET, EDGE_FIELDS)?;
    for (i, edge) in edges.iter().enumerate() {
        let mut row = vec![String::new(); columns.width()];
        row[columns.col("source_id")] = edge.source_id.clone();
        row[columns.col("choice_text")] = edge.choice_text.clone();
        row[columns.col("destination_id")] = edge.destination.as_cell().to_string();
        wb.set_row(EDGES_SHEET, i + 1, &row)?;
    }
    Ok(())
}

/// Write back Node ID and Google ID cells that differ from the table as read.
/// `nodes` must line up with `table.rows`. Returns the number of cells written.
pub fn persist_node_identity(wb: &Workbook, table: &NodeTable, nodes: &[Node]) -> Result<usize> {
    let values = wb.get_values(NODES_SHEET)?;
    let node_col = table.columns.col("node_id");
    let google_col = table.columns.col("google_id");
    let mut written = 0;

    for (&row_index, node) in table.rows.iter().zip(nodes) {
        let row = values.get(row_index).map(Vec::as_slice).unwrap_or(&[]);
        let current = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        if current(node_col) != node.node_id {
            wb.set_cell(NODES_SHEET, row_index, node_col, &node.node_id)?;
            written += 1;
        }
        let handle = node.external_id.as_ref().map(|h| h.as_str()).unwrap_or("");
        if current(google_col) != handle {
            wb.set_cell(NODES_SHEET, row_index, google_col, handle)?;
            written += 1;
        }
    }
    if written > 0 {
        info!("Wrote back {} identity cells to {}", written, NODES_SHEET);
    }
    Ok(written)
}

// ============================================================================
// Settings
// ============================================================================

/// All settings as key -> value. Later rows win on duplicate keys.
pub fn read_settings(wb: &Workbook) -> Result<HashMap<String, String>> {
    let columns = column_map(wb, SETTINGS_SHEET, SETTINGS_FIELDS)?;
    let values = wb.get_values(SETTINGS_SHEET)?;
    let settings = values
        .iter()
        .skip(1)
        .filter(|row| !columns.cell(row, "setting").is_empty())
        .map(|row| {
            (
                columns.cell(row, "setting").to_string(),
                columns.cell(row, "value").to_string(),
            )
        })
        .collect();
    Ok(settings)
}

/// A single setting, `None` when absent or blank.
pub fn get_setting(wb: &Workbook, key: &str) -> Result<Option<String>> {
    Ok(read_settings(wb)?.remove(key).filter(|v| !v.is_empty()))
}

/// Update the first row for `key`, or append one.
pub fn set_setting(wb: &Workbook, key: &str, value: &str) -> Result<()> {
    let columns = column_map(wb, SETTINGS_SHEET, SETTINGS_FIELDS)?;
    let values = wb.get_values(SETTINGS_SHEET)?;

    let existing = values
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| columns.cell(row, "setting") == key)
        .map(|(i, _)| i);

    match existing {
        Some(row_index) => {
            wb.set_cell(SETTINGS_SHEET, row_index, columns.col("value"), value)?;
        }
        None => {
            let mut row = vec![String::new(); columns.width()];
            row[columns.col("setting")] = key.to_string();
            row[columns.col("value")] = value.to_string();
            wb.append_row(SETTINGS_SHEET, &row)?;
        }
    }
    debug!("Setting {} = {}", key, value);
    Ok(())
}

// ============================================================================
// Setup
// ============================================================================

/// Create the sheet if needed and rewrite its header when the leading cells
/// differ from the expected field names. Extra columns are left alone.
fn ensure_headers(wb: &Workbook, sheet: &str, position: usize, fields: &[FieldSpec]) -> Result<()> {
    wb.insert_sheet(sheet, position)?;

    let mut header = wb.get_row(sheet, 0)?;
    let expected: Vec<&str> = fields.iter().map(|f| f.name).collect();
    let matches = header.len() >= expected.len()
        && header.iter().zip(&expected).all(|(have, want)| have == want);
    if matches {
        return Ok(());
    }

    if header.len() < expected.len() {
        header.resize(expected.len(), String::new());
    }
    for (cell, name) in header.iter_mut().zip(&expected) {
        *cell = name.to_string();
    }
    wb.set_row(sheet, 0, &header)?;
    info!("Wrote header row for {}", sheet);
    Ok(())
}

pub fn setup_settings_sheet(wb: &Workbook) -> Result<()> {
    ensure_headers(wb, SETTINGS_SHEET, 0, SETTINGS_FIELDS)?;
    if !read_settings(wb)?.contains_key(FORM_URL_KEY) {
        set_setting(wb, FORM_URL_KEY, "")?;
    }
    Ok(())
}

pub fn setup_nodes_sheet(wb: &Workbook) -> Result<()> {
    ensure_headers(wb, NODES_SHEET, usize::MAX, NODE_FIELDS)
}

pub fn setup_edges_sheet(wb: &Workbook) -> Result<()> {
    ensure_headers(wb, EDGES_SHEET, usize::MAX, EDGE_FIELDS)
}

pub fn setup_all(wb: &Workbook) -> Result<()> {
    setup_settings_sheet(wb)?;
    setup_nodes_sheet(wb)?;
    setup_edges_sheet(wb)?;
    Ok(())
}

/// Delete the Settings, Nodes and Edges sheets and set them up again.
pub fn reset_all(wb: &Workbook) -> Result<()> {
    for sheet in [SETTINGS_SHEET, NODES_SHEET, EDGES_SHEET] {
        wb.delete_sheet(sheet)?;
    }
    setup_all(wb)
}

// ============================================================================
// Records
// ============================================================================

/// One data row of a header-keyed sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn number(&self) -> Option<u64> {
        self.get(NUMBER_FIELD).and_then(|n| n.parse().ok())
    }
}

fn record_from_row(header: &[String], row: &[String]) -> Record {
    let fields: BTreeMap<String, String> = header
        .iter()
        .zip(row)
        .filter(|(h, _)| !h.is_empty())
        .map(|(h, v)| (h.clone(), v.clone()))
        .collect();
    Record {
        id: fields.get(RECORD_ID_FIELD).cloned().unwrap_or_default(),
        fields,
    }
}

/// Every non-blank data row of `sheet` as a header-keyed record.
pub fn read_records(wb: &Workbook, sheet: &str) -> Result<Vec<Record>> {
    if !wb.has_sheet(sheet)? {
        return Err(SyncError::MissingSheet(sheet.to_string()));
    }
    let values = wb.get_values(sheet)?;
    let Some((header, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };
    Ok(rows
        .iter()
        .filter(|row| !is_blank(row))
        .map(|row| record_from_row(header, row))
        .collect())
}

/// Update the row whose `match_field` equals `match_value`, or append one.
///
/// The sheet and any missing header columns are created on demand. New rows
/// get a fresh `Record ID` and the next `Number`. Returns the stored record
/// and whether it was created.
pub fn upsert_record(
    wb: &Workbook,
    sheet: &str,
    match_field: &str,
    match_value: &str,
    fields: &BTreeMap<String, String>,
) -> Result<(Record, bool)> {
    wb.insert_sheet(sheet, usize::MAX)?;

    let mut values = wb.get_values(sheet)?;
    if values.is_empty() {
        values.push(Vec::new());
    }
    let mut header = values[0].clone();
    let wanted = [RECORD_ID_FIELD, NUMBER_FIELD, match_field]
        .into_iter()
        .chain(fields.keys().map(String::as_str));
    let mut header_changed = false;
    for name in wanted {
        if !header.iter().any(|h| h == name) {
            header.push(name.to_string());
            header_changed = true;
        }
    }
    if header_changed {
        wb.set_row(sheet, 0, &header)?;
    }
    let col = |name: &str| header.iter().position(|h| h == name).unwrap_or(0);

    let existing = if match_value.is_empty() {
        None
    } else {
        values
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.get(col(match_field)).map(|v| v.as_str()) == Some(match_value))
            .map(|(i, _)| i)
    };

    let (row_index, mut row, created) = match existing {
        Some(i) => (i, values[i].clone(), false),
        None => {
            let next_number = values
                .iter()
                .skip(1)
                .filter_map(|row| row.get(col(NUMBER_FIELD)))
                .filter_map(|n| n.trim().parse::<u64>().ok())
                .max()
                .unwrap_or(0)
                + 1;
            let mut row = vec![String::new(); header.len()];
            row[col(RECORD_ID_FIELD)] = uuid::Uuid::new_v4().to_string();
            row[col(NUMBER_FIELD)] = next_number.to_string();
            row[col(match_field)] = match_value.to_string();
            (values.len(), row, true)
        }
    };

    row.resize(header.len(), String::new());
    for (name, value) in fields {
        row[col(name)] = value.clone();
    }
    wb.set_row(sheet, row_index, &row)?;

    debug!(
        "{} record in {} where {} = {}",
        if created { "Created" } else { "Updated" },
        sheet,
        match_field,
        match_value
    );
    Ok((record_from_row(&header, &row), created))
}

// Report rendering for read, update and check results

use crate::error::Diagnostic;
use crate::extract::Extraction;
use crate::materialize::MaterializeReport;
use serde::{Deserialize, Serialize};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

fn push_diagnostics(report: &mut String, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    section(report, &format!("DIAGNOSTICS ({})", diagnostics.len()));
    for diagnostic in diagnostics {
        report.push_str(&format!("  {}\n", diagnostic));
    }
    report.push('\n');
}

pub fn generate_read_text(extraction: &Extraction) -> String {
    let mut report = String::new();
    section(&mut report, "FORM READ");

    report.push_str(&format!("Nodes:          {}\n", extraction.nodes.len()));
    report.push_str(&format!("Edges:          {}\n", extraction.edges.len()));
    report.push_str(&format!("Skipped items:  {}\n\n", extraction.skipped_items));

    if !extraction.nodes.is_empty() {
        section(&mut report, "NODES");
        for node in &extraction.nodes {
            report.push_str(&format!(
                "  {:<20}  {:<8}  {}\n",
                node.node_id,
                node.node_type.as_str(),
                node.text
            ));
        }
        report.push('\n');
    }

    push_diagnostics(&mut report, &extraction.diagnostics);
    report
}

pub fn generate_update_text(materialized: &MaterializeReport) -> String {
    let mut report = String::new();
    section(&mut report, "FORM UPDATE");

    if materialized.is_noop() {
        report.push_str("Form already matches the tables.\n\n");
    }
    report.push_str(&format!("Created:        {}\n", materialized.created.len()));
    report.push_str(&format!("Updated:        {}\n", materialized.updated));
    report.push_str(&format!("Unchanged:      {}\n", materialized.unchanged));
    report.push_str(&format!("Moves:          {}\n", materialized.moves));
    report.push_str(&format!("Choice lists:   {}\n\n", materialized.choice_lists));

    if !materialized.assigned_ids.is_empty() {
        report.push_str("Assigned ids:\n");
        for id in &materialized.assigned_ids {
            report.push_str(&format!("  {}\n", id));
        }
        report.push('\n');
    }

    if !materialized.created.is_empty() {
        report.push_str("Created items:\n");
        for (node_id, handle) in &materialized.created {
            report.push_str(&format!("  {:<20}  {}\n", node_id, handle));
        }
        report.push('\n');
    }

    push_diagnostics(&mut report, &materialized.diagnostics);
    report
}

pub fn generate_check_text(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "All navigation resolves.\n".to_string();
    }
    let mut report = String::new();
    push_diagnostics(&mut report, diagnostics);
    report
}

/// Wrap any serializable result with generator metadata.
pub fn generate_json<T: Serialize>(kind: &str, body: &T) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "formgraph",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "kind": kind,
            },
            "result": body,
        }
    });
    serde_json::to_string_pretty(&json_report)
}

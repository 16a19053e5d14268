pub mod data;
pub mod error;
pub mod extract;
pub mod ident;
pub mod materialize;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod sheets;
pub mod sync;

pub use data::Workbook;
pub use error::{Diagnostic, DiagnosticKind, SyncError};
pub use extract::Extraction;
pub use materialize::MaterializeReport;
pub use model::{Destination, Edge, Node, NodeType};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
    ╔══════════════════════════════════════╗
    ║              FORMGRAPH               ║
    ║   branching forms <-> graph tables   ║
    ╚══════════════════════════════════════╝"#;
    println!("{}", banner.bright_cyan());
    println!(
        "    {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}

pub mod handlers;

pub use handlers::{
    WorkbookPaths, describe_outcome, open_workbook, parse_format, resolve_paths, ticket_table,
    webhook_url,
};

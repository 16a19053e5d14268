use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use formgraph_core::data::Workbook;
use formgraph_core::report::{
    ReportFormat, generate_check_text, generate_json, generate_read_text, generate_update_text,
};
use formgraph_core::sheets::{self, CHAT_WEBHOOK_KEY, DEFAULT_TICKET_SHEET, TICKET_SHEET_KEY};
use formgraph_core::sync::{
    SyncProgressCallback, check_tables, open_form, read_form, update_form,
};
use formgraph_intake::{
    FormSubmission, IntakeOptions, IntakeOutcome, IntakePipeline, LogNotifier, Notifier,
    SheetDirectory, SheetTicketStore, WebhookNotifier,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Where the workbook and the form documents it points at live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookPaths {
    pub workbook: PathBuf,
    pub forms_dir: PathBuf,
}

/// Expand `~` and place the forms directory next to the workbook.
pub fn resolve_paths(workbook: &str) -> WorkbookPaths {
    let expanded = shellexpand::tilde(workbook);
    let workbook = PathBuf::from(expanded.as_ref());
    let forms_dir = workbook
        .parent()
        .map(|p| p.join("forms"))
        .unwrap_or_else(|| PathBuf::from("forms"));
    WorkbookPaths {
        workbook,
        forms_dir,
    }
}

pub fn parse_format(format: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(format).ok_or_else(|| anyhow!("Unknown report format: {}", format))
}

/// Open the workbook, creating its directory on first use.
pub fn open_workbook(path: &Path) -> Result<Workbook> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Workbook::open(path).with_context(|| format!("Failed to open workbook {}", path.display()))
}

/// Webhook from the command line, else from the Settings sheet.
pub fn webhook_url(arg: Option<&Url>, wb: &Workbook) -> Result<Option<Url>> {
    if let Some(url) = arg {
        return Ok(Some(url.clone()));
    }
    match sheets::get_setting(wb, CHAT_WEBHOOK_KEY)? {
        Some(value) => {
            let url = Url::parse(&value)
                .with_context(|| format!("Invalid '{}' setting: {}", CHAT_WEBHOOK_KEY, value))?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

pub fn ticket_table(wb: &Workbook) -> Result<String> {
    Ok(sheets::get_setting(wb, TICKET_SHEET_KEY)?
        .unwrap_or_else(|| DEFAULT_TICKET_SHEET.to_string()))
}

pub fn describe_outcome(outcome: &IntakeOutcome) -> String {
    let label = |record: &formgraph_core::sheets::Record| {
        record
            .number()
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| record.id.clone())
    };
    match outcome {
        IntakeOutcome::Skipped { reason } => format!("Skipped: {}", reason),
        IntakeOutcome::Created { record, ticket } => format!(
            "Created ticket {} (priority {})",
            label(record),
            ticket.priority_label()
        ),
        IntakeOutcome::Updated { record, .. } => format!("Updated ticket {}", label(record)),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn confirm(msg: &str) -> Result<bool> {
    let response = print_prompt(msg)?;
    Ok(response == "y" || response == "yes")
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn spinner_callback(spinner: &ProgressBar) -> SyncProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |msg: String| spinner.set_message(msg))
}

pub fn handle_setup(paths: &WorkbookPaths) -> Result<()> {
    print_divider();
    println!("{}", "  FORMGRAPH SETUP".bright_white().bold());
    print_divider();
    println!();

    let wb = open_workbook(&paths.workbook)?;
    sheets::setup_all(&wb)?;

    println!(
        "{} Workbook: {}",
        "✓".green().bold(),
        paths.workbook.display().to_string().bright_white()
    );
    for name in wb.sheet_names()? {
        println!("  {} {}", "•".blue(), name);
    }
    println!();
    println!(
        "{} Fill in the Nodes and Edges sheets, then run {}",
        "→".blue(),
        "formgraph update".bright_white()
    );
    Ok(())
}

pub fn handle_reset(paths: &WorkbookPaths, yes: bool) -> Result<()> {
    let wb = open_workbook(&paths.workbook)?;
    if !yes {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("This clears the Nodes and Edges sheets and forgets the form URL.");
        if !confirm("Do you want to continue? [y/N]:")? {
            println!("{} Reset cancelled.", "✗".red().bold());
            return Ok(());
        }
    }
    sheets::reset_all(&wb)?;
    println!("{} Workbook reset", "✓".green().bold());
    Ok(())
}

pub fn handle_read(paths: &WorkbookPaths, yes: bool, format: ReportFormat) -> Result<()> {
    if !yes {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Reading the form replaces everything in the Nodes and Edges sheets.");
        if !confirm("Do you want to continue? [y/N]:")? {
            println!("{} Read cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    let wb = open_workbook(&paths.workbook)?;
    sheets::setup_all(&wb)?;
    let form = open_form(&wb, &paths.forms_dir)?;

    let spinner = spinner();
    let result = read_form(&wb, &form, Some(spinner_callback(&spinner)));
    spinner.finish_and_clear();
    let extraction = result?;

    match format {
        ReportFormat::Text => print!("{}", generate_read_text(&extraction)),
        ReportFormat::Json => println!("{}", generate_json("read", &extraction)?),
    }
    Ok(())
}

pub fn handle_update(paths: &WorkbookPaths, format: ReportFormat) -> Result<()> {
    let wb = open_workbook(&paths.workbook)?;
    let mut form = open_form(&wb, &paths.forms_dir)?;
    debug!("Updating form at {}", form.path().display());

    let spinner = spinner();
    let result = update_form(&wb, &mut form, Some(spinner_callback(&spinner)));
    spinner.finish_and_clear();
    let report = result?;

    match format {
        ReportFormat::Text => print!("{}", generate_update_text(&report)),
        ReportFormat::Json => println!("{}", generate_json("update", &report)?),
    }
    Ok(())
}

/// Returns the number of problems found.
pub fn handle_check(paths: &WorkbookPaths) -> Result<usize> {
    let wb = open_workbook(&paths.workbook)?;
    let diagnostics = check_tables(&wb)?;
    print!("{}", generate_check_text(&diagnostics));
    Ok(diagnostics.len())
}

pub async fn handle_submit(
    paths: &WorkbookPaths,
    file: &Path,
    webhook: Option<&Url>,
) -> Result<IntakeOutcome> {
    let submission = FormSubmission::load(file)
        .with_context(|| format!("Failed to load submission {}", file.display()))?;
    let wb = open_workbook(&paths.workbook)?;
    sheets::setup_all(&wb)?;

    let notifier: Box<dyn Notifier> = match webhook_url(webhook, &wb)? {
        Some(url) => Box::new(WebhookNotifier::new(url, WEBHOOK_TIMEOUT_SECS)?),
        None => {
            debug!("No chat webhook configured, logging cards instead");
            Box::new(LogNotifier)
        }
    };

    let directory = SheetDirectory::new(&wb);
    let store = SheetTicketStore::new(&wb);
    let mut options = IntakeOptions::new(chrono::Local::now().date_naive());
    options.ticket_table = ticket_table(&wb)?;
    let pipeline = IntakePipeline::new(&directory, &store, notifier.as_ref(), options);

    let outcome = pipeline.process(&submission).await?;
    println!("{} {}", "✓".green().bold(), describe_outcome(&outcome));
    Ok(outcome)
}

use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use formgraph::handlers::{
    handle_check, handle_read, handle_reset, handle_setup, handle_submit, handle_update,
    parse_format, resolve_paths,
};
use formgraph_core::print_banner;
use std::path::PathBuf;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        return;
    }

    if let Err(e) = run(&chosen_command).await {
        eprintln!("{} {}", "✗".red().bold(), format!("{:#}", e).red());
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let workbook = matches
        .get_one::<String>("workbook")
        .map(String::as_str)
        .unwrap_or("~/.config/formgraph/workbook.db");
    let paths = resolve_paths(workbook);

    match matches.subcommand() {
        Some(("setup", _)) => handle_setup(&paths),
        Some(("reset", sub)) => handle_reset(&paths, sub.get_flag("yes")),
        Some(("read", sub)) => {
            let format = parse_format(format_arg(sub))?;
            handle_read(&paths, sub.get_flag("yes"), format)
        }
        Some(("update", sub)) => {
            let format = parse_format(format_arg(sub))?;
            handle_update(&paths, format)
        }
        Some(("check", _)) => {
            let problems = handle_check(&paths)?;
            if problems > 0 {
                std::process::exit(2);
            }
            Ok(())
        }
        Some(("submit", sub)) => {
            let file = sub
                .get_one::<PathBuf>("file")
                .ok_or_else(|| anyhow::anyhow!("--file is required"))?;
            handle_submit(&paths, file, sub.get_one::<Url>("webhook")).await?;
            Ok(())
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn format_arg(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text")
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

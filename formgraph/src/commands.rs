use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("formgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("formgraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-w --"workbook" <PATH>)
                .required(false)
                .global(true)
                .help("Workbook holding the Settings, Nodes and Edges sheets")
                .default_value("~/.config/formgraph/workbook.db"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("setup")
                .about("Creates the Settings, Nodes and Edges sheets with their headers"),
        )
        .subcommand(
            command!("reset")
                .about("Clears the Nodes and Edges sheets and forgets the form URL")
                .arg(
                    arg!(-y --"yes")
                        .required(false)
                        .help("Do not ask for confirmation"),
                ),
        )
        .subcommand(
            command!("read")
                .about("Reads the live form into the Nodes and Edges sheets, replacing them")
                .arg(
                    arg!(-y --"yes")
                        .required(false)
                        .help("Do not ask for confirmation"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("update")
                .about("Builds or updates the live form from the Nodes and Edges sheets")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("check")
                .about("Reports choices whose navigation cannot be resolved"),
        )
        .subcommand(
            command!("submit")
                .about(
                    "Turns a form submission into a helpdesk ticket and announces new tickets \
                in chat",
                )
                .arg(
                    arg!(--"file" <PATH>)
                        .required(true)
                        .help("Path to the submission JSON")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"webhook" <URL>)
                        .required(false)
                        .help("Chat webhook to post to (default: the Chat Webhook URL setting)")
                        .value_parser(clap::value_parser!(Url)),
                ),
        )
}

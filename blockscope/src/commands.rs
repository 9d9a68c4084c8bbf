use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

fn page_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(true)
            .help("The page URL; its server-rendered markup is fetched from here")
            .value_parser(clap::value_parser!(Url)),
    )
    .arg(
        arg!(-l --"live" <PATH>)
            .required(true)
            .help("Path to a snapshot of the live (rendered) DOM")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    )
    .arg(
        arg!(-r --"resources" <PATH>)
            .required(false)
            .help("Path to a newline-delimited file of resource URLs the page loaded")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    )
    .arg(
        arg!(-c --"config" <PATH>)
            .required(false)
            .help("Path to a TOML engine configuration file"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("blockscope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("blockscope")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            page_args(
                command!("analyze")
                    .about("Detect sections, blocks, default content and icons on a page"),
            )
            .arg(
                arg!(-f --"format" <FORMAT>)
                    .required(false)
                    .help("Report format: text, json")
                    .value_parser(["text", "json"])
                    .default_value("text"),
            )
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Save report to file (default: display to screen)")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
        )
        .subcommand(
            page_args(
                command!("detail")
                    .about("Show live and server-rendered markup for one detected item"),
            )
            .arg(
                arg!(-i --"id" <ID>)
                    .required(true)
                    .help("The section or block id, e.g. block-3"),
            ),
        )
        .subcommand(
            page_args(
                command!("overlay").about("Compute overlay markers from a captured page layout"),
            )
            .arg(
                arg!(-g --"layout" <PATH>)
                    .required(true)
                    .help("Path to a JSON layout capture (scroll, extent and element rects)")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
        )
}

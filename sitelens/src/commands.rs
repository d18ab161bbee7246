use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;
use url::Url;

fn data_dir_arg() -> clap::Arg {
    arg!(-d --"data-dir" <PATH>)
        .required(false)
        .help("Config/data directory (database and screenshots)")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitelens")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitelens")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitelens data directory and database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the sitelens database and screenshots")
                        .default_value("~/.config/sitelens/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Discover a site's page structure, capture a representative sample of \
                screenshots and save the result.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The site to analyze")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Page budget for the representative sample (10-50)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"load-timeout" <MS>)
                        .required(false)
                        .help("Per-page load timeout in milliseconds (3000-15000)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"capture-delay" <MS>)
                        .required(false)
                        .help("Settle delay before each capture in milliseconds (500-3000)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(data_dir_arg()),
        )
        .subcommand(
            command!("expand")
                .about("Reveal a batch of children hidden behind a collapsed '+N more' group")
                .arg(
                    arg!(-p --"path" <PATH>)
                        .required(true)
                        .help("Path of the collapsed group, as printed in the report"),
                )
                .arg(data_dir_arg()),
        )
        .subcommand(
            command!("capture")
                .about("Capture a single uncaptured page and attach it to its tree node")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page URL to capture")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-p --"path" <PATH>)
                        .required(true)
                        .help("Tree path of the node the screenshot belongs to"),
                )
                .arg(data_dir_arg()),
        )
        .subcommand(
            command!("report")
                .about("Render the saved analysis as text or JSON")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text or json")
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <FILE>)
                        .required(false)
                        .help("Write the report to a file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(data_dir_arg()),
        )
}

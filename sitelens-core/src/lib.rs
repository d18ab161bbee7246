pub mod capture;
pub mod classify;
pub mod collapse;
pub mod data;
pub mod error;
pub mod expand;
pub mod model;
pub mod report;
pub mod select;
pub mod session;
pub mod tree;

pub use error::CoreError;
pub use model::{AnalyzeOptions, PageNode, ReportDataset, ViewNode};
pub use session::{AnalysisSession, RunOutcome, RunState, SessionEvent};

use colored::Colorize;

pub fn print_banner() {
    println!(
        "{}",
        r#"
      _ _       _
  ___(_) |_ ___| | ___ _ __  ___
 / __| | __/ _ \ |/ _ \ '_ \/ __|
 \__ \ | ||  __/ |  __/ | | \__ \
 |___/_|\__\___|_|\___|_| |_|___/
"#
        .bright_cyan()
    );
    println!(
        "  {} {}\n",
        "site structure, sampled and captured".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitelens_core::collapse::collapse_tree;
use sitelens_core::data::{DEFAULT_DATASET, Database};
use sitelens_core::expand::ExpandOutcome;
use sitelens_core::model::{AnalyzeOptions, DEFAULT_MAX_CHILDREN, ELLIPSIS_SUFFIX};
use sitelens_core::report::{
    ReportFormat, generate_json_report, generate_text_report, save_report,
};
use sitelens_core::session::{AnalysisSession, RunOutcome, SessionEvent};
use sitelens_scanner::renderer::BrowserSession;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use url::Url;

pub const DEFAULT_DATA_DIR: &str = "~/.config/sitelens/";

/// Where a sitelens installation keeps its pieces.
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub screenshots_dir: PathBuf,
}

/// Expand the data directory argument (tilde included) into concrete paths.
pub fn resolve_data_paths(dir: Option<&String>) -> DataPaths {
    let raw = dir.map(String::as_str).unwrap_or(DEFAULT_DATA_DIR);
    let expanded = shellexpand::tilde(raw);
    let data_dir = PathBuf::from(expanded.as_ref());
    DataPaths {
        db_path: data_dir.join("sitelens.db"),
        screenshots_dir: data_dir.join("screenshots"),
        data_dir,
    }
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding https://
    let with_scheme = format!("https://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

/// Assemble capture options from CLI flags, falling back to defaults and
/// clamping to the accepted ranges.
pub fn options_from_args(args: &ArgMatches) -> AnalyzeOptions {
    let defaults = AnalyzeOptions::default();
    AnalyzeOptions {
        max_pages: args
            .get_one::<usize>("max-pages")
            .copied()
            .unwrap_or(defaults.max_pages),
        load_timeout_ms: args
            .get_one::<u64>("load-timeout")
            .copied()
            .unwrap_or(defaults.load_timeout_ms),
        capture_delay_ms: args
            .get_one::<u64>("capture-delay")
            .copied()
            .unwrap_or(defaults.capture_delay_ms),
    }
    .clamped()
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

fn capture_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb
}

/// Session event sink driving the CLI progress spinner.
fn spinner_events(pb: ProgressBar) -> Arc<dyn Fn(SessionEvent) + Send + Sync> {
    Arc::new(move |event| match event {
        SessionEvent::Progress { current, total, url } => {
            pb.set_message(format!("Capturing {}/{}: {}", current, total, url));
            pb.tick();
        }
        SessionEvent::Complete { total_urls, captured } => {
            pb.finish_with_message(format!(
                "Captured {} pages ({} discovered)",
                captured, total_urls
            ));
        }
        SessionEvent::Error { message } => {
            pb.finish_with_message(format!("Failed: {}", message));
        }
    })
}

pub fn handle_init(args: &ArgMatches) {
    print_divider();
    println!("{}", "  SITELENS INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let dir = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let paths = resolve_data_paths(Some(dir));

    println!("{} Parsed arguments", "✓".green().bold());
    println!(
        "{} Target: {}",
        "→".blue(),
        paths.data_dir.display().to_string().bright_white()
    );
    println!();

    // Check for an existing database
    if Database::exists(&paths.db_path) {
        if force {
            println!(
                "{} Deleting existing database (force mode)",
                "→".yellow().bold()
            );
            Database::drop(&paths.db_path);
            println!("{} Existing database removed", "✓".green().bold());
            println!();
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                paths.db_path.display().to_string().bright_white()
            );
            println!();

            let response = print_prompt("Would you like to overwrite it? [y/N]:");
            println!();

            if response != "y" && response != "yes" {
                println!("{} Keeping existing database", "→".blue());
                return;
            }
            Database::drop(&paths.db_path);
            println!("{} Existing database removed", "✓".green().bold());
            println!();
        }
    }

    println!("{} Creating directory structure...", "→".blue());
    std::fs::create_dir_all(&paths.screenshots_dir).expect("Failed to create data directory");
    println!(
        "  {} {}",
        "✓".green(),
        paths.screenshots_dir.display().to_string().bright_white()
    );

    println!("{} Creating database...", "→".blue());
    Database::new(&paths.db_path).expect("Failed to create database");
    println!(
        "  {} {}",
        "✓".green(),
        paths.db_path.display().to_string().bright_white()
    );

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
}

pub async fn handle_analyze(args: &ArgMatches) -> Result<()> {
    let url = args.get_one::<Url>("url").expect("clap requires --url");
    let options = options_from_args(args);
    let paths = resolve_data_paths(args.get_one::<String>("data-dir"));

    std::fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("creating {}", paths.data_dir.display()))?;
    let db = Database::new(&paths.db_path).context("opening database")?;

    println!("\n🔍 Analyzing {}", url);
    println!("Page budget: {}", options.max_pages);
    println!("Load timeout: {} ms", options.load_timeout_ms);
    println!("Capture delay: {} ms\n", options.capture_delay_ms);

    let pb = capture_spinner();
    pb.set_message("Discovering pages...");

    let mut session = AnalysisSession::new().with_event_callback(spinner_events(pb));

    // ctrl-c cancels cooperatively: the in-flight capture finishes, the run
    // stops at the next loop boundary.
    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let mut renderer = BrowserSession::launch(&paths.screenshots_dir)
        .await
        .context("launching headless browser")?;

    let outcome = session.run(url, &mut renderer, &db, options).await;
    renderer.close().await;

    match outcome? {
        RunOutcome::Complete(dataset) => {
            println!();
            print!("{}", generate_text_report(&dataset));
            println!(
                "{} Screenshots: {}",
                "✓".green().bold(),
                paths.screenshots_dir.display().to_string().bright_white()
            );
            Ok(())
        }
        RunOutcome::Cancelled => {
            println!(
                "\n{} Analysis cancelled; nothing was saved.",
                "✗".red().bold()
            );
            Ok(())
        }
    }
}

pub async fn handle_expand(args: &ArgMatches) -> Result<()> {
    let ellipsis_path = args.get_one::<String>("path").expect("clap requires --path");
    let paths = resolve_data_paths(args.get_one::<String>("data-dir"));

    let db = Database::new(&paths.db_path).context("opening database")?;
    let mut dataset = db
        .load_dataset(DEFAULT_DATASET)?
        .context("No analysis found. Run `sitelens analyze` first.")?;

    let mut display = collapse_tree(&dataset.tree, DEFAULT_MAX_CHILDREN);
    if display.find(ellipsis_path).is_none() {
        bail!("No collapsed group at {} (see `sitelens report`)", ellipsis_path);
    }

    let pb = capture_spinner();
    let mut session = AnalysisSession::new().with_event_callback(spinner_events(pb));

    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let mut renderer = BrowserSession::launch(&paths.screenshots_dir)
        .await
        .context("launching headless browser")?;

    let outcome = session
        .expand(&mut display, &mut dataset, &mut renderer, &db, ellipsis_path)
        .await;
    renderer.close().await;

    match outcome? {
        ExpandOutcome::Applied { revealed, remaining } => {
            println!(
                "\n{} Revealed {} hidden page(s) under {}",
                "✓".green().bold(),
                revealed,
                ellipsis_path.trim_end_matches(ELLIPSIS_SUFFIX).bright_white()
            );
            if remaining > 0 {
                println!(
                    "{} {} page(s) still collapsed at {}",
                    "→".blue(),
                    remaining,
                    ellipsis_path.bright_white()
                );
            }
            println!("{} Captured pages now: {}", "→".blue(), dataset.captured_urls);
            Ok(())
        }
        ExpandOutcome::Stale => {
            println!("{} Nothing to expand at {}", "→".blue(), ellipsis_path);
            Ok(())
        }
        ExpandOutcome::Aborted => {
            println!("\n{} Expansion cancelled; nothing was changed.", "✗".red().bold());
            Ok(())
        }
    }
}

pub async fn handle_capture(args: &ArgMatches) -> Result<()> {
    let url = args.get_one::<Url>("url").expect("clap requires --url");
    let node_path = args.get_one::<String>("path").expect("clap requires --path");
    let paths = resolve_data_paths(args.get_one::<String>("data-dir"));

    let db = Database::new(&paths.db_path).context("opening database")?;
    let mut dataset = db
        .load_dataset(DEFAULT_DATASET)?
        .context("No analysis found. Run `sitelens analyze` first.")?;

    let mut display = collapse_tree(&dataset.tree, DEFAULT_MAX_CHILDREN);

    let pb = capture_spinner();
    let mut session = AnalysisSession::new().with_event_callback(spinner_events(pb));

    let mut renderer = BrowserSession::launch(&paths.screenshots_dir)
        .await
        .context("launching headless browser")?;

    let result = session
        .capture_single(
            &mut display,
            &mut dataset,
            &mut renderer,
            &db,
            node_path,
            url.as_str(),
        )
        .await;
    renderer.close().await;

    result?;
    println!(
        "\n{} Captured {} and attached it to {}",
        "✓".green().bold(),
        url.as_str().bright_white(),
        node_path.bright_white()
    );
    Ok(())
}

pub async fn handle_report(args: &ArgMatches) -> Result<()> {
    let format_arg = args.get_one::<String>("format").expect("clap default");
    let format = ReportFormat::from_str(format_arg)
        .with_context(|| format!("Unknown report format '{}'", format_arg))?;
    let output = args.get_one::<PathBuf>("output");
    let paths = resolve_data_paths(args.get_one::<String>("data-dir"));

    let db = Database::new(&paths.db_path).context("opening database")?;
    let dataset = db
        .load_dataset(DEFAULT_DATASET)?
        .context("No analysis found. Run `sitelens analyze` first.")?;

    let content = match format {
        ReportFormat::Text => generate_text_report(&dataset),
        ReportFormat::Json => generate_json_report(&dataset)?,
    };

    match output {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!(
                "{} Report written to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

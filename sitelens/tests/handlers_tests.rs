use clap::{Command, arg};
use sitelens::handlers::*;
use sitelens_core::model::AnalyzeOptions;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_resolve_data_paths_default() {
    let paths = resolve_data_paths(None);
    assert!(paths.db_path.ends_with("sitelens.db"));
    assert!(paths.screenshots_dir.ends_with("screenshots"));
    assert!(!paths.data_dir.to_string_lossy().contains('~'), "tilde expanded");
}

#[test]
fn test_resolve_data_paths_override() {
    let dir = "/tmp/sitelens-test".to_string();
    let paths = resolve_data_paths(Some(&dir));
    assert_eq!(paths.data_dir.to_string_lossy(), "/tmp/sitelens-test");
    assert_eq!(
        paths.db_path.to_string_lossy(),
        "/tmp/sitelens-test/sitelens.db"
    );
}

fn options_command() -> Command {
    Command::new("test")
        .arg(arg!(--"max-pages" <N>).required(false).value_parser(clap::value_parser!(usize)))
        .arg(arg!(--"load-timeout" <MS>).required(false).value_parser(clap::value_parser!(u64)))
        .arg(arg!(--"capture-delay" <MS>).required(false).value_parser(clap::value_parser!(u64)))
}

#[test]
fn test_options_default_when_unset() {
    let matches = options_command().get_matches_from(["test"]);
    let options = options_from_args(&matches);
    assert_eq!(options, AnalyzeOptions::default());
}

#[test]
fn test_options_are_clamped_to_accepted_ranges() {
    let matches = options_command().get_matches_from([
        "test",
        "--max-pages",
        "500",
        "--load-timeout",
        "1",
        "--capture-delay",
        "60000",
    ]);
    let options = options_from_args(&matches);
    assert_eq!(options.max_pages, 50);
    assert_eq!(options.load_timeout_ms, 3000);
    assert_eq!(options.capture_delay_ms, 3000);
}

#[test]
fn test_options_in_range_pass_through() {
    let matches = options_command().get_matches_from([
        "test",
        "--max-pages",
        "25",
        "--load-timeout",
        "5000",
        "--capture-delay",
        "750",
    ]);
    let options = options_from_args(&matches);
    assert_eq!(options.max_pages, 25);
    assert_eq!(options.load_timeout_ms, 5000);
    assert_eq!(options.capture_delay_ms, 750);
}

// Tests for dataset persistence

use sitelens_core::data::{DEFAULT_DATASET, Database};
use sitelens_core::model::{AnalyzeOptions, ReportDataset};
use sitelens_core::tree::build_page_tree;
use url::Url;

fn sample_dataset(total: usize) -> ReportDataset {
    let base = Url::parse("https://example.com/").unwrap();
    let urls: Vec<String> = (0..total)
        .map(|i| format!("https://example.com/page{}", i))
        .collect();
    let tree = build_page_tree(&urls, &base);
    ReportDataset::new(tree, base.to_string(), total, AnalyzeOptions::default())
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("sitelens.db")).unwrap();

    let mut dataset = sample_dataset(4);
    dataset.merge_screenshot("https://example.com/page0", "shot-001.png");

    db.save_dataset(DEFAULT_DATASET, &dataset).unwrap();
    let loaded = db.load_dataset(DEFAULT_DATASET).unwrap().unwrap();

    assert_eq!(loaded.base_url, dataset.base_url);
    assert_eq!(loaded.total_urls, 4);
    assert_eq!(loaded.captured_urls, 1);
    assert_eq!(loaded.captured_url_set, dataset.captured_url_set);
    assert_eq!(loaded.screenshot_map, dataset.screenshot_map);
    assert_eq!(loaded.tree, dataset.tree);
    assert_eq!(loaded.options, dataset.options);
}

#[test]
fn writes_replace_the_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("sitelens.db")).unwrap();

    let first = sample_dataset(2);
    db.save_dataset(DEFAULT_DATASET, &first).unwrap();

    let mut second = sample_dataset(9);
    second.merge_screenshot("https://example.com/page3", "shot-003.png");
    db.save_dataset(DEFAULT_DATASET, &second).unwrap();

    let loaded = db.load_dataset(DEFAULT_DATASET).unwrap().unwrap();
    assert_eq!(loaded.total_urls, 9);
    assert_eq!(loaded.captured_urls, 1);

    let listed = db.list_datasets().unwrap();
    assert_eq!(listed.len(), 1, "replace-on-write keeps a single record");
    assert_eq!(listed[0].0, DEFAULT_DATASET);
}

#[test]
fn missing_record_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("sitelens.db")).unwrap();
    assert!(db.load_dataset("nope").unwrap().is_none());
}

#[test]
fn exists_and_drop_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitelens.db");

    assert!(!Database::exists(&path));
    {
        let db = Database::new(&path).unwrap();
        db.save_dataset(DEFAULT_DATASET, &sample_dataset(1)).unwrap();
    }
    assert!(Database::exists(&path));
    Database::drop(&path);
    assert!(!Database::exists(&path));
}

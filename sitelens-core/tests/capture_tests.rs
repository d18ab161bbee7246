// Tests for the sequential capture orchestrator

use sitelens_core::capture::{ProgressCallback, execute_capture};
use sitelens_core::model::AnalyzeOptions;
use sitelens_scanner::error::{Result as ScanResult, ScanError};
use sitelens_scanner::renderer::PageRenderer;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Renderer double: records requested URLs, fails on demand, never touches a
/// browser.
#[derive(Default)]
struct MockRenderer {
    requested: Vec<String>,
    fail_urls: HashSet<String>,
    counter: usize,
}

impl MockRenderer {
    fn failing_on(urls: &[&str]) -> Self {
        Self {
            fail_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl PageRenderer for MockRenderer {
    async fn capture(
        &mut self,
        url: &str,
        _load_timeout: Duration,
        _capture_delay: Duration,
    ) -> ScanResult<String> {
        self.requested.push(url.to_string());
        if self.fail_urls.contains(url) {
            return Err(ScanError::Browser("render failed".to_string()));
        }
        self.counter += 1;
        Ok(format!("shot-{:03}.png", self.counter))
    }
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    let batch = urls(&[
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/c",
    ]);
    let mut renderer = MockRenderer::failing_on(&["https://example.com/b"]);

    let progress_log: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&progress_log);
    let progress: ProgressCallback = Arc::new(move |current, total, url| {
        log.lock().unwrap().push((current, total, url));
    });

    let cancel = AtomicBool::new(false);
    let results = execute_capture(
        &mut renderer,
        &batch,
        &AnalyzeOptions::default(),
        Some(progress),
        &cancel,
    )
    .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].screenshot.is_some());
    assert!(results[1].screenshot.is_none());
    assert!(results[1].error.is_some());
    assert!(results[2].screenshot.is_some());
    assert_eq!(results[1].url, "https://example.com/b");

    let log = progress_log.lock().unwrap();
    assert_eq!(log.len(), 3, "progress fires once per URL");
    for (i, (current, total, url)) in log.iter().enumerate() {
        assert_eq!(*current, i + 1, "current is strictly increasing from 1");
        assert_eq!(*total, 3);
        assert_eq!(url, &batch[i]);
    }
}

#[tokio::test]
async fn cancellation_returns_partial_results() {
    let batch = urls(&[
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/c",
        "https://example.com/d",
    ]);
    let mut renderer = MockRenderer::default();

    // Flip the flag while the second capture is being announced; the
    // in-flight capture still completes, the third never starts.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let progress: ProgressCallback = Arc::new(move |current, _total, _url| {
        if current == 2 {
            flag.store(true, Ordering::SeqCst);
        }
    });

    let results = execute_capture(
        &mut renderer,
        &batch,
        &AnalyzeOptions::default(),
        Some(progress),
        &cancel,
    )
    .await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.screenshot.is_some()));
    assert_eq!(renderer.requested.len(), 2);
}

#[tokio::test]
async fn empty_batch_is_a_noop() {
    let mut renderer = MockRenderer::default();
    let cancel = AtomicBool::new(false);

    let results = execute_capture(
        &mut renderer,
        &[],
        &AnalyzeOptions::default(),
        None,
        &cancel,
    )
    .await;

    assert!(results.is_empty());
    assert!(renderer.requested.is_empty());
}

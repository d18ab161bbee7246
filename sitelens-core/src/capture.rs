use crate::model::AnalyzeOptions;
use sitelens_scanner::renderer::PageRenderer;
use sitelens_scanner::result::CaptureResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Reports `(current, total, url)` before each capture; `current` is
/// 1-based.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

/// Sequentially capture screenshots for an ordered URL list.
///
/// One capture in flight at a time; the URLs share the renderer's single
/// browsing context. A failed page is recorded as `{screenshot: None,
/// error}` and never aborts the batch. The cancel flag is checked at
/// iteration boundaries only: an in-progress capture runs to completion, and
/// cancellation yields the results gathered so far rather than an error.
/// Callers tell "cancelled" from "complete" through session state, not the
/// result shape.
pub async fn execute_capture<R: PageRenderer>(
    renderer: &mut R,
    urls: &[String],
    options: &AnalyzeOptions,
    progress: Option<ProgressCallback>,
    cancel: &AtomicBool,
) -> Vec<CaptureResult> {
    let total = urls.len();
    let load_timeout = Duration::from_millis(options.load_timeout_ms);
    let capture_delay = Duration::from_millis(options.capture_delay_ms);

    let mut results = Vec::with_capacity(total);
    for (i, url) in urls.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            debug!("capture cancelled after {} of {} pages", i, total);
            break;
        }

        if let Some(ref callback) = progress {
            callback(i + 1, total, url.clone());
        }

        match renderer.capture(url, load_timeout, capture_delay).await {
            Ok(screenshot) => {
                results.push(CaptureResult::new(url.clone(), screenshot));
            }
            Err(e) => {
                warn!("capture failed for {}: {}", url, e);
                results.push(CaptureResult::with_error(url.clone(), e.to_string()));
            }
        }
    }

    results
}

use crate::capture::{ProgressCallback, execute_capture};
use crate::data::{DEFAULT_DATASET, Database};
use crate::error::{CoreError, Result};
use crate::expand::{ExpandOutcome, apply_expansion, plan_expansion};
use crate::model::{
    AnalyzeOptions, DEFAULT_MAX_CHILDREN, ReportDataset, ViewNode,
};
use crate::select::select_representative;
use crate::tree::{attach_screenshots, build_page_tree};
use reqwest::Client;
use serde::Serialize;
use sitelens_scanner::renderer::PageRenderer;
use sitelens_scanner::{Crawler, ScanError, sitemap};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use url::Url;

/// Depth limit for the fallback crawl.
const FALLBACK_CRAWL_DEPTH: usize = 3;

/// Page budget for the fallback crawl.
const FALLBACK_CRAWL_BUDGET: usize = 150;

/// Lifecycle of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Complete,
    Cancelled,
    Failed,
}

/// Terminal shape of a full analysis run. A cancelled run yields no dataset:
/// partial captures are discarded, no report is produced.
#[derive(Debug)]
pub enum RunOutcome {
    Complete(ReportDataset),
    Cancelled,
}

/// Events flowing out of the session to whoever is watching (CLI progress
/// bar, a GUI panel, a test recorder).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Progress { current: usize, total: usize, url: String },
    Complete { total_urls: usize, captured: usize },
    Error { message: String },
}

pub type EventCallback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// The one cross-operation mutual exclusion primitive: at most one capture
/// or expansion may be in flight system-wide. Acquisition is try-only
/// (concurrent attempts are rejected, never queued) and the permit releases
/// the flag on drop, covering every exit path.
#[derive(Clone, Default)]
pub struct OpGuard {
    flag: Arc<AtomicBool>,
}

impl OpGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> Option<OpPermit> {
        self.flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(OpPermit {
            flag: Arc::clone(&self.flag),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub struct OpPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for OpPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Snapshot answered to a status request.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub run_id: String,
    pub state: RunState,
    pub busy: bool,
}

/// One analysis session: owns the run state machine, the cancellation flag
/// and the single-flight guard, and carries every operation the control
/// surface accepts (start, cancel, status, expand, single capture).
pub struct AnalysisSession {
    run_id: String,
    state: RunState,
    cancel: Arc<AtomicBool>,
    guard: OpGuard,
    events: Option<EventCallback>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            state: RunState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
            guard: OpGuard::new(),
            events: None,
        }
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.events = Some(callback);
        self
    }

    pub fn guard(&self) -> &OpGuard {
        &self.guard
    }

    /// Shared handle for wiring external cancellation (ctrl-c, a cancel
    /// button) into the capture loop.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            run_id: self.run_id.clone(),
            state: self.state,
            busy: self.guard.is_busy(),
        }
    }

    /// Full analysis run: discover pages, build the site tree, select the
    /// representative subset, capture it, persist the dataset.
    pub async fn run<R: PageRenderer>(
        &mut self,
        base: &Url,
        renderer: &mut R,
        db: &Database,
        options: AnalyzeOptions,
    ) -> Result<RunOutcome> {
        let Some(_permit) = self.guard.acquire() else {
            return Err(CoreError::OperationInFlight);
        };
        let options = options.clamped();
        self.cancel.store(false, Ordering::SeqCst);
        self.state = RunState::Running;

        let outcome = self.run_inner(base, renderer, db, options).await;
        match &outcome {
            Ok(RunOutcome::Complete(dataset)) => {
                self.state = RunState::Complete;
                self.emit(SessionEvent::Complete {
                    total_urls: dataset.total_urls,
                    captured: dataset.captured_urls,
                });
            }
            Ok(RunOutcome::Cancelled) => {
                self.state = RunState::Cancelled;
            }
            Err(e) => {
                self.state = RunState::Failed;
                self.emit(SessionEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        outcome
    }

    async fn run_inner<R: PageRenderer>(
        &mut self,
        base: &Url,
        renderer: &mut R,
        db: &Database,
        options: AnalyzeOptions,
    ) -> Result<RunOutcome> {
        let client = Client::builder()
            .user_agent("Sitelens/0.1 (https://github.com/trapdoorsec/sitelens)")
            .timeout(std::time::Duration::from_millis(options.load_timeout_ms))
            .build()
            .map_err(ScanError::from)?;

        let urls = discover_urls(&client, base, &options).await?;
        info!("discovered {} URLs for {}", urls.len(), base);

        let selected = select_representative(&urls, base, options.max_pages);
        info!("selected {} of {} URLs for capture", selected.len(), urls.len());

        let results = execute_capture(
            renderer,
            &selected,
            &options,
            self.progress_callback(),
            &self.cancel,
        )
        .await;

        if self.cancel.load(Ordering::SeqCst) {
            debug!("run cancelled, discarding {} partial captures", results.len());
            return Ok(RunOutcome::Cancelled);
        }

        let tree = build_page_tree(&urls, base);
        let mut dataset = ReportDataset::new(tree, base.to_string(), urls.len(), options);
        for result in &results {
            if let Some(ref screenshot) = result.screenshot {
                dataset.merge_screenshot(&result.url, screenshot);
            }
        }
        attach_screenshots(&mut dataset.tree, &dataset.screenshot_map);

        db.save_dataset(DEFAULT_DATASET, &dataset)?;

        Ok(RunOutcome::Complete(dataset))
    }

    /// Reveal one batch of an ellipsis node's hidden children, pre-capturing
    /// the screenshots the dataset doesn't have yet, and splice the result
    /// into the live display tree and the persisted dataset.
    pub async fn expand<R: PageRenderer>(
        &mut self,
        display: &mut ViewNode,
        dataset: &mut ReportDataset,
        renderer: &mut R,
        db: &Database,
        ellipsis_path: &str,
    ) -> Result<ExpandOutcome> {
        let Some(_permit) = self.guard.acquire() else {
            return Err(CoreError::OperationInFlight);
        };

        let Some(plan) = plan_expansion(display, ellipsis_path) else {
            debug!("no ellipsis at {}, ignoring expansion request", ellipsis_path);
            return Ok(ExpandOutcome::Stale);
        };

        let pending: Vec<String> = plan
            .candidate_urls
            .iter()
            .filter(|url| !dataset.is_captured(url))
            .cloned()
            .collect();

        let mut fresh: BTreeMap<String, String> = BTreeMap::new();
        if !pending.is_empty() {
            debug!(
                "expansion of {} pre-captures {} of {} candidates",
                ellipsis_path,
                pending.len(),
                plan.candidate_urls.len()
            );
            let results = execute_capture(
                renderer,
                &pending,
                &dataset.options,
                self.progress_callback(),
                &self.cancel,
            )
            .await;

            if self.cancel.load(Ordering::SeqCst) {
                return Ok(ExpandOutcome::Aborted);
            }
            for result in results {
                if let Some(screenshot) = result.screenshot {
                    fresh.insert(result.url, screenshot);
                }
            }
        }

        let mut known = dataset.screenshot_map.clone();
        known.extend(fresh.iter().map(|(k, v)| (k.clone(), v.clone())));

        let outcome = apply_expansion(display, &plan, &known, DEFAULT_MAX_CHILDREN);
        if matches!(outcome, ExpandOutcome::Applied { .. }) {
            for (url, screenshot) in &fresh {
                dataset.merge_screenshot(url, screenshot);
            }
            attach_screenshots(&mut dataset.tree, &fresh);
            db.save_dataset(DEFAULT_DATASET, dataset)?;
        }

        Ok(outcome)
    }

    /// Single-node variant: capture exactly one URL and attach the
    /// screenshot to the node at `node_path` in both trees. No batch or
    /// ellipsis logic.
    pub async fn capture_single<R: PageRenderer>(
        &mut self,
        display: &mut ViewNode,
        dataset: &mut ReportDataset,
        renderer: &mut R,
        db: &Database,
        node_path: &str,
        url: &str,
    ) -> Result<()> {
        let Some(_permit) = self.guard.acquire() else {
            return Err(CoreError::OperationInFlight);
        };

        let urls = vec![url.to_string()];
        let results = execute_capture(
            renderer,
            &urls,
            &dataset.options,
            self.progress_callback(),
            &self.cancel,
        )
        .await;

        let Some(result) = results.into_iter().next() else {
            // Cancelled before the single capture started.
            return Ok(());
        };

        match result.screenshot {
            Some(screenshot) => {
                if let Some(node) = display.find_mut(node_path) {
                    node.screenshot = Some(screenshot.clone());
                }
                if let Some(node) = dataset.tree.find_mut(node_path) {
                    node.screenshot = Some(screenshot.clone());
                }
                dataset.merge_screenshot(url, &screenshot);
                db.save_dataset(DEFAULT_DATASET, dataset)?;
                Ok(())
            }
            None => Err(CoreError::CaptureFailed(
                result.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    fn progress_callback(&self) -> Option<ProgressCallback> {
        self.events.clone().map(|callback| {
            Arc::new(move |current: usize, total: usize, url: String| {
                callback(SessionEvent::Progress { current, total, url });
            }) as ProgressCallback
        })
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(ref callback) = self.events {
            callback(event);
        }
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Page-source collaborator: sitemap first, BFS crawl fallback. Zero URLs
/// from both is fatal for the run.
async fn discover_urls(client: &Client, base: &Url, options: &AnalyzeOptions) -> Result<Vec<String>> {
    match sitemap::discover_site_urls(client, base).await {
        Ok(urls) => {
            info!("sitemap discovery found {} URLs", urls.len());
            Ok(urls)
        }
        Err(e) => {
            debug!("sitemap unavailable ({}), falling back to crawl", e);
            let timeout_secs = options.load_timeout_ms.div_ceil(1000).max(1);
            let crawler = Crawler::with_timeout(timeout_secs)
                .with_max_depth(FALLBACK_CRAWL_DEPTH)
                .with_page_budget(FALLBACK_CRAWL_BUDGET);
            let visits = crawler.crawl(base.as_str()).await?;
            let urls: Vec<String> = visits
                .iter()
                .filter(|v| v.is_page())
                .map(|v| v.url.clone())
                .collect();
            if urls.is_empty() {
                Err(CoreError::SourceUnavailable)
            } else {
                Ok(urls)
            }
        }
    }
}

use crate::error::{Result, ScanError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The screenshot collaborator: render one URL and hand back an image
/// reference (file name inside the renderer's output directory).
///
/// Implementations own one reusable rendering context; callers drive it for
/// many URLs sequentially and tear it down when the batch is over.
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    async fn capture(
        &mut self,
        url: &str,
        load_timeout: Duration,
        capture_delay: Duration,
    ) -> Result<String>;
}

/// Headless Chrome driven over CDP. One browser process, one page reused for
/// every capture in the session.
pub struct BrowserSession {
    browser: Browser,
    page: chromiumoxide::Page,
    handler_task: JoinHandle<()>,
    output_dir: PathBuf,
}

impl BrowserSession {
    /// Launch the browser and open the single reusable page. PNG files land
    /// in `output_dir`, which is created if missing.
    pub async fn launch(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;

        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .build()
            .map_err(ScanError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScanError::Browser(e.to_string()))?;

        // CDP event pump; runs until the browser connection drops.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScanError::Browser(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            handler_task,
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Tear the browsing context down. Errors are logged, not propagated:
    /// close runs on every exit path and must not mask the real outcome.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }

    /// Stable file name for a URL, so re-captures overwrite instead of
    /// accumulating.
    pub fn image_name(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        format!("{}.png", hex::encode(&digest[..12]))
    }
}

impl PageRenderer for BrowserSession {
    async fn capture(
        &mut self,
        url: &str,
        load_timeout: Duration,
        capture_delay: Duration,
    ) -> Result<String> {
        debug!("rendering {}", url);

        match tokio::time::timeout(load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScanError::Browser(format!("navigation failed: {}", e))),
            Err(_) => {
                return Err(ScanError::Browser(format!(
                    "navigation to {} timed out after {:?}",
                    url, load_timeout
                )));
            }
        }

        // Best-effort load-complete signal, bounded by the load timeout.
        match tokio::time::timeout(load_timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("load signal for {} errored ({}), capturing anyway", url, e),
            Err(_) => debug!("load signal for {} timed out, capturing anyway", url),
        }

        // Fixed settle delay before capture.
        tokio::time::sleep(capture_delay).await;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        let bytes = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| ScanError::Browser(format!("screenshot failed: {}", e)))?;

        let name = Self::image_name(url);
        tokio::fs::write(self.output_dir.join(&name), &bytes).await?;

        Ok(name)
    }
}

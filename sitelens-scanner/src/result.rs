use serde::{Deserialize, Serialize};

/// One page observed by the fallback crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVisit {
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub links_found: Vec<String>,
}

impl PageVisit {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            content_type: None,
            links_found: Vec::new(),
        }
    }

    /// True for responses worth listing as pages of the site.
    pub fn is_page(&self) -> bool {
        (200..400).contains(&self.status_code)
    }
}

/// Outcome of one screenshot request. `screenshot` is an image reference
/// (file name inside the run's screenshot directory), never raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub url: String,
    pub screenshot: Option<String>,
    pub error: Option<String>,
}

impl CaptureResult {
    pub fn new(url: String, screenshot: String) -> Self {
        Self {
            url,
            screenshot: Some(screenshot),
            error: None,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            url,
            screenshot: None,
            error: Some(error),
        }
    }
}

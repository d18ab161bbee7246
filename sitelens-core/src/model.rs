use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path of the tree root; also the branch sentinel for URLs without path
/// segments.
pub const ROOT_PATH: &str = "/";

/// Suffix appended to an owner's path to form its ellipsis node path.
/// `url::Url::path()` percent-encodes `#`, so this can never collide with a
/// real child path.
pub const ELLIPSIS_SUFFIX: &str = "#more/";

/// Fan-out bound applied by the tree collapser.
pub const DEFAULT_MAX_CHILDREN: usize = 5;

/// Hidden children revealed per expansion.
pub const EXPAND_BATCH_SIZE: usize = 5;

/// One node of the canonical site tree. `path` is slash-terminated, unique
/// within the tree, and serves as the node's identity key. `url` is set only
/// for nodes backed by a discovered page; intermediate path segments stay
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub name: String,
    pub url: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl PageNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            path: path.into(),
            children: Vec::new(),
            screenshot: None,
        }
    }

    pub fn with_url(name: impl Into<String>, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(name, path)
        }
    }

    /// Node count of the whole subtree, this node included.
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(PageNode::count_nodes).sum::<usize>()
    }

    pub fn find(&self, path: &str) -> Option<&PageNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut PageNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(path))
    }
}

/// A node of the display tree: a bounded-fan-out copy of the site tree. A
/// node carrying `hidden` is an ellipsis placeholder standing in for the
/// children it conceals; it has no `url` and no `screenshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewNode {
    pub name: String,
    pub url: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<HiddenChildren>,
}

impl ViewNode {
    pub fn is_ellipsis(&self) -> bool {
        self.hidden.is_some()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.as_ref().map(|h| h.nodes.len()).unwrap_or(0)
    }

    pub fn find(&self, path: &str) -> Option<&ViewNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut ViewNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(path))
    }
}

/// Subtrees concealed behind an ellipsis node, kept in their source
/// (uncollapsed) form so revealing re-runs them through the collapser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenChildren {
    pub nodes: Vec<PageNode>,
    pub parent_path: String,
    pub batch_size: usize,
}

/// Derived per-URL classification; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUrlInfo {
    pub url: String,
    pub path: String,
    pub depth: usize,
    pub branch: String,
    pub segments: Vec<String>,
}

/// Tunables accepted on the control surface, clamped to sane bounds at every
/// entry point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    pub max_pages: usize,
    pub load_timeout_ms: u64,
    pub capture_delay_ms: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            load_timeout_ms: 8000,
            capture_delay_ms: 1000,
        }
    }
}

impl AnalyzeOptions {
    pub const MAX_PAGES_RANGE: (usize, usize) = (10, 50);
    pub const LOAD_TIMEOUT_RANGE: (u64, u64) = (3000, 15000);
    pub const CAPTURE_DELAY_RANGE: (u64, u64) = (500, 3000);

    pub fn clamped(self) -> Self {
        Self {
            max_pages: self
                .max_pages
                .clamp(Self::MAX_PAGES_RANGE.0, Self::MAX_PAGES_RANGE.1),
            load_timeout_ms: self
                .load_timeout_ms
                .clamp(Self::LOAD_TIMEOUT_RANGE.0, Self::LOAD_TIMEOUT_RANGE.1),
            capture_delay_ms: self
                .capture_delay_ms
                .clamp(Self::CAPTURE_DELAY_RANGE.0, Self::CAPTURE_DELAY_RANGE.1),
        }
    }
}

/// The persisted analysis record: the full site tree plus everything needed
/// to resume expanding it. One named instance, replaced wholesale by each
/// analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDataset {
    pub tree: PageNode,
    pub base_url: String,
    pub total_urls: usize,
    pub captured_urls: usize,
    pub timestamp: DateTime<Utc>,
    pub captured_url_set: Vec<String>,
    pub screenshot_map: BTreeMap<String, String>,
    pub options: AnalyzeOptions,
}

impl ReportDataset {
    pub fn new(tree: PageNode, base_url: String, total_urls: usize, options: AnalyzeOptions) -> Self {
        Self {
            tree,
            base_url,
            total_urls,
            captured_urls: 0,
            timestamp: Utc::now(),
            captured_url_set: Vec::new(),
            screenshot_map: BTreeMap::new(),
            options,
        }
    }

    pub fn is_captured(&self, url: &str) -> bool {
        self.captured_url_set.iter().any(|u| u == url)
    }

    /// Record one captured screenshot. Idempotent: re-merging an
    /// already-present URL changes nothing and returns false. The captured
    /// set and the screenshot map move together.
    pub fn merge_screenshot(&mut self, url: &str, screenshot: &str) -> bool {
        if self.is_captured(url) {
            return false;
        }
        self.captured_url_set.push(url.to_string());
        self.screenshot_map
            .insert(url.to_string(), screenshot.to_string());
        self.captured_urls = self.captured_url_set.len();
        true
    }
}

use crate::collapse::{collapse_tree, ellipsis_node};
use crate::model::{PageNode, ViewNode};
use crate::tree::attach_screenshots;
use std::collections::BTreeMap;
use tracing::debug;

/// Cap on URLs pre-captured per expansion.
pub const EXPAND_URL_CAP: usize = 10;

/// How deep into each revealed subtree candidate URLs are collected
/// (0 = the revealed node itself).
pub const EXPAND_URL_DEPTH: usize = 2;

/// Everything needed to carry one expansion through its capture phase and
/// splice the result back in afterwards.
#[derive(Debug, Clone)]
pub struct ExpansionPlan {
    pub parent_path: String,
    pub ellipsis_path: String,
    pub batch: Vec<PageNode>,
    pub remainder: Vec<PageNode>,
    pub candidate_urls: Vec<String>,
}

/// What became of an expansion once its results came back.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandOutcome {
    Applied { revealed: usize, remaining: usize },
    /// The owning node or the triggering ellipsis is gone from the display
    /// tree; the completion is dropped without touching anything.
    Stale,
    /// The capture phase was cancelled; the ellipsis is left untouched.
    Aborted,
}

/// Read an ellipsis node and split its hidden children into the batch to
/// reveal now and the remainder to keep concealed. Returns `None` when no
/// ellipsis lives at `ellipsis_path` (already expanded, or never existed).
pub fn plan_expansion(display: &ViewNode, ellipsis_path: &str) -> Option<ExpansionPlan> {
    let node = display.find(ellipsis_path)?;
    let hidden = node.hidden.as_ref()?;

    let batch_size = hidden.batch_size.min(hidden.nodes.len());
    let batch: Vec<PageNode> = hidden.nodes[..batch_size].to_vec();
    let remainder: Vec<PageNode> = hidden.nodes[batch_size..].to_vec();
    let candidate_urls = collect_expand_urls(&batch, EXPAND_URL_DEPTH, EXPAND_URL_CAP);

    Some(ExpansionPlan {
        parent_path: hidden.parent_path.clone(),
        ellipsis_path: ellipsis_path.to_string(),
        batch,
        remainder,
        candidate_urls,
    })
}

/// Page URLs worth pre-capturing from the subtrees about to be revealed:
/// depth-limited walk of each, in traversal order, stopping the moment the
/// cap is hit. Hidden children are source-form subtrees, so there are no
/// nested placeholders to skip.
pub fn collect_expand_urls(batch: &[PageNode], max_depth: usize, cap: usize) -> Vec<String> {
    let mut urls = Vec::new();
    for node in batch {
        if urls.len() >= cap {
            break;
        }
        collect_urls_walk(node, 0, max_depth, cap, &mut urls);
    }
    urls
}

fn collect_urls_walk(
    node: &PageNode,
    depth: usize,
    max_depth: usize,
    cap: usize,
    out: &mut Vec<String>,
) {
    if out.len() >= cap || depth > max_depth {
        return;
    }
    if let Some(ref url) = node.url
        && !out.contains(url)
    {
        out.push(url.clone());
        if out.len() >= cap {
            return;
        }
    }
    for child in &node.children {
        if out.len() >= cap {
            return;
        }
        collect_urls_walk(child, depth + 1, max_depth, cap, out);
    }
}

/// Splice a completed expansion into the live display tree: drop the
/// triggering ellipsis, append the revealed children (screenshots attached,
/// each re-collapsed), and re-append a fresh ellipsis if a remainder stays
/// hidden. A completion whose owner or ellipsis has disappeared is stale and
/// is dropped silently.
pub fn apply_expansion(
    display: &mut ViewNode,
    plan: &ExpansionPlan,
    screenshots: &BTreeMap<String, String>,
    max_children: usize,
) -> ExpandOutcome {
    let Some(owner) = display.find_mut(&plan.parent_path) else {
        debug!("expansion target {} no longer present, dropping", plan.parent_path);
        return ExpandOutcome::Stale;
    };
    let Some(ellipsis_idx) = owner
        .children
        .iter()
        .position(|c| c.path == plan.ellipsis_path && c.is_ellipsis())
    else {
        debug!("ellipsis at {} no longer present, dropping", plan.ellipsis_path);
        return ExpandOutcome::Stale;
    };

    owner.children.remove(ellipsis_idx);

    for revealed in &plan.batch {
        let mut subtree = revealed.clone();
        attach_screenshots(&mut subtree, screenshots);
        owner.children.push(collapse_tree(&subtree, max_children));
    }

    if !plan.remainder.is_empty() {
        owner
            .children
            .push(ellipsis_node(&plan.parent_path, plan.remainder.clone()));
    }

    ExpandOutcome::Applied {
        revealed: plan.batch.len(),
        remaining: plan.remainder.len(),
    }
}

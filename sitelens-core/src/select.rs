use crate::classify::parse_url_info;
use crate::model::ParsedUrlInfo;
use sitelens_scanner::crawler::normalize_url;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;
use url::Url;

/// Pick at most `max_pages` URLs out of the discovered set, biased toward
/// shallow depth and balanced across branches.
///
/// The homepage (a depth-0 URL) and the base URL itself are always selected
/// first. The rest of the budget is split across depths, shallow depths
/// weighted higher, and spent per depth by round-robin over the branches in
/// branch-discovery order.
pub fn select_representative(urls: &[String], base: &Url, max_pages: usize) -> Vec<String> {
    let parsed: Vec<ParsedUrlInfo> = urls
        .iter()
        .filter_map(|u| parse_url_info(u, base))
        .collect();

    let mut selected: Vec<String> = Vec::new();

    // The homepage and the base URL come before any sampling.
    if let Some(home) = parsed.iter().find(|p| p.depth == 0) {
        push_unique(&mut selected, &home.url);
    }
    push_unique(&mut selected, base.as_str());

    // Group what's left by depth, ascending.
    let mut by_depth: BTreeMap<usize, Vec<&ParsedUrlInfo>> = BTreeMap::new();
    for info in &parsed {
        if is_selected(&selected, &info.url) {
            continue;
        }
        by_depth.entry(info.depth).or_default().push(info);
    }

    let depths: Vec<usize> = by_depth.keys().copied().collect();
    let weight_sum: usize = depths.iter().map(|&d| depth_weight(d)).sum();
    if weight_sum == 0 {
        selected.truncate(max_pages);
        return selected;
    }
    let remaining_budget = max_pages.saturating_sub(selected.len());

    for &depth in &depths {
        if selected.len() >= max_pages {
            break;
        }
        let quota = div_ceil_weighted(depth_weight(depth), weight_sum, remaining_budget);
        debug!("depth {}: quota {} of {} remaining", depth, quota, remaining_budget);

        // Partition this depth's URLs by branch, preserving discovery order.
        let mut branch_order: Vec<&str> = Vec::new();
        let mut by_branch: HashMap<&str, VecDeque<&ParsedUrlInfo>> = HashMap::new();
        for &info in &by_depth[&depth] {
            let branch = info.branch.as_str();
            if !by_branch.contains_key(branch) {
                branch_order.push(branch);
            }
            by_branch.entry(branch).or_default().push_back(info);
        }

        // Round-robin across branches until the quota, the overall budget,
        // or the depth itself is exhausted.
        let mut taken = 0usize;
        'rotation: loop {
            let mut advanced = false;
            for branch in &branch_order {
                if taken >= quota || selected.len() >= max_pages {
                    break 'rotation;
                }
                let Some(info) = by_branch.get_mut(branch).and_then(|q| q.pop_front()) else {
                    continue;
                };
                advanced = true;
                if is_selected(&selected, &info.url) {
                    continue;
                }
                selected.push(info.url.clone());
                taken += 1;
            }
            if !advanced {
                break;
            }
        }
    }

    // Quota rounding may overshoot slightly; drop from the end.
    selected.truncate(max_pages);
    selected
}

/// Shallower depths get more of the budget; depth 4 and beyond share the
/// floor weight.
fn depth_weight(depth: usize) -> usize {
    if depth >= 4 { 1 } else { 5 - depth }
}

fn div_ceil_weighted(weight: usize, weight_sum: usize, budget: usize) -> usize {
    (weight * budget).div_ceil(weight_sum)
}

fn is_selected(selected: &[String], url: &str) -> bool {
    let normalized = normalize_url(url);
    selected.iter().any(|u| normalize_url(u) == normalized)
}

fn push_unique(selected: &mut Vec<String>, url: &str) {
    if !is_selected(selected, url) {
        selected.push(url.to_string());
    }
}

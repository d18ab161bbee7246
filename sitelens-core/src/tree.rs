use crate::classify::parse_url_info;
use crate::model::{PageNode, ROOT_PATH};
use std::collections::BTreeMap;
use url::Url;

/// Build the canonical site tree from an unordered URL list.
///
/// URLs are inserted shallow-first so intermediate nodes exist before deeper
/// descendants reference them. Walking a URL's segments creates any missing
/// intermediate node with `url: None`; reaching the full path on a node that
/// was created earlier as an intermediate fills in its `url` instead of
/// duplicating it. Exactly one node per distinct path; children keep
/// insertion order.
pub fn build_page_tree(urls: &[String], base: &Url) -> PageNode {
    let mut root = PageNode::with_url(
        base.host_str().unwrap_or("site").to_string(),
        ROOT_PATH,
        base.to_string(),
    );

    let mut parsed: Vec<_> = urls
        .iter()
        .filter_map(|u| parse_url_info(u, base))
        .collect();
    // Stable sort: first-seen order survives within each depth.
    parsed.sort_by_key(|info| info.depth);

    for info in &parsed {
        if info.depth == 0 {
            continue;
        }

        let mut node = &mut root;
        let mut prefix = String::from(ROOT_PATH);
        let last = info.segments.len() - 1;
        for (i, segment) in info.segments.iter().enumerate() {
            prefix.push_str(segment);
            prefix.push('/');

            let position = node.children.iter().position(|c| c.path == prefix);
            let idx = match position {
                Some(idx) => idx,
                None => {
                    node.children.push(PageNode::new(segment.clone(), prefix.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];

            if i == last && node.url.is_none() {
                node.url = Some(info.url.clone());
            }
        }
    }

    root
}

/// Attach screenshots to every node whose `url` has an entry in the map.
/// Re-running with the same map is a no-op.
pub fn attach_screenshots(node: &mut PageNode, screenshots: &BTreeMap<String, String>) {
    if let Some(ref url) = node.url
        && let Some(image) = screenshots.get(url)
    {
        node.screenshot = Some(image.clone());
    }
    for child in &mut node.children {
        attach_screenshots(child, screenshots);
    }
}

/// All distinct paths in the subtree, in depth-first order.
pub fn collect_paths(node: &PageNode, out: &mut Vec<String>) {
    out.push(node.path.clone());
    for child in &node.children {
        collect_paths(child, out);
    }
}

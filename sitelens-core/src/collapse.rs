use crate::model::{
    ELLIPSIS_SUFFIX, EXPAND_BATCH_SIZE, HiddenChildren, PageNode, ViewNode,
};

/// Produce the bounded-fan-out display copy of a (sub)tree.
///
/// Children are collapsed first; a node ending up with more than
/// `max_children` of them keeps the first `max_children - 1` and conceals the
/// rest behind one ellipsis node. The source tree is never touched: the
/// hidden slice is cloned out of it in source form, so a later reveal can
/// re-run the collapser on it.
pub fn collapse_tree(node: &PageNode, max_children: usize) -> ViewNode {
    debug_assert!(max_children >= 2);

    let mut children: Vec<ViewNode> = node
        .children
        .iter()
        .map(|child| collapse_tree(child, max_children))
        .collect();

    if children.len() > max_children {
        let keep = max_children - 1;
        let concealed: Vec<PageNode> = node.children[keep..].to_vec();
        children.truncate(keep);
        children.push(ellipsis_node(&node.path, concealed));
    }

    ViewNode {
        name: node.name.clone(),
        url: node.url.clone(),
        path: node.path.clone(),
        children,
        screenshot: node.screenshot.clone(),
        hidden: None,
    }
}

/// Synthetic placeholder standing in for `concealed` under the node at
/// `parent_path`.
pub fn ellipsis_node(parent_path: &str, concealed: Vec<PageNode>) -> ViewNode {
    ViewNode {
        name: format!("+{} more", concealed.len()),
        url: None,
        path: format!("{}{}", parent_path, ELLIPSIS_SUFFIX),
        children: Vec::new(),
        screenshot: None,
        hidden: Some(HiddenChildren {
            nodes: concealed,
            parent_path: parent_path.to_string(),
            batch_size: EXPAND_BATCH_SIZE,
        }),
    }
}

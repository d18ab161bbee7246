// Tests for display-tree collapsing and the collapse/reveal round trip

use sitelens_core::collapse::collapse_tree;
use sitelens_core::expand::{ExpandOutcome, apply_expansion, plan_expansion};
use sitelens_core::model::{DEFAULT_MAX_CHILDREN, PageNode, ViewNode};
use sitelens_core::tree::{build_page_tree, collect_paths};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

fn base() -> Url {
    Url::parse("https://example.com/").unwrap()
}

fn tree_with_children(count: usize) -> PageNode {
    let urls: Vec<String> = (0..count)
        .map(|i| format!("https://example.com/page{:02}", i))
        .collect();
    build_page_tree(&urls, &base())
}

#[test]
fn small_fanout_is_unchanged() {
    let tree = tree_with_children(5);
    let display = collapse_tree(&tree, DEFAULT_MAX_CHILDREN);

    assert_eq!(display.children.len(), 5);
    assert!(display.children.iter().all(|c| !c.is_ellipsis()));
    let source_names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
    let display_names: Vec<&str> = display.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(source_names, display_names);
}

#[test]
fn large_fanout_gets_one_ellipsis() {
    for k in [6, 7, 12, 30] {
        let tree = tree_with_children(k);
        let display = collapse_tree(&tree, DEFAULT_MAX_CHILDREN);

        assert_eq!(display.children.len(), 5, "k={}", k);
        let (real, ellipsis): (Vec<&ViewNode>, Vec<&ViewNode>) = display
            .children
            .iter()
            .partition(|c| !c.is_ellipsis());
        assert_eq!(real.len(), 4, "k={}", k);
        assert_eq!(ellipsis.len(), 1, "k={}", k);
        assert_eq!(ellipsis[0].hidden_count(), k - 4, "k={}", k);
        assert_eq!(ellipsis[0].name, format!("+{} more", k - 4));
        assert_eq!(ellipsis[0].path, "/#more/");
        assert_eq!(ellipsis[0].url, None);
        assert_eq!(ellipsis[0].screenshot, None);
    }
}

#[test]
fn ellipsis_records_its_owner() {
    let urls: Vec<String> = (0..8)
        .map(|i| format!("https://example.com/docs/page{}", i))
        .collect();
    let tree = build_page_tree(&urls, &base());
    let display = collapse_tree(&tree, DEFAULT_MAX_CHILDREN);

    let docs = &display.children[0];
    let ellipsis = docs.children.iter().find(|c| c.is_ellipsis()).unwrap();
    assert_eq!(ellipsis.path, "/docs/#more/");
    assert_eq!(
        ellipsis.hidden.as_ref().unwrap().parent_path,
        "/docs/"
    );
    assert_eq!(ellipsis.hidden.as_ref().unwrap().batch_size, 5);
}

#[test]
fn collapse_does_not_mutate_source() {
    let tree = tree_with_children(9);
    let before = tree.clone();
    let _display = collapse_tree(&tree, DEFAULT_MAX_CHILDREN);
    assert_eq!(tree, before);
}

fn find_ellipsis_path(node: &ViewNode) -> Option<String> {
    if node.is_ellipsis() {
        return Some(node.path.clone());
    }
    node.children.iter().find_map(find_ellipsis_path)
}

fn view_identity(node: &ViewNode, out: &mut BTreeSet<(String, Option<String>)>) {
    assert!(!node.is_ellipsis(), "fully revealed tree has no placeholders");
    out.insert((node.path.clone(), node.url.clone()));
    for child in &node.children {
        view_identity(child, out);
    }
}

#[test]
fn collapse_then_full_reveal_reconstructs_tree() {
    // A shape that collapses at several levels.
    let mut urls: Vec<String> = Vec::new();
    for i in 0..9 {
        urls.push(format!("https://example.com/top{}", i));
    }
    for i in 0..13 {
        urls.push(format!("https://example.com/top0/sub{}", i));
    }
    for i in 0..7 {
        urls.push(format!("https://example.com/top0/sub0/leaf{}", i));
    }
    let tree = build_page_tree(&urls, &base());

    let mut display = collapse_tree(&tree, DEFAULT_MAX_CHILDREN);
    let no_shots: BTreeMap<String, String> = BTreeMap::new();

    // Repeatedly reveal until no placeholder remains anywhere.
    while let Some(path) = find_ellipsis_path(&display) {
        let plan = plan_expansion(&display, &path).expect("placeholder has a plan");
        let outcome = apply_expansion(&mut display, &plan, &no_shots, DEFAULT_MAX_CHILDREN);
        assert!(matches!(outcome, ExpandOutcome::Applied { .. }));
    }

    let mut revealed = BTreeSet::new();
    view_identity(&display, &mut revealed);

    let mut source_paths = Vec::new();
    collect_paths(&tree, &mut source_paths);
    let source: BTreeSet<(String, Option<String>)> = {
        let mut set = BTreeSet::new();
        fn walk(node: &PageNode, set: &mut BTreeSet<(String, Option<String>)>) {
            set.insert((node.path.clone(), node.url.clone()));
            for child in &node.children {
                walk(child, set);
            }
        }
        walk(&tree, &mut set);
        set
    };

    assert_eq!(revealed, source);
    assert_eq!(revealed.len(), source_paths.len());
}

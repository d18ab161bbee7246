// Report generation from a persisted dataset

use crate::collapse::collapse_tree;
use crate::model::{DEFAULT_MAX_CHILDREN, ReportDataset, ViewNode};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn generate_text_report(dataset: &ReportDataset) -> String {
    let display = collapse_tree(&dataset.tree, DEFAULT_MAX_CHILDREN);

    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                          SITELENS STRUCTURE REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Site:          {}\n", dataset.base_url));
    report.push_str(&format!(
        "Analyzed:      {}\n",
        dataset.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Pages found:   {}\n", dataset.total_urls));
    report.push_str(&format!("Captured:      {}\n", dataset.captured_urls));
    report.push_str(&format!(
        "Tree nodes:    {}\n",
        dataset.tree.count_nodes()
    ));
    report.push('\n');

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("SITE MAP\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str(&format!("{}\n", tree_label(&display)));
    render_children(&display, "", &mut report);
    report.push('\n');

    report.push_str("Legend: [✓] captured  [·] not captured  (+N more) collapsed children\n");
    report.push_str("Expand a collapsed group with: sitelens expand --path <PATH>\n\n");

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                                End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    report
}

fn render_children(node: &ViewNode, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == count - 1;
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{}{}{}\n", prefix, connector, tree_label(child)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        render_children(child, &child_prefix, out);
    }
}

fn tree_label(node: &ViewNode) -> String {
    if node.is_ellipsis() {
        return format!("({})  [{}]", node.name, node.path);
    }
    match (&node.url, &node.screenshot) {
        (Some(_), Some(_)) => format!("[✓] {}", node.name),
        (Some(_), None) => format!("[·] {}", node.name),
        (None, _) => node.name.clone(),
    }
}

pub fn generate_json_report(dataset: &ReportDataset) -> Result<String, serde_json::Error> {
    let display = collapse_tree(&dataset.tree, DEFAULT_MAX_CHILDREN);

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitelens",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "site": {
                "base_url": dataset.base_url,
                "analyzed_at": dataset.timestamp.to_rfc3339(),
                "options": dataset.options
            },
            "summary": {
                "total_urls": dataset.total_urls,
                "captured_urls": dataset.captured_urls,
                "tree_nodes": dataset.tree.count_nodes()
            },
            "screenshots": dataset.screenshot_map,
            "tree": display
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

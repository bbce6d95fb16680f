//! Domain grouping: flat record snapshot -> mind-map tree

use super::{CollapseStates, TreeNode};
use reqmap_common::RequestRecord;
use std::collections::BTreeMap;
use tracing::warn;
use url::Url;

/// Label of the synthetic root node
pub const ROOT_LABEL: &str = "Captured Requests";

/// Build the mind-map tree from a record snapshot.
///
/// Records are grouped by hostname; records whose URL cannot be parsed
/// (or has no host) are excluded with a warning. Domains come out in
/// alphabetical order and requests within a domain in (timestamp, id)
/// order, so the tree is deterministic for a given snapshot.
pub fn build_tree(requests: &[RequestRecord], collapse: &CollapseStates) -> TreeNode {
    let mut domains: BTreeMap<String, Vec<&RequestRecord>> = BTreeMap::new();

    for record in requests {
        match Url::parse(&record.url).map(|u| u.host_str().map(str::to_string)) {
            Ok(Some(host)) => domains.entry(host).or_default().push(record),
            Ok(None) => warn!(url = %record.url, "URL has no hostname, skipping record"),
            Err(err) => warn!(url = %record.url, "Invalid URL, skipping record: {}", err),
        }
    }

    let mut root = TreeNode::new(ROOT_LABEL);
    root.collapsed = is_collapsed(collapse, ROOT_LABEL);

    for (domain, mut records) in domains {
        records.sort_by(|a, b| {
            a.time_stamp
                .cmp(&b.time_stamp)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut domain_node = TreeNode::new(&domain);
        domain_node.collapsed = is_collapsed(collapse, &domain);

        for record in records {
            domain_node.children.push(request_node(record, collapse));
        }

        root.children.push(domain_node);
    }

    root
}

fn request_node(record: &RequestRecord, collapse: &CollapseStates) -> TreeNode {
    let status = record
        .status_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "???".to_string());

    let mut node = TreeNode::new(format!("{} - {}", record.display_method(), status));
    node.collapsed = is_collapsed(collapse, &node.label);
    node.record = Some(record.clone());
    node.children.push(TreeNode::new(&record.url));
    node
}

fn is_collapsed(collapse: &CollapseStates, label: &str) -> bool {
    collapse.get(label).copied().unwrap_or(false)
}

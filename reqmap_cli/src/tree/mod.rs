//! Mind-map tree: structure, domain grouping, and layout

mod builder;
mod layout;

pub use builder::build_tree;
pub use layout::assign_positions;

use reqmap_common::RequestRecord;
use std::collections::HashMap;

/// Collapse state per node, keyed by node label. Owned by the renderer
/// and survives tree rebuilds.
pub type CollapseStates = HashMap<String, bool>;

/// One node of the mind map. Rebuilt from the record snapshot on every
/// render cycle; positions are filled in by the layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,

    /// The originating record, for request leaves
    pub record: Option<RequestRecord>,

    pub children: Vec<TreeNode>,

    /// When set, the node renders as a single unit and its descendants
    /// are neither positioned nor drawn
    pub collapsed: bool,

    pub x: f64,
    pub y: f64,
}

impl TreeNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            record: None,
            children: Vec::new(),
            collapsed: false,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first flatten of the currently displayed nodes. Does not
    /// descend into collapsed subtrees; drives selection in the TUI.
    pub fn visible_nodes(&self) -> Vec<&TreeNode> {
        let mut nodes = Vec::new();
        self.collect_visible(&mut nodes);
        nodes
    }

    fn collect_visible<'a>(&'a self, out: &mut Vec<&'a TreeNode>) {
        out.push(self);
        if !self.collapsed {
            for child in &self.children {
                child.collect_visible(out);
            }
        }
    }
}

//! Recursive mind-map layout
//!
//! Pure pre-pass over the tree: positions depend only on sibling order
//! and collapse states, so repeated passes over an unchanged tree leave
//! every coordinate where it was.

use super::TreeNode;

/// Assign (x, y) coordinates depth-first and return the subtree height
/// in units.
///
/// A node sits at `(x, y)`. A leaf, or a collapsed node, occupies one
/// unit and its children are not positioned. Otherwise the node's height
/// is the sum of its children's heights, each child placed one `step_x`
/// to the right and below its already-placed siblings.
pub fn assign_positions(node: &mut TreeNode, x: f64, y: f64, step_x: f64, step_y: f64) -> usize {
    node.x = x;
    node.y = y;

    if node.children.is_empty() || node.collapsed {
        return 1;
    }

    let mut total_height = 0;
    for child in &mut node.children {
        let used = assign_positions(
            child,
            x + step_x,
            y + total_height as f64 * step_y,
            step_x,
            step_y,
        );
        total_height += used;
    }

    total_height
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root -> a (leaf), b -> (b1, b2)
    fn sample_tree() -> TreeNode {
        let mut root = TreeNode::new("root");
        root.children.push(TreeNode::new("a"));
        let mut b = TreeNode::new("b");
        b.children.push(TreeNode::new("b1"));
        b.children.push(TreeNode::new("b2"));
        root.children.push(b);
        root
    }

    #[test]
    fn test_leaf_occupies_one_unit() {
        let mut leaf = TreeNode::new("leaf");
        let height = assign_positions(&mut leaf, 50.0, 50.0, 250.0, 60.0);
        assert_eq!(height, 1);
        assert_eq!((leaf.x, leaf.y), (50.0, 50.0));
    }

    #[test]
    fn test_children_stack_below_siblings() {
        let mut root = sample_tree();
        let height = assign_positions(&mut root, 0.0, 0.0, 250.0, 60.0);
        assert_eq!(height, 3);

        // a occupies the first unit, b starts one unit down
        assert_eq!((root.children[0].x, root.children[0].y), (250.0, 0.0));
        assert_eq!((root.children[1].x, root.children[1].y), (250.0, 60.0));

        // b's children continue at b's vertical offset
        let b = &root.children[1];
        assert_eq!((b.children[0].x, b.children[0].y), (500.0, 60.0));
        assert_eq!((b.children[1].x, b.children[1].y), (500.0, 120.0));
    }

    #[test]
    fn test_collapsed_subtree_counts_as_one() {
        let mut root = sample_tree();
        root.children[1].collapsed = true;

        let height = assign_positions(&mut root, 0.0, 0.0, 250.0, 60.0);
        assert_eq!(height, 2);
        assert_eq!(root.children[1].y, 60.0);
        // Collapsed children keep whatever position they had (unset here)
        assert_eq!(root.children[1].children[0].y, 0.0);
    }

    #[test]
    fn test_layout_is_stable_across_passes() {
        let mut root = sample_tree();
        assign_positions(&mut root, 50.0, 50.0, 250.0, 60.0);
        let first = root.clone();
        assign_positions(&mut root, 50.0, 50.0, 250.0, 60.0);
        assert_eq!(root, first);
    }

    #[test]
    fn test_toggle_shifts_only_later_siblings() {
        let mut root = sample_tree();
        root.children.push(TreeNode::new("c"));
        assign_positions(&mut root, 0.0, 0.0, 250.0, 60.0);
        let a_before = (root.children[0].x, root.children[0].y);
        let c_before_y = root.children[2].y;
        assert_eq!(c_before_y, 180.0);

        // Collapsing b shrinks its contribution from 2 units to 1;
        // a stays put, c shifts up by one step.
        root.children[1].collapsed = true;
        assign_positions(&mut root, 0.0, 0.0, 250.0, 60.0);
        assert_eq!((root.children[0].x, root.children[0].y), a_before);
        assert_eq!(root.children[2].y, 120.0);
    }
}

//! Hierarchical output: a forest of contours where children of outer
//! boundaries are holes and children of holes are nested outers.
//!
//! Nodes live in one arena addressed by index; the root (index 0) carries no
//! polygon and simply anchors every top-level outer.

use crate::geom::{area, Path64, Paths64};

#[derive(Debug, Clone)]
pub struct PolyNode {
    parent: Option<usize>,
    children: Vec<usize>,
    contour: Path64,
}

impl PolyNode {
    fn root() -> Self {
        Self { parent: None, children: Vec::new(), contour: Path64::new() }
    }

    pub fn contour(&self) -> &Path64 {
        &self.contour
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Arena-backed polygon forest.
#[derive(Debug, Clone)]
pub struct PolyTree {
    pub nodes: Vec<PolyNode>,
}

impl Default for PolyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyTree {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self { nodes: vec![PolyNode::root()] }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(PolyNode::root());
    }

    pub fn add_child(&mut self, parent: usize, contour: Path64) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(PolyNode { parent: Some(parent), children: Vec::new(), contour });
        self.nodes[parent].children.push(idx);
        idx
    }

    pub fn root(&self) -> &PolyNode {
        &self.nodes[Self::ROOT]
    }

    /// Depth below the root; top-level outers are level 1.
    pub fn level(&self, node: usize) -> u32 {
        let mut level = 0;
        let mut p = self.nodes[node].parent;
        while let Some(i) = p {
            level += 1;
            p = self.nodes[i].parent;
        }
        level
    }

    /// Holes sit at even levels (their parents are outers at odd levels).
    pub fn is_hole(&self, node: usize) -> bool {
        let level = self.level(node);
        level > 0 && level & 1 == 0
    }

    /// Signed area of a node's contour plus all of its descendants.
    pub fn subtree_area(&self, node: usize) -> f64 {
        let mut sum = area(&self.nodes[node].contour);
        for &child in &self.nodes[node].children {
            sum += self.subtree_area(child);
        }
        sum
    }

    /// Number of contour-bearing nodes.
    pub fn contour_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Flatten the forest to plain paths, depth first.
    pub fn to_paths(&self) -> Paths64 {
        let mut out = Paths64::with_capacity(self.contour_count());
        self.collect(Self::ROOT, &mut out);
        out
    }

    fn collect(&self, node: usize, out: &mut Paths64) {
        if node != Self::ROOT && !self.nodes[node].contour.is_empty() {
            out.push(self.nodes[node].contour.clone());
        }
        for &child in &self.nodes[node].children {
            self.collect(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::make_path;

    fn sample_tree() -> PolyTree {
        let mut tree = PolyTree::new();
        let outer = tree.add_child(
            PolyTree::ROOT,
            make_path(&[0, 0, 100, 0, 100, 100, 0, 100]),
        );
        let hole = tree.add_child(outer, make_path(&[20, 20, 20, 80, 80, 80, 80, 20]));
        tree.add_child(hole, make_path(&[40, 40, 60, 40, 60, 60, 40, 60]));
        tree
    }

    #[test]
    fn levels_and_holes() {
        let tree = sample_tree();
        assert_eq!(tree.level(1), 1);
        assert!(!tree.is_hole(1));
        assert_eq!(tree.level(2), 2);
        assert!(tree.is_hole(2));
        assert!(!tree.is_hole(3)); // island inside the hole
    }

    #[test]
    fn subtree_area_nets_out_holes() {
        let tree = sample_tree();
        // 10000 - 3600 + 400
        assert_eq!(tree.subtree_area(1), 6800.0);
    }

    #[test]
    fn flatten_preserves_nesting_order() {
        let tree = sample_tree();
        let paths = tree.to_paths();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].len(), 4);
        assert_eq!(tree.contour_count(), 3);
    }

    #[test]
    fn clear_resets_to_a_lone_root() {
        let mut tree = sample_tree();
        tree.clear();
        assert_eq!(tree.contour_count(), 0);
        assert!(tree.root().children().is_empty());
    }
}

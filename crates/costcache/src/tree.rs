//! AVL tree over distinct cost values
//!
//! One node per distinct cost present in a bucket. Used only to find the
//! minimum cost in O(log k). Each subtree is owned by its parent and every
//! mutation returns the new subtree root.

use std::cmp::{max, Ordering};

type Link = Option<Box<CostNode>>;

#[derive(Debug)]
struct CostNode {
    cost: i64,
    height: i32,
    left: Link,
    right: Link,
}

impl CostNode {
    fn new(cost: i64) -> Box<Self> {
        Box::new(Self {
            cost,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
    }

    /// height(left) - height(right)
    fn balance(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.balance())
}

fn rotate_right(mut node: Box<CostNode>) -> Box<CostNode> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<CostNode>) -> Box<CostNode> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restore the AVL property at `node`, assuming both subtrees are valid.
fn rebalance(mut node: Box<CostNode>) -> Box<CostNode> {
    node.update_height();
    let diff = node.balance();

    if diff > 1 {
        // left-right case
        if balance(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if diff < -1 {
        // right-left case
        if balance(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn insert(link: Link, cost: i64) -> Box<CostNode> {
    let Some(mut node) = link else {
        return CostNode::new(cost);
    };

    match cost.cmp(&node.cost) {
        Ordering::Less => node.left = Some(insert(node.left.take(), cost)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), cost)),
        Ordering::Equal => return node,
    }

    rebalance(node)
}

/// Detach the minimum node of a subtree. Returns (remaining subtree, min cost).
fn take_min(mut node: Box<CostNode>) -> (Link, i64) {
    match node.left.take() {
        None => (node.right.take(), node.cost),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove(link: Link, cost: i64) -> Link {
    let mut node = link?;

    match cost.cmp(&node.cost) {
        Ordering::Less => node.left = remove(node.left.take(), cost),
        Ordering::Greater => node.right = remove(node.right.take(), cost),
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, None) => return None,
            (Some(child), None) | (None, Some(child)) => return Some(child),
            (Some(left), Some(right)) => {
                // replace with the in-order successor
                let (rest, successor) = take_min(right);
                node.cost = successor;
                node.left = Some(left);
                node.right = rest;
            }
        },
    }

    Some(rebalance(node))
}

/// Ordered set of distinct costs with O(log k) insert, remove and minimum
#[derive(Debug, Default)]
pub(crate) struct CostTree {
    root: Link,
    len: usize,
}

impl CostTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a cost. No-op if the cost is already present.
    pub(crate) fn insert(&mut self, cost: i64) {
        if self.contains(cost) {
            return;
        }
        self.root = Some(insert(self.root.take(), cost));
        self.len += 1;
    }

    /// Remove a cost. No-op if absent.
    pub(crate) fn remove(&mut self, cost: i64) {
        if !self.contains(cost) {
            return;
        }
        self.root = remove(self.root.take(), cost);
        self.len -= 1;
    }

    /// Smallest cost in the tree
    pub(crate) fn min(&self) -> Option<i64> {
        let mut node = self.root.as_ref()?;
        while let Some(left) = node.left.as_ref() {
            node = left;
        }
        Some(node.cost)
    }

    pub(crate) fn contains(&self, cost: i64) -> bool {
        let mut cursor = self.root.as_ref();
        while let Some(node) = cursor {
            cursor = match cost.cmp(&node.cost) {
                Ordering::Less => node.left.as_ref(),
                Ordering::Greater => node.right.as_ref(),
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Number of distinct costs
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Height of the whole tree (0 when empty)
    #[cfg(test)]
    pub(crate) fn height(&self) -> i32 {
        height(&self.root)
    }

    /// Costs in ascending order
    pub(crate) fn costs(&self) -> Vec<i64> {
        fn walk(link: &Link, out: &mut Vec<i64>) {
            if let Some(node) = link {
                walk(&node.left, out);
                out.push(node.cost);
                walk(&node.right, out);
            }
        }

        let mut out = Vec::with_capacity(self.len);
        walk(&self.root, &mut out);
        out
    }

    /// Verify ordering, stored heights and balance factors.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        fn check(link: &Link, lo: Option<i64>, hi: Option<i64>) -> Result<i32, String> {
            let Some(node) = link else {
                return Ok(0);
            };
            if lo.is_some_and(|lo| node.cost <= lo) || hi.is_some_and(|hi| node.cost >= hi) {
                return Err(format!("cost {} out of order", node.cost));
            }
            let left = check(&node.left, lo, Some(node.cost))?;
            let right = check(&node.right, Some(node.cost), hi)?;
            let expected = 1 + max(left, right);
            if node.height != expected {
                return Err(format!(
                    "node {} has height {}, expected {}",
                    node.cost, node.height, expected
                ));
            }
            if (left - right).abs() > 1 {
                return Err(format!("node {} unbalanced: {}", node.cost, left - right));
            }
            Ok(expected)
        }

        check(&self.root, None, None)?;
        let count = self.costs().len();
        if count != self.len {
            return Err(format!("tree holds {} costs, len says {}", count, self.len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_empty() {
        let tree = CostTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn test_insert_and_min() {
        let mut tree = CostTree::new();
        tree.insert(10);
        tree.insert(5);
        tree.insert(20);
        tree.insert(-3);

        assert_eq!(tree.min(), Some(-3));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.costs(), vec![-3, 5, 10, 20]);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = CostTree::new();
        tree.insert(7);
        tree.insert(7);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.costs(), vec![7]);
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let mut tree = CostTree::new();
        for cost in 0..1024 {
            tree.insert(cost);
        }

        tree.check_invariants().unwrap();
        assert_eq!(tree.min(), Some(0));
        // an AVL tree of 1024 nodes is at most ~1.44 * log2(n) high
        assert!(tree.height() <= 14, "height {}", tree.height());
    }

    #[test]
    fn test_remove_leaf_and_inner() {
        let mut tree = CostTree::new();
        for cost in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(cost);
        }

        tree.remove(20);
        assert_eq!(tree.min(), Some(30));

        // two children: replaced by successor
        tree.remove(50);
        assert_eq!(tree.costs(), vec![30, 40, 60, 70, 80]);
        tree.check_invariants().unwrap();

        tree.remove(999);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_remove_all() {
        let mut tree = CostTree::new();
        for cost in 0..100 {
            tree.insert(cost);
        }
        for cost in 0..100 {
            assert_eq!(tree.min(), Some(cost));
            tree.remove(cost);
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut tree = CostTree::new();
        tree.insert(1);
        tree.insert(2);
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    proptest! {
        #[test]
        fn test_matches_ordered_set(ops in prop::collection::vec((any::<bool>(), -50i64..50), 1..300)) {
            let mut tree = CostTree::new();
            let mut model = BTreeSet::new();

            for (is_insert, cost) in ops {
                if is_insert {
                    tree.insert(cost);
                    model.insert(cost);
                } else {
                    tree.remove(cost);
                    model.remove(&cost);
                }

                prop_assert_eq!(tree.min(), model.iter().next().copied());
                prop_assert!(tree.check_invariants().is_ok());
            }

            prop_assert_eq!(tree.costs(), model.into_iter().collect::<Vec<_>>());
        }
    }
}

//! Structural self-verification.
//!
//! [`BTreeMultiset::verify_invariants`] walks the whole tree and checks
//! every shape invariant the rebalancing procedures are supposed to
//! preserve. It is meant to run after each mutation in tests; it never runs
//! on the operation hot path. A failure always indicates a bug, never a
//! caller error.

use crate::btree::tree::{BTreeError, BTreeMultiset};

fn violation(description: String) -> BTreeError {
    BTreeError::InvariantViolation(description)
}

impl<T: Ord> BTreeMultiset<T> {
    /// Verify every structural invariant, returning the first violation.
    ///
    /// Checked, per node: key count within the order bound, keys ascending,
    /// `children == keys + 1` for internal nodes, no empty node other than
    /// an empty-tree root, separator ordering against both adjacent
    /// children, and single-parent reachability. Checked globally: uniform
    /// leaf depth, stored count equal to the number of keys found, and no
    /// reachable node on the free list.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::InvariantViolation`] describing the first
    /// failed check.
    pub fn verify_invariants(&self) -> Result<(), BTreeError> {
        let mut leaf_depth: Option<usize> = None;
        let mut visited = vec![false; self.nodes.len()];
        let mut total_keys = 0_usize;
        let mut stack = vec![(self.root, 0_usize)];

        while let Some((id, depth)) = stack.pop() {
            if id >= self.nodes.len() {
                return Err(violation(format!("node {id} is outside the arena")));
            }
            if visited[id] {
                return Err(violation(format!("node {id} has more than one parent")));
            }
            visited[id] = true;

            let node = &self.nodes[id];
            let keys = node.keys.as_slice();
            total_keys += keys.len();

            if keys.len() > self.order() {
                return Err(violation(format!(
                    "node {id} holds {} keys, more than order {}",
                    keys.len(),
                    self.order()
                )));
            }
            if keys.is_empty() && !(id == self.root && node.is_leaf()) {
                return Err(violation(format!("node {id} has no keys")));
            }
            if keys.windows(2).any(|pair| pair[0] > pair[1]) {
                return Err(violation(format!("node {id} keys are out of order")));
            }

            if node.is_leaf() {
                match leaf_depth {
                    None => leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(violation(format!(
                            "leaf {id} at depth {depth}, expected {expected}"
                        )));
                    }
                    Some(_) => {}
                }
            } else {
                if node.children.len() != keys.len() + 1 {
                    return Err(violation(format!(
                        "node {id} has {} children for {} keys",
                        node.children.len(),
                        keys.len()
                    )));
                }
                for (index, key) in keys.iter().enumerate() {
                    let below = self
                        .nodes
                        .get(node.children[index])
                        .and_then(|child| child.keys.last());
                    if below.is_some_and(|largest| largest > key) {
                        return Err(violation(format!(
                            "node {id} separator {index} is smaller than its left child"
                        )));
                    }
                    let above = self
                        .nodes
                        .get(node.children[index + 1])
                        .and_then(|child| child.keys.first());
                    if above.is_some_and(|smallest| smallest < key) {
                        return Err(violation(format!(
                            "node {id} separator {index} is larger than its right child"
                        )));
                    }
                }
                for &child in &node.children {
                    stack.push((child, depth + 1));
                }
            }
        }

        if self.len() != total_keys {
            return Err(violation(format!(
                "stored count {} does not match {total_keys} keys found",
                self.len()
            )));
        }
        for &id in &self.free {
            if visited.get(id).copied().unwrap_or(false) {
                return Err(violation(format!("freed node {id} is still reachable")));
            }
        }

        Ok(())
    }
}

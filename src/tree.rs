use std::cmp::Ordering;

use tracing::trace;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy)]
struct RbNode<K, V> {
    key: K,
    value: V,
    parent: usize,
    left: usize,
    right: usize,
    color: Color,
}

/// Ordered map backed by a red-black tree.
///
/// Nodes live in an arena; `parent`/`left`/`right` are arena indices with
/// `NIL` standing in for leaf sentinels. The tree maintains the red-black
/// conditions: red nodes have black children, every root-to-leaf path
/// carries the same number of black nodes, and the root is black.
pub struct RbTree<K, V> {
    nodes: Vec<RbNode<K, V>>,
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl<K: Copy + Ord, V: Copy> RbTree<K, V> {
    pub fn new() -> Self {
        RbTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, key: K, value: V) {
        let node = self.alloc(key, value);
        self.binary_insert(node);
        self.fix_insertion(node);
        self.len += 1;
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        let node = self.find_node(key);
        if node == NIL {
            None
        } else {
            Some(&self.nodes[node].value)
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find_node(key) != NIL
    }

    /// Removes `key` and returns its value, rebalancing afterwards.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let node = self.find_node(key);
        if node == NIL {
            return None;
        }
        let removed = self.nodes[node].value;

        // Walk down both spines at once; the deeper one wins and yields
        // either the in-order predecessor or successor of `node`.
        let mut left = self.nodes[node].left;
        let mut right = self.nodes[node].right;
        let mut spliced = node;
        while left != NIL || right != NIL {
            if left != NIL {
                spliced = left;
                left = self.nodes[left].right;
            }
            if right != NIL {
                spliced = right;
                right = self.nodes[right].left;
            }
        }
        self.nodes[node].key = self.nodes[spliced].key;
        self.nodes[node].value = self.nodes[spliced].value;

        // `spliced` has at most one non-leaf child.
        let child = if self.nodes[spliced].right == NIL {
            self.nodes[spliced].left
        } else {
            self.nodes[spliced].right
        };

        if self.nodes[spliced].color == Color::Black && child == NIL {
            self.fix_removal(spliced);
        }

        let parent = self.nodes[spliced].parent;
        if parent != NIL {
            if self.nodes[parent].left == spliced {
                self.nodes[parent].left = child;
            } else {
                self.nodes[parent].right = child;
            }
        } else {
            self.root = child;
        }
        if child != NIL {
            self.nodes[child].parent = parent;
            self.nodes[child].color = Color::Black;
        }

        self.free.push(spliced);
        self.len -= 1;
        Some(removed)
    }

    /// Post-order traversal: both subtrees before the node itself, so a
    /// visitor may release payloads without stranding live children.
    pub fn traverse_post_order<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        self.post_order(self.root, &mut visit);
    }

    /// In-order traversal, ascending by key.
    pub fn traverse_in_order<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        self.in_order(self.root, &mut visit);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        let node = RbNode {
            key,
            value,
            parent: NIL,
            left: NIL,
            right: NIL,
            color: Color::Red,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn find_node(&self, key: &K) -> usize {
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Equal => return cur,
                Ordering::Less => cur = self.nodes[cur].left,
                Ordering::Greater => cur = self.nodes[cur].right,
            }
        }
        NIL
    }

    /// Plain BST insertion; red-black conditions are restored afterwards
    /// by `fix_insertion`. Duplicate keys descend to the right.
    fn binary_insert(&mut self, node: usize) {
        if self.root == NIL {
            self.root = node;
            return;
        }
        let mut cur = self.root;
        loop {
            if self.nodes[node].key < self.nodes[cur].key {
                if self.nodes[cur].left == NIL {
                    self.nodes[cur].left = node;
                    break;
                }
                cur = self.nodes[cur].left;
            } else {
                if self.nodes[cur].right == NIL {
                    self.nodes[cur].right = node;
                    break;
                }
                cur = self.nodes[cur].right;
            }
        }
        self.nodes[node].parent = cur;
    }

    fn fix_insertion(&mut self, node: usize) {
        let parent = self.nodes[node].parent;
        if parent == NIL {
            self.nodes[node].color = Color::Black;
            return;
        }
        if self.nodes[parent].color == Color::Black {
            return;
        }

        // Parent is red, so a grandparent exists.
        let grandparent = self.nodes[parent].parent;
        let uncle = self.sibling(parent);
        if self.color(uncle) == Color::Red {
            self.nodes[parent].color = Color::Black;
            self.nodes[uncle].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.fix_insertion(grandparent);
            return;
        }

        // Inner grandchildren rotate onto the outside first.
        let mut node = node;
        if self.is_left_inner_grandchild(node, grandparent) {
            self.rotate_left(parent);
            node = self.nodes[node].left;
        } else if self.is_right_inner_grandchild(node, grandparent) {
            self.rotate_right(parent);
            node = self.nodes[node].right;
        }

        let parent = self.nodes[node].parent;
        let grandparent = self.nodes[parent].parent;
        if node == self.nodes[parent].left {
            self.rotate_right(grandparent);
        } else {
            self.rotate_left(grandparent);
        }
        self.nodes[parent].color = Color::Black;
        self.nodes[grandparent].color = Color::Red;
    }

    fn fix_removal(&mut self, node: usize) {
        // Case 1: the double-black reached the root.
        if self.nodes[node].parent == NIL {
            trace!("fix removal case 1");
            return;
        }

        // Case 2: red sibling becomes the new subtree top.
        let sibling = self.sibling(node);
        if self.color(sibling) == Color::Red {
            trace!("fix removal case 2");
            let parent = self.nodes[node].parent;
            self.nodes[parent].color = Color::Red;
            self.nodes[sibling].color = Color::Black;
            if node == self.nodes[parent].left {
                self.rotate_left(parent);
            } else {
                self.rotate_right(parent);
            }
        }

        // Case 3: everything around is black, push the deficit upward.
        let sibling = self.sibling(node);
        let parent = self.nodes[node].parent;
        if self.nodes[parent].color == Color::Black
            && self.color(sibling) == Color::Black
            && self.color(self.nodes[sibling].left) == Color::Black
            && self.color(self.nodes[sibling].right) == Color::Black
        {
            trace!("fix removal case 3");
            self.nodes[sibling].color = Color::Red;
            self.fix_removal(parent);
            return;
        }

        // Case 4: red parent absorbs the missing black.
        let sibling = self.sibling(node);
        let parent = self.nodes[node].parent;
        if self.nodes[parent].color == Color::Red
            && self.color(sibling) == Color::Black
            && self.color(self.nodes[sibling].left) == Color::Black
            && self.color(self.nodes[sibling].right) == Color::Black
        {
            trace!("fix removal case 4");
            self.nodes[sibling].color = Color::Red;
            self.nodes[parent].color = Color::Black;
            return;
        }

        // Case 5: force the sibling's red child to the outside so case 6
        // rotates correctly.
        let sibling = self.sibling(node);
        if self.color(sibling) == Color::Black {
            let parent = self.nodes[node].parent;
            if node == self.nodes[parent].left
                && self.color(self.nodes[sibling].right) == Color::Black
                && self.color(self.nodes[sibling].left) == Color::Red
            {
                trace!("fix removal case 5");
                self.nodes[sibling].color = Color::Red;
                let inner = self.nodes[sibling].left;
                self.nodes[inner].color = Color::Black;
                self.rotate_right(sibling);
            } else if node == self.nodes[parent].right
                && self.color(self.nodes[sibling].left) == Color::Black
                && self.color(self.nodes[sibling].right) == Color::Red
            {
                trace!("fix removal case 5");
                self.nodes[sibling].color = Color::Red;
                let inner = self.nodes[sibling].right;
                self.nodes[inner].color = Color::Black;
                self.rotate_left(sibling);
            }
        }

        // Case 6: rotate the parent; the sibling's outer red child pays
        // the missing black.
        trace!("fix removal case 6");
        let sibling = self.sibling(node);
        let parent = self.nodes[node].parent;
        self.nodes[sibling].color = self.nodes[parent].color;
        self.nodes[parent].color = Color::Black;
        if node == self.nodes[parent].left {
            let outer = self.nodes[sibling].right;
            self.nodes[outer].color = Color::Black;
            self.rotate_left(parent);
        } else {
            let outer = self.nodes[sibling].left;
            self.nodes[outer].color = Color::Black;
            self.rotate_right(parent);
        }
    }

    //            P                                 P
    //           /                                 /
    //          N         rotate_left(N)          R
    //         / \            ====>              / \
    //        A   R                             N   B
    //           / \                           / \
    //          M   B                         A   M
    fn rotate_left(&mut self, node: usize) {
        let pivot = self.nodes[node].right;
        if pivot == NIL {
            return;
        }
        let parent = self.nodes[node].parent;
        self.nodes[pivot].parent = parent;
        if parent != NIL {
            if self.nodes[parent].right == node {
                self.nodes[parent].right = pivot;
            } else {
                self.nodes[parent].left = pivot;
            }
        } else {
            self.root = pivot;
        }
        let middle = self.nodes[pivot].left;
        self.nodes[node].right = middle;
        if middle != NIL {
            self.nodes[middle].parent = node;
        }
        self.nodes[node].parent = pivot;
        self.nodes[pivot].left = node;
    }

    fn rotate_right(&mut self, node: usize) {
        let pivot = self.nodes[node].left;
        if pivot == NIL {
            return;
        }
        let parent = self.nodes[node].parent;
        self.nodes[pivot].parent = parent;
        if parent != NIL {
            if self.nodes[parent].left == node {
                self.nodes[parent].left = pivot;
            } else {
                self.nodes[parent].right = pivot;
            }
        } else {
            self.root = pivot;
        }
        let middle = self.nodes[pivot].right;
        self.nodes[node].left = middle;
        if middle != NIL {
            self.nodes[middle].parent = node;
        }
        self.nodes[node].parent = pivot;
        self.nodes[pivot].right = node;
    }

    /// NIL leaves count as black.
    fn color(&self, node: usize) -> Color {
        if node == NIL {
            Color::Black
        } else {
            self.nodes[node].color
        }
    }

    fn sibling(&self, node: usize) -> usize {
        let parent = self.nodes[node].parent;
        if parent == NIL {
            return NIL;
        }
        if self.nodes[parent].left == node {
            self.nodes[parent].right
        } else {
            self.nodes[parent].left
        }
    }

    fn is_left_inner_grandchild(&self, node: usize, grandparent: usize) -> bool {
        let left = self.nodes[grandparent].left;
        left != NIL && self.nodes[left].right == node
    }

    fn is_right_inner_grandchild(&self, node: usize, grandparent: usize) -> bool {
        let right = self.nodes[grandparent].right;
        right != NIL && self.nodes[right].left == node
    }

    fn post_order<F>(&self, node: usize, visit: &mut F)
    where
        F: FnMut(&K, &V),
    {
        if node == NIL {
            return;
        }
        self.post_order(self.nodes[node].left, visit);
        self.post_order(self.nodes[node].right, visit);
        visit(&self.nodes[node].key, &self.nodes[node].value);
    }

    fn in_order<F>(&self, node: usize, visit: &mut F)
    where
        F: FnMut(&K, &V),
    {
        if node == NIL {
            return;
        }
        self.in_order(self.nodes[node].left, visit);
        visit(&self.nodes[node].key, &self.nodes[node].value);
        self.in_order(self.nodes[node].right, visit);
    }
}

impl<K: Copy + Ord, V: Copy> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{seq::SliceRandom, SeedableRng};

    /// Checks the red-black conditions plus BST order and parent-link
    /// consistency; returns the black-height.
    fn check_invariants<K: Copy + Ord, V: Copy>(tree: &RbTree<K, V>) -> usize {
        if tree.root == NIL {
            return 0;
        }
        assert_eq!(
            tree.nodes[tree.root].color,
            Color::Black,
            "root must be black"
        );
        assert_eq!(tree.nodes[tree.root].parent, NIL);
        check_subtree(tree, tree.root)
    }

    fn check_subtree<K: Copy + Ord, V: Copy>(tree: &RbTree<K, V>, node: usize) -> usize {
        if node == NIL {
            return 1;
        }
        let left = tree.nodes[node].left;
        let right = tree.nodes[node].right;
        if tree.nodes[node].color == Color::Red {
            assert_eq!(tree.color(left), Color::Black, "red node with red child");
            assert_eq!(tree.color(right), Color::Black, "red node with red child");
        }
        if left != NIL {
            assert!(tree.nodes[left].key <= tree.nodes[node].key);
            assert_eq!(tree.nodes[left].parent, node, "broken parent link");
        }
        if right != NIL {
            assert!(tree.nodes[right].key >= tree.nodes[node].key);
            assert_eq!(tree.nodes[right].parent, node, "broken parent link");
        }
        let left_height = check_subtree(tree, left);
        let right_height = check_subtree(tree, right);
        assert_eq!(left_height, right_height, "unequal black-heights");
        left_height
            + if tree.nodes[node].color == Color::Black {
                1
            } else {
                0
            }
    }

    fn keys_in_order<K: Copy + Ord, V: Copy>(tree: &RbTree<K, V>) -> Vec<K> {
        let mut keys = Vec::new();
        tree.traverse_in_order(|&k, _| keys.push(k));
        keys
    }

    #[test]
    fn test_insert_ascending() {
        let mut tree = RbTree::new();
        for key in 0u32..64 {
            tree.insert(key, key as usize);
            check_invariants(&tree);
        }
        assert_eq!(tree.len(), 64);
        assert_eq!(keys_in_order(&tree), (0u32..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_descending() {
        let mut tree = RbTree::new();
        for key in (0u32..64).rev() {
            tree.insert(key, key as usize);
            check_invariants(&tree);
        }
        assert_eq!(keys_in_order(&tree), (0u32..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_shuffled() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut keys: Vec<u32> = (0..256).collect();
        keys.shuffle(&mut rng);

        let mut tree = RbTree::new();
        for &key in &keys {
            tree.insert(key, key as usize * 2);
            check_invariants(&tree);
        }
        assert_eq!(keys_in_order(&tree), (0u32..256).collect::<Vec<_>>());
    }

    #[test]
    fn test_find() {
        let mut tree = RbTree::new();
        for key in [17u32, 3, 99, 40, 8] {
            tree.insert(key, key as usize + 1);
        }
        assert_eq!(tree.find(&40), Some(&41));
        assert_eq!(tree.find(&99), Some(&100));
        assert!(tree.find(&41).is_none());
        assert!(tree.contains(&3));
        assert!(!tree.contains(&4));
    }

    #[test]
    fn test_remove_all_shuffled() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut keys: Vec<u32> = (0..128).collect();
        keys.shuffle(&mut rng);

        let mut tree = RbTree::new();
        for &key in &keys {
            tree.insert(key, key as usize);
        }

        keys.shuffle(&mut rng);
        for (i, &key) in keys.iter().enumerate() {
            assert_eq!(tree.remove(&key), Some(key as usize));
            assert!(!tree.contains(&key));
            assert_eq!(tree.len(), 128 - i - 1);
            check_invariants(&tree);
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut tree = RbTree::new();
        tree.insert(1u32, 'a');
        assert_eq!(tree.remove(&2), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_reuses_slots() {
        let mut tree = RbTree::new();
        for key in 0u32..16 {
            tree.insert(key, key);
        }
        for key in 0u32..8 {
            tree.remove(&key);
        }
        let slots = tree.nodes.len();
        for key in 100u32..108 {
            tree.insert(key, key);
        }
        assert_eq!(tree.nodes.len(), slots, "freed slots were not reused");
        check_invariants(&tree);
    }

    #[test]
    fn test_post_order_visits_children_first() {
        let mut tree = RbTree::new();
        for key in [50u32, 25, 75, 12, 37, 62, 87] {
            tree.insert(key, ());
        }
        let mut order = Vec::new();
        tree.traverse_post_order(|&k, _| order.push(k));
        assert_eq!(order.len(), 7);

        // Every node must appear after everything in its subtrees.
        let position = |key: u32| order.iter().position(|&k| k == key).unwrap();
        let check = |node: usize| {
            let left = tree.nodes[node].left;
            let right = tree.nodes[node].right;
            if left != NIL {
                assert!(position(tree.nodes[left].key) < position(tree.nodes[node].key));
            }
            if right != NIL {
                assert!(position(tree.nodes[right].key) < position(tree.nodes[node].key));
            }
        };
        for node in 0..tree.nodes.len() {
            check(node);
        }
        assert_eq!(*order.last().unwrap(), tree.nodes[tree.root].key);
    }

    #[test]
    fn test_clear() {
        let mut tree = RbTree::new();
        for key in 0u32..10 {
            tree.insert(key, key);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.find(&5).is_none());
        tree.insert(5, 5);
        assert_eq!(tree.len(), 1);
        check_invariants(&tree);
    }
}

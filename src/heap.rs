use std::fmt;

/// A `(key, data)` pair stored in the heap. Ordering is by `key` only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapItem<K, D> {
    pub key: K,
    pub data: D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    Empty,
    BadIndex,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::Empty => write!(f, "operation on empty heap"),
            HeapError::BadIndex => write!(f, "heap index out of bounds"),
        }
    }
}

impl std::error::Error for HeapError {}

/// Binary min-heap over a dense array.
///
/// Capacity is tracked in ranks (tree levels): growing adds one rank,
/// shrinking removes one rank only once occupancy falls to
/// `2^(rank-1) - 1` or below, so alternating insert/remove near a rank
/// boundary does not reallocate. `min_rank` is the floor below which the
/// heap never contracts.
pub struct MinHeap<K, D> {
    items: Vec<HeapItem<K, D>>,
    rank: u32,
    min_rank: u32,
}

fn parent(i: usize) -> usize {
    (i - 1) / 2
}

fn left(i: usize) -> usize {
    2 * i + 1
}

fn right(i: usize) -> usize {
    2 * i + 2
}

/// Number of storable items at a given rank: `2^(rank+1) - 1`.
fn max_items(rank: u32) -> usize {
    (1usize << (rank + 1)) - 1
}

impl<K: PartialOrd, D> MinHeap<K, D> {
    pub fn new() -> Self {
        Self::with_min_rank(0)
    }

    /// A heap that pre-allocates `min_rank` levels and never contracts
    /// below them.
    pub fn with_min_rank(min_rank: u32) -> Self {
        MinHeap {
            items: Vec::with_capacity(max_items(min_rank)),
            rank: min_rank,
            min_rank,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn peek_min(&self) -> Option<&HeapItem<K, D>> {
        self.items.first()
    }

    pub fn get(&self, i: usize) -> Option<&HeapItem<K, D>> {
        self.items.get(i)
    }

    pub fn insert(&mut self, key: K, data: D) {
        debug_assert!(self.is_min_heap(), "insert: heap condition not met");
        if self.items.len() == max_items(self.rank) {
            self.rank += 1;
            self.items.reserve_exact(max_items(self.rank) - self.items.len());
        }
        self.items.push(HeapItem { key, data });
        self.sift_up(self.items.len() - 1);
    }

    pub fn pop_min(&mut self) -> Result<HeapItem<K, D>, HeapError> {
        if self.items.is_empty() {
            return Err(HeapError::Empty);
        }
        self.remove_at(0)
    }

    /// Removes the item at index `i`, restoring the heap condition.
    ///
    /// The removed slot is filled by the last item; whether that item must
    /// sift up or down depends on how it compares to its new parent.
    pub fn remove_at(&mut self, i: usize) -> Result<HeapItem<K, D>, HeapError> {
        if i >= self.items.len() {
            return Err(HeapError::BadIndex);
        }
        debug_assert!(self.is_min_heap(), "remove_at: heap condition not met");

        let last = self.items.len() - 1;
        let removed = self.items.swap_remove(i);
        self.contract();
        if i != last {
            if i == 0 || self.items[i].key > self.items[parent(i)].key {
                self.sift_down(i);
            } else {
                self.sift_up(i);
            }
        }
        Ok(removed)
    }

    pub fn increase_key(&mut self, i: usize, new_key: K) -> Result<(), HeapError> {
        if i >= self.items.len() {
            return Err(HeapError::BadIndex);
        }
        debug_assert!(self.is_min_heap(), "increase_key: heap condition not met");
        if new_key > self.items[i].key {
            self.items[i].key = new_key;
            self.sift_down(i);
        }
        Ok(())
    }

    pub fn decrease_key(&mut self, i: usize, new_key: K) -> Result<(), HeapError> {
        if i >= self.items.len() {
            return Err(HeapError::BadIndex);
        }
        debug_assert!(self.is_min_heap(), "decrease_key: heap condition not met");
        if new_key < self.items[i].key {
            self.items[i].key = new_key;
            self.sift_up(i);
        }
        Ok(())
    }

    /// Re-keys the item at `i`, sifting in the direction the comparison
    /// with the old key dictates. Equal keys leave the heap untouched.
    pub fn change_key(&mut self, i: usize, new_key: K) -> Result<(), HeapError> {
        if i >= self.items.len() {
            return Err(HeapError::BadIndex);
        }
        debug_assert!(self.is_min_heap(), "change_key: heap condition not met");
        if new_key > self.items[i].key {
            self.increase_key(i, new_key)
        } else {
            self.decrease_key(i, new_key)
        }
    }

    /// Linear search for the first item matching `pred`. O(n).
    pub fn find_by<F>(&self, pred: F) -> Option<usize>
    where
        F: Fn(&HeapItem<K, D>) -> bool,
    {
        self.items.iter().position(pred)
    }

    fn contract(&mut self) {
        if self.rank <= self.min_rank {
            return;
        }
        if self.items.len() <= (1usize << (self.rank - 1)) - 1 {
            self.rank -= 1;
            self.items.shrink_to(max_items(self.rank));
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 && self.items[i].key < self.items[parent(i)].key {
            self.items.swap(i, parent(i));
            i = parent(i);
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let mut min = i;
            if left(i) < self.items.len() && self.items[left(i)].key < self.items[min].key {
                min = left(i);
            }
            if right(i) < self.items.len() && self.items[right(i)].key < self.items[min].key {
                min = right(i);
            }
            if min == i {
                return;
            }
            self.items.swap(i, min);
            i = min;
        }
    }

    /// Every parent key must compare `<=` against both children.
    fn is_min_heap(&self) -> bool {
        (1..self.items.len()).all(|i| !(self.items[i].key < self.items[parent(i)].key))
    }
}

impl<K: PartialOrd, D> Default for MinHeap<K, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_insert_pop_sorted() {
        let mut heap = MinHeap::new();
        for key in [5.0f32, 1.0, 4.0, 2.0, 3.0, 0.5] {
            heap.insert(key, (key * 10.0) as u32);
        }
        let mut popped = Vec::new();
        while let Ok(item) = heap.pop_min() {
            popped.push(item.key);
        }
        assert_eq!(popped, vec![0.5, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut heap: MinHeap<f32, u32> = MinHeap::new();
        assert_eq!(heap.pop_min().unwrap_err(), HeapError::Empty);
    }

    #[test]
    fn test_remove_at_out_of_bounds() {
        let mut heap = MinHeap::new();
        heap.insert(1.0f32, 0u32);
        assert_eq!(heap.remove_at(3).unwrap_err(), HeapError::BadIndex);
    }

    #[test]
    fn test_remove_at_keeps_heap_condition() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut heap = MinHeap::new();
        for i in 0..100u32 {
            heap.insert(rng.gen_range(0.0f32..100.0), i);
        }
        while !heap.is_empty() {
            let i = rng.gen_range(0..heap.len());
            heap.remove_at(i).unwrap();
            assert!(heap.is_min_heap());
        }
    }

    #[test]
    fn test_change_key_both_directions() {
        let mut heap = MinHeap::new();
        for (key, data) in [(10.0f32, 'a'), (20.0, 'b'), (30.0, 'c'), (40.0, 'd')] {
            heap.insert(key, data);
        }

        // Lower 'd' below everything, it must surface as the minimum.
        let i = heap.find_by(|item| item.data == 'd').unwrap();
        heap.change_key(i, 1.0).unwrap();
        assert!(heap.is_min_heap());
        assert_eq!(heap.peek_min().unwrap().data, 'd');

        // Raise it back past everything.
        let i = heap.find_by(|item| item.data == 'd').unwrap();
        heap.change_key(i, 99.0).unwrap();
        assert!(heap.is_min_heap());
        assert_eq!(heap.peek_min().unwrap().data, 'a');
    }

    #[test]
    fn test_change_key_equal_is_noop() {
        let mut heap = MinHeap::new();
        heap.insert(1.0f32, 'a');
        heap.insert(2.0, 'b');
        heap.insert(2.0, 'c');
        let i = heap.find_by(|item| item.data == 'b').unwrap();
        heap.change_key(i, 2.0).unwrap();
        assert_eq!(heap.get(i).unwrap().data, 'b');
        assert!(heap.is_min_heap());
    }

    #[test]
    fn test_find_by_payload() {
        let mut heap = MinHeap::new();
        for i in 0..10u32 {
            heap.insert(i as f32, i * 7);
        }
        let i = heap.find_by(|item| item.data == 42).unwrap();
        assert_eq!(heap.get(i).unwrap().data, 42);
        assert!(heap.find_by(|item| item.data == 1000).is_none());
    }

    #[test]
    fn test_rank_grows_and_contracts() {
        let mut heap = MinHeap::with_min_rank(2);
        assert_eq!(heap.rank, 2);
        for i in 0..100u32 {
            heap.insert(i as f32, i);
        }
        // 100 items need rank 6 (2^7 - 1 = 127 slots).
        assert_eq!(heap.rank, 6);
        while heap.len() > 1 {
            heap.pop_min().unwrap();
        }
        // Contraction stops at the configured floor.
        assert_eq!(heap.rank, 2);
    }

    #[test]
    fn test_contraction_is_lazy() {
        let mut heap = MinHeap::new();
        for i in 0..max_items(3) as u32 {
            heap.insert(i as f32, i);
        }
        assert_eq!(heap.rank, 3);
        // Dropping just below the rank-3 boundary must not shrink yet.
        heap.pop_min().unwrap();
        assert_eq!(heap.rank, 3);
        // Only at 2^(rank-1) - 1 items does one rank go away.
        while heap.len() > (1 << 2) - 1 {
            heap.pop_min().unwrap();
        }
        assert_eq!(heap.rank, 2);
        // Draining the rest walks the remaining ranks down to the floor.
        heap.pop_min().unwrap();
        assert_eq!(heap.rank, 2);
        heap.pop_min().unwrap();
        assert_eq!(heap.rank, 1);
        heap.pop_min().unwrap();
        assert_eq!(heap.rank, 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_random_ops_keep_heap_condition() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut heap = MinHeap::new();
        for step in 0..500u32 {
            if heap.is_empty() || rng.gen_bool(0.6) {
                heap.insert(rng.gen_range(0.0f32..50.0), step);
            } else if rng.gen_bool(0.5) {
                heap.pop_min().unwrap();
            } else {
                let i = rng.gen_range(0..heap.len());
                heap.change_key(i, rng.gen_range(0.0f32..50.0)).unwrap();
            }
            assert!(heap.is_min_heap());
        }
    }
}

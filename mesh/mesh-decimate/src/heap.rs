//! Indexed binary min-heap.
//!
//! A priority queue over `u32` item ids keyed by `f64` cost, with an explicit
//! item-to-slot map so an item's cost can be updated or the item removed
//! while it is queued. This keeps heap bookkeeping out of the domain records
//! that it prioritizes.

/// Sentinel slot for items not currently in the heap.
const SLOT_NONE: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    item: u32,
    cost: f64,
}

/// A binary min-heap with an item-to-slot index.
#[derive(Debug, Default)]
pub struct IndexedMinHeap {
    entries: Vec<HeapEntry>,
    /// `slots[item]` is the heap slot currently holding `item`.
    slots: Vec<usize>,
}

impl IndexedMinHeap {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `item` is currently queued.
    #[must_use]
    pub fn contains(&self, item: u32) -> bool {
        self.slots.get(item as usize).copied().unwrap_or(SLOT_NONE) != SLOT_NONE
    }

    /// Queue an item with the given cost.
    ///
    /// If the item is already queued this is equivalent to
    /// [`IndexedMinHeap::update`].
    pub fn push(&mut self, item: u32, cost: f64) {
        if self.contains(item) {
            self.update(item, cost);
            return;
        }
        if self.slots.len() <= item as usize {
            self.slots.resize(item as usize + 1, SLOT_NONE);
        }
        let slot = self.entries.len();
        self.entries.push(HeapEntry { item, cost });
        self.slots[item as usize] = slot;
        self.sift_up(slot);
    }

    /// Pop the cheapest item, or `None` if the heap is empty.
    pub fn pop(&mut self) -> Option<(u32, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let top = self.entries[0];
        self.slots[top.item as usize] = SLOT_NONE;
        let last = self.entries.len() - 1;
        if last > 0 {
            self.entries.swap(0, last);
            self.entries.pop();
            self.slots[self.entries[0].item as usize] = 0;
            self.sift_down(0);
        } else {
            self.entries.pop();
        }
        Some((top.item, top.cost))
    }

    /// Change the cost of a queued item, restoring heap order.
    ///
    /// Queues the item if it is not present.
    pub fn update(&mut self, item: u32, cost: f64) {
        let slot = self.slots.get(item as usize).copied().unwrap_or(SLOT_NONE);
        if slot == SLOT_NONE {
            self.push(item, cost);
            return;
        }
        let old = self.entries[slot].cost;
        self.entries[slot].cost = cost;
        if cost < old {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
    }

    /// Remove a queued item. Returns `false` if it was not queued.
    pub fn remove(&mut self, item: u32) -> bool {
        let slot = self.slots.get(item as usize).copied().unwrap_or(SLOT_NONE);
        if slot == SLOT_NONE {
            return false;
        }
        self.slots[item as usize] = SLOT_NONE;
        let last = self.entries.len() - 1;
        if slot < last {
            self.entries.swap(slot, last);
            self.entries.pop();
            self.slots[self.entries[slot].item as usize] = slot;
            // The moved entry may need to go either way.
            self.sift_up(slot);
            self.sift_down(slot);
        } else {
            self.entries.pop();
        }
        true
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].cost >= self.entries[parent].cost {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            if left >= self.entries.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < self.entries.len() && self.entries[right].cost < self.entries[left].cost {
                smallest = right;
            }
            if self.entries[slot].cost <= self.entries[smallest].cost {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].item as usize] = a;
        self.slots[self.entries[b].item as usize] = b;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_in_cost_order() {
        let mut heap = IndexedMinHeap::new();
        heap.push(0, 3.0);
        heap.push(1, 1.0);
        heap.push(2, 2.0);

        assert_eq!(heap.pop(), Some((1, 1.0)));
        assert_eq!(heap.pop(), Some((2, 2.0)));
        assert_eq!(heap.pop(), Some((0, 3.0)));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_update_reorders() {
        let mut heap = IndexedMinHeap::new();
        heap.push(0, 1.0);
        heap.push(1, 2.0);
        heap.push(2, 3.0);

        heap.update(2, 0.5);
        heap.update(0, 10.0);

        assert_eq!(heap.pop(), Some((2, 0.5)));
        assert_eq!(heap.pop(), Some((1, 2.0)));
        assert_eq!(heap.pop(), Some((0, 10.0)));
    }

    #[test]
    fn test_remove() {
        let mut heap = IndexedMinHeap::new();
        heap.push(0, 1.0);
        heap.push(1, 2.0);
        heap.push(2, 3.0);

        assert!(heap.remove(1));
        assert!(!heap.remove(1));
        assert!(!heap.contains(1));

        assert_eq!(heap.pop(), Some((0, 1.0)));
        assert_eq!(heap.pop(), Some((2, 3.0)));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_push_existing_updates() {
        let mut heap = IndexedMinHeap::new();
        heap.push(5, 4.0);
        heap.push(5, 1.0);
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.pop(), Some((5, 1.0)));
    }

    #[test]
    fn test_many_items_sorted() {
        let mut heap = IndexedMinHeap::new();
        for i in 0..100_u32 {
            // Scatter the costs.
            heap.push(i, f64::from((i * 37) % 100));
        }
        let mut last = f64::NEG_INFINITY;
        while let Some((_, cost)) = heap.pop() {
            assert!(cost >= last);
            last = cost;
        }
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of list identities, so a handle can only resolve in the list that
/// produced it.
static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(0);

/// Stable reference to a node of a [`List`].
///
/// A handle stays valid until its node is removed, no matter how many other
/// nodes are inserted or removed around it. Once the node is gone the handle
/// is stale: the slot's generation has moved on, so the handle never resolves
/// to whatever node reuses that slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    list: u64,
    slot: usize,
    generation: u64,
}

/// Link to the next node, or the end of the list.
pub(crate) type Link = Option<Handle>;

pub(crate) struct Node<T> {
    /// Next node of the list
    pub next: Link,
    /// Element of the node
    pub data: T,
}

enum Slot<T> {
    Occupied(Node<T>),
    /// Free slot, chained to the next free slot.
    Vacant(Option<usize>),
}

struct Entry<T> {
    generation: u64,
    slot: Slot<T>,
}

/// Singly-linked list whose nodes live in a slot arena.
///
/// ```text
///  head                                      tail
///   |                                         |
///   v                                         v
/// +------+    +------+    +------+    +------+
/// | data | -> | data | -> | data | -> | data | -> None
/// +------+    +------+    +------+    +------+
///  slot 3      slot 0      slot 2      slot 1
/// ```
///
/// List order is given by the `next` links, never by slot position. Slots of
/// removed nodes are recycled for later insertions.
///
/// First and last nodes are cached, so pushing at either end is O(1). Anything
/// positional walks the chain from the head.
pub struct List<T> {
    id: u64,
    entries: Vec<Entry<T>>,
    /// First vacant slot in `entries`.
    vacant: Option<usize>,
    head: Link,
    tail: Link,
    len: usize,
}

pub struct Iter<'a, T> {
    list: &'a List<T>,
    current: Link,
    remaining: usize,
}

pub struct Handles<'a, T> {
    list: &'a List<T>,
    current: Link,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            vacant: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn first(&self) -> Link {
        self.head
    }

    #[inline]
    pub fn last(&self) -> Link {
        self.tail
    }

    /// Whether `handle` refers to a live node of this list.
    pub fn contains(&self, handle: Handle) -> bool {
        self.node(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle).map(|node| &node.data)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.node_mut(handle).map(|node| &mut node.data)
    }

    /// The node following `handle`, if `handle` is live and not the tail.
    pub fn next(&self, handle: Handle) -> Link {
        self.node(handle).and_then(|node| node.next)
    }

    /// Handle of the node at position `index`. Walks the chain.
    pub fn handle_at(&self, index: usize) -> Link {
        if index >= self.len {
            return None;
        }
        self.handles().nth(index)
    }

    /// Inserts `data` as the new head of the list.
    pub fn push_front(&mut self, data: T) -> Handle {
        let handle = self.occupy(Node {
            next: self.head,
            data,
        });

        if self.tail.is_none() {
            self.tail = Some(handle);
        }
        self.head = Some(handle);
        self.len += 1;

        handle
    }

    /// Appends `data` as the new tail of the list.
    pub fn push_back(&mut self, data: T) -> Handle {
        let handle = self.occupy(Node { next: None, data });

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(handle);
                }
            }
            None => self.head = Some(handle),
        }

        self.tail = Some(handle);
        self.len += 1;

        handle
    }

    /// Inserts `data` right after the node referenced by `at`.
    ///
    /// Returns `None`, dropping `data`, if `at` is not a live node of this list.
    pub fn insert_after(&mut self, at: Handle, data: T) -> Option<Handle> {
        let next = self.node(at)?.next;
        let handle = self.occupy(Node { next, data });

        if let Some(node) = self.node_mut(at) {
            node.next = Some(handle);
        }
        if self.tail == Some(at) {
            self.tail = Some(handle);
        }
        self.len += 1;

        Some(handle)
    }

    /// Unlinks the node referenced by `handle` and returns its data.
    ///
    /// Every other handle stays valid. Returns `None` and leaves the list
    /// untouched when `handle` is not a live node of this list.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let next = self.node(handle)?.next;

        if self.head == Some(handle) {
            self.head = next;
            if next.is_none() {
                self.tail = None;
            }
        } else {
            // Singly linked: the predecessor has to be found from the head.
            let prev = self.handles().find(|h| self.next(*h) == Some(handle))?;

            if let Some(node) = self.node_mut(prev) {
                node.next = next;
            }
            if self.tail == Some(handle) {
                self.tail = Some(prev);
            }
        }

        self.len -= 1;
        self.vacate(handle.slot)
    }

    /// Removes every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        for slot in 0..self.entries.len() {
            if matches!(self.entries[slot].slot, Slot::Occupied(_)) {
                self.vacate(slot);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len,
        }
    }

    /// Iterates over the handles of the list, in list order.
    pub fn handles(&self) -> Handles<'_, T> {
        Handles {
            list: self,
            current: self.head,
        }
    }

    fn node(&self, handle: Handle) -> Option<&Node<T>> {
        if handle.list != self.id {
            return None;
        }
        match self.entries.get(handle.slot) {
            Some(Entry {
                generation,
                slot: Slot::Occupied(node),
            }) if *generation == handle.generation => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, handle: Handle) -> Option<&mut Node<T>> {
        if handle.list != self.id {
            return None;
        }
        match self.entries.get_mut(handle.slot) {
            Some(Entry {
                generation,
                slot: Slot::Occupied(node),
            }) if *generation == handle.generation => Some(node),
            _ => None,
        }
    }

    /// Stores `node` in a free slot, reusing a vacant one when possible.
    fn occupy(&mut self, node: Node<T>) -> Handle {
        let slot = match self.vacant {
            Some(slot) => {
                let entry = &mut self.entries[slot];
                if let Slot::Vacant(next_vacant) = entry.slot {
                    self.vacant = next_vacant;
                }
                entry.slot = Slot::Occupied(node);
                slot
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    slot: Slot::Occupied(node),
                });
                self.entries.len() - 1
            }
        };

        Handle {
            list: self.id,
            slot,
            generation: self.entries[slot].generation,
        }
    }

    /// Frees `slot` and bumps its generation. Does not touch any links.
    fn vacate(&mut self, slot: usize) -> Option<T> {
        let entry = &mut self.entries[slot];
        let previous = std::mem::replace(&mut entry.slot, Slot::Vacant(self.vacant));
        entry.generation += 1;
        self.vacant = Some(slot);

        match previous {
            Slot::Occupied(node) => Some(node.data),
            Slot::Vacant(_) => None,
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.current?)?;

        self.current = node.next;
        self.remaining -= 1;

        Some(&node.data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> Iterator for Handles<'a, T> {
    type Item = Handle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.current?;
        self.current = self.list.next(handle);

        Some(handle)
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &List<u8>) -> Vec<u8> {
        list.iter().copied().collect()
    }

    #[test]
    fn new_list_is_empty() {
        let list: List<u8> = List::new();

        assert_eq!(list.len, 0);
        assert!(list.is_empty());
        assert!(list.first().is_none() && list.last().is_none());
        assert!(list.iter().next().is_none());
    }

    #[test]
    fn push_at_both_ends() {
        let mut list = List::new();
        list.push_back(2);
        list.push_back(3);
        list.push_front(1);

        assert_eq!(collect(&list), vec![1, 2, 3]);
        assert_eq!(list.get(list.first().unwrap()), Some(&1));
        assert_eq!(list.get(list.last().unwrap()), Some(&3));
        assert_eq!(list.iter().size_hint(), (3, Some(3)));
    }

    #[test]
    fn insert_after_tail_moves_tail() {
        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.insert_after(a, 2).unwrap();
        list.insert_after(a, 9).unwrap();

        assert_eq!(collect(&list), vec![1, 9, 2]);
        assert_eq!(list.last(), Some(b));
    }

    #[test]
    fn remove_keeps_other_handles_valid() {
        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.remove(b), Some(2));
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.get(c), Some(&3));
        assert_eq!(list.len(), 2);

        assert_eq!(list.remove(c), Some(3));
        assert_eq!(list.last(), Some(a));

        assert_eq!(list.remove(a), Some(1));
        assert!(list.is_empty());
        assert!(list.first().is_none() && list.last().is_none());
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut list = List::new();
        let a = list.push_back(1);
        list.remove(a);
        let b = list.push_back(2);

        assert_ne!(a, b);
        assert!(!list.contains(a));
        assert_eq!(list.remove(a), None);
        assert_eq!(collect(&list), vec![2]);
    }

    #[test]
    fn foreign_handle_is_ignored() {
        let mut one = List::new();
        let mut other = List::new();
        let a = one.push_back(1);
        other.push_back(1);

        assert_eq!(other.remove(a), None);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn handle_at_walks_list_order() {
        let mut list = List::new();
        list.push_back(10);
        list.push_front(5);
        list.push_back(20);

        let h = list.handle_at(1).unwrap();
        assert_eq!(list.get(h), Some(&10));
        assert!(list.handle_at(3).is_none());
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut list = List::new();
        let a = list.push_back(1);
        list.push_back(2);
        list.clear();

        assert!(list.is_empty());
        assert!(!list.contains(a));
        list.push_back(3);
        assert_eq!(collect(&list), vec![3]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_matches_vec_model(ops in prop::collection::vec((0u8..3, 0usize..16), 1..64)) {
            let mut list = List::new();
            let mut model: Vec<usize> = Vec::new();

            for (i, (op, pos)) in ops.into_iter().enumerate() {
                match op {
                    0 => {
                        list.push_back(i);
                        model.push(i);
                    }
                    1 => {
                        list.push_front(i);
                        model.insert(0, i);
                    }
                    _ if !model.is_empty() => {
                        let index = pos % model.len();
                        let handle = list.handle_at(index).unwrap();
                        prop_assert_eq!(list.remove(handle), Some(model.remove(index)));
                    }
                    _ => {}
                }

                prop_assert_eq!(list.len(), model.len());
                prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model.clone());
                prop_assert_eq!(list.last().and_then(|h| list.get(h)), model.last());
            }
        }
    }
}

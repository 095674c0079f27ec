use std::fmt;

use tracing::trace;

use crate::{
    error::{Error, Result},
    list::{Handle, Iter, List},
    range::Range,
};

/// Ordered sequence of [`Range`] values.
///
/// This is what both the free list and the allocated list of a
/// [`crate::MemorySpace`] are made of. The list keeps ranges in the order
/// callers put them; it never sorts or merges on its own.
///
/// ```text
///   first                                        last
///     |                                            |
///     v                                            v
/// +--------+     +--------+     +--------+     +--------+
/// | (5,15) | --> | (0,5)  | --> | (40,2) | --> | (20,8) |
/// +--------+     +--------+     +--------+     +--------+
/// ```
///
/// Positional operations walk the list from the front. Prepending and
/// appending are O(1). Every node can also be reached through a [`Handle`],
/// which survives the removal of any other node, so a caller can walk the
/// list and drop entries as it goes.
#[derive(Default)]
pub struct RangeList {
    items: List<Range>,
}

impl RangeList {
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self { items: List::new() }
    }

    /// Number of ranges in the list.
    #[inline]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Alias of [`RangeList::size`], paired with [`RangeList::is_empty`].
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first range, or `None` when the list is empty.
    pub fn first(&self) -> Option<Range> {
        self.items.first().and_then(|h| self.get(h))
    }

    /// The last range, or `None` when the list is empty.
    pub fn last(&self) -> Option<Range> {
        self.items.last().and_then(|h| self.get(h))
    }

    /// Handle of the node at `index`.
    ///
    /// `index` must be in `[0, size)`: the end position is a valid place to
    /// insert at, but there is nothing there to read.
    pub fn at(&self, index: usize) -> Result<Handle> {
        self.items
            .handle_at(index)
            .ok_or_else(|| Error::index_out_of_range(index, self.size()))
    }

    /// The range stored at `index`.
    pub fn range_at(&self, index: usize) -> Result<Range> {
        let handle = self.at(index)?;
        self.get(handle)
            .ok_or_else(|| Error::index_out_of_range(index, self.size()))
    }

    /// The range reached through `handle`, if it is still in this list.
    pub fn get(&self, handle: Handle) -> Option<Range> {
        self.items.get(handle).copied()
    }

    /// Whether `handle` still reaches a range of this list.
    pub fn contains(&self, handle: Handle) -> bool {
        self.items.contains(handle)
    }

    /// Handle of the node following `handle`.
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        self.items.next(handle)
    }

    /// Inserts `range` before position `index`.
    ///
    /// `0` prepends and `size()` appends, both in constant time. Anything in
    /// between walks to the insertion point.
    pub fn insert_at(&mut self, index: usize, range: Range) -> Result<()> {
        let size = self.size();
        if index > size {
            return Err(Error::InvalidArgument(format!(
                "index {index} must be between 0 and {size}"
            )));
        }

        if index == 0 {
            self.append_first(range);
        } else if index == size {
            self.append_last(range);
        } else {
            let prev = self.at(index - 1)?;
            self.items.insert_after(prev, range);
        }

        Ok(())
    }

    /// Prepends `range`. Constant time.
    pub fn append_first(&mut self, range: Range) -> Handle {
        self.items.push_front(range)
    }

    /// Appends `range`. Constant time.
    pub fn append_last(&mut self, range: Range) -> Handle {
        self.items.push_back(range)
    }

    /// Index of the first range equal to `range`.
    pub fn index_of_range(&self, range: &Range) -> Option<usize> {
        self.iter().position(|r| r == range)
    }

    /// Index of the first range starting at `address`.
    pub fn index_of_base(&self, address: usize) -> Option<usize> {
        self.iter().position(|r| r.base() == address)
    }

    /// Handle of the first range starting at `address`.
    pub fn find_base(&self, address: usize) -> Option<Handle> {
        self.items
            .handles()
            .find(|h| self.get(*h).is_some_and(|r| r.base() == address))
    }

    /// Handle of the first range, in list order, able to hold `length` words.
    pub fn find_first_fit(&self, length: usize) -> Option<Handle> {
        self.items
            .handles()
            .find(|h| self.get(*h).is_some_and(|r| r.length() >= length))
    }

    /// Replaces the range reached through `handle`, keeping its position.
    ///
    /// Returns the previous range, or `None` if `handle` is not in this list.
    pub fn replace(&mut self, handle: Handle, range: Range) -> Option<Range> {
        self.items
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, range))
    }

    /// Removes the range reached through `handle`.
    ///
    /// Does nothing if the handle is not a member of this list.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<Range> {
        let removed = self.items.remove(handle);
        if removed.is_none() {
            trace!(target: "memspace::list", ?handle, "handle not in list, ignoring");
        }
        removed
    }

    /// Removes the range at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<Range> {
        let handle = self.at(index)?;
        self.items
            .remove(handle)
            .ok_or_else(|| Error::index_out_of_range(index, self.size()))
    }

    /// Removes the first range equal to `range`.
    pub fn remove_range(&mut self, range: &Range) -> Result<()> {
        let handle = self
            .items
            .handles()
            .find(|h| self.get(*h).as_ref() == Some(range))
            .ok_or(Error::NotFound(*range))?;

        self.items.remove(handle);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of the lengths of every range in the list.
    pub fn total_length(&self) -> usize {
        self.iter().map(Range::length).sum()
    }

    /// The longest range; the earliest one wins a tie.
    pub fn largest(&self) -> Option<Range> {
        self.iter()
            .copied()
            .reduce(|best, r| if r.length() > best.length() { r } else { best })
    }

    pub fn iter(&self) -> Iter<'_, Range> {
        self.items.iter()
    }

    /// Handles of every node, in list order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.items.handles()
    }
}

impl<'a> IntoIterator for &'a RangeList {
    type Item = &'a Range;
    type IntoIter = Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Range> for RangeList {
    fn from_iter<I: IntoIterator<Item = Range>>(iter: I) -> Self {
        let mut list = RangeList::new();
        list.extend(iter);
        list
    }
}

impl Extend<Range> for RangeList {
    fn extend<I: IntoIterator<Item = Range>>(&mut self, iter: I) {
        for range in iter {
            self.append_last(range);
        }
    }
}

impl fmt::Display for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for range in self {
            write!(f, "{range} ")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

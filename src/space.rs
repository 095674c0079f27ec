use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    config::SpaceConfig,
    error::{Error, Result},
    range::Range,
    range_list::RangeList,
};

/// A simulated arena of `capacity` words with a first-fit allocator on top.
///
/// The space keeps two [`RangeList`]s. Together they cover the whole arena
/// without overlapping:
///
/// ```text
///             0                                            capacity
///             +------+-----------+------+------------------+
///   arena     | used |   free    | used |       free       |
///             +------+-----------+------+------------------+
///
///   free      -> (6 , 10) -> (20 , 12) ->
///   allocated -> (0 , 6)  -> (16 , 4)  ->
/// ```
///
/// [`MemorySpace::allocate`] takes words from the first free range that is
/// long enough. [`MemorySpace::release`] gives a range back by appending it to
/// the free list as is. Neither of them merges anything: fragmentation piles up
/// until [`MemorySpace::compact`] is called.
pub struct MemorySpace {
    /// Total number of words in the arena.
    capacity: usize,
    /// Ranges available for allocation.
    pub(crate) free: RangeList,
    /// Ranges handed out and not yet released.
    pub(crate) allocated: RangeList,
    /// Whether [`MemorySpace::allocate_with_policy`] compacts and retries.
    compact_on_failure: bool,
}

impl MemorySpace {
    /// Creates a space of `capacity` words, all of them free.
    pub fn new(capacity: usize) -> Result<Self> {
        let whole = Range::new(0, capacity).map_err(|_| {
            Error::InvalidArgument(format!("capacity must be greater than zero, got {capacity}"))
        })?;

        let mut free = RangeList::new();
        free.append_last(whole);

        debug!(target: "memspace::space", capacity, "memory space created");

        Ok(Self {
            capacity,
            free,
            allocated: RangeList::new(),
            compact_on_failure: false,
        })
    }

    /// Creates a space as described by `config`.
    pub fn from_config(config: &SpaceConfig) -> Result<Self> {
        config.validate()?;

        let mut space = Self::new(config.arena.capacity)?;
        space.compact_on_failure = config.policy.compact_on_failure;

        Ok(space)
    }

    /// Allocates `length` words and returns the base address of the block.
    ///
    /// The free list is scanned in list order and the first range holding at
    /// least `length` words is used (first-fit, not best-fit). The new block is
    /// appended to the allocated list. If the free range was an exact fit it is
    /// dropped, otherwise it shrinks in place to what is left after the block.
    ///
    /// Returns `Ok(None)` when no free range is long enough; nothing changes
    /// in that case. A zero `length` is an [`Error::InvalidArgument`].
    pub fn allocate(&mut self, length: usize) -> Result<Option<usize>> {
        if length == 0 {
            return Err(Error::InvalidArgument(
                "allocation length must be greater than zero".into(),
            ));
        }

        let Some(handle) = self.free.find_first_fit(length) else {
            debug!(
                target: "memspace::space",
                length,
                free_ranges = self.free.size(),
                "no free range large enough"
            );
            return Ok(None);
        };

        let candidate = self
            .free
            .get(handle)
            .ok_or_else(|| Error::Corrupted("first-fit handle vanished".into()))?;

        let (block, rest) = candidate.split_at(length);
        self.allocated.append_last(block);

        match rest {
            Some(rest) => {
                self.free.replace(handle, rest);
            }
            None => {
                self.free.remove_handle(handle);
            }
        }

        trace!(
            target: "memspace::space",
            base = block.base(),
            length,
            exact_fit = rest.is_none(),
            "allocated"
        );
        debug_assert!(self.check_invariants().is_ok());

        Ok(Some(block.base()))
    }

    /// Like [`MemorySpace::allocate`], but compacts the free list and tries
    /// once more when the first attempt finds no room.
    pub fn allocate_or_compact(&mut self, length: usize) -> Result<Option<usize>> {
        if let Some(address) = self.allocate(length)? {
            return Ok(Some(address));
        }

        let report = self.compact();
        if report.ranges_before == report.ranges_after {
            // Nothing merged, the retry would scan the same ranges.
            return Ok(None);
        }

        self.allocate(length)
    }

    /// Allocates following the configured failure policy.
    pub fn allocate_with_policy(&mut self, length: usize) -> Result<Option<usize>> {
        if self.compact_on_failure {
            self.allocate_or_compact(length)
        } else {
            self.allocate(length)
        }
    }

    /// Releases the block whose base address is `address`.
    ///
    /// The block moves, unchanged, to the end of the free list. It is not
    /// merged with its neighbours. Fails with [`Error::NotAllocated`] when no
    /// allocated block starts at `address`, leaving both lists untouched.
    pub fn release(&mut self, address: usize) -> Result<()> {
        let Some(handle) = self.allocated.find_base(address) else {
            warn!(target: "memspace::space", address, "release of unallocated address");
            return Err(Error::NotAllocated { address });
        };

        let block = self
            .allocated
            .remove_handle(handle)
            .ok_or(Error::NotAllocated { address })?;
        self.free.append_last(block);

        trace!(
            target: "memspace::space",
            base = block.base(),
            length = block.length(),
            "released"
        );
        debug_assert!(self.check_invariants().is_ok());

        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The free list, in list order.
    pub fn free_ranges(&self) -> &RangeList {
        &self.free
    }

    /// The allocated list, in list order.
    pub fn allocated_ranges(&self) -> &RangeList {
        &self.allocated
    }

    pub fn free_words(&self) -> usize {
        self.free.total_length()
    }

    pub fn allocated_words(&self) -> usize {
        self.allocated.total_length()
    }

    /// Length of the longest free range, `0` if nothing is free.
    pub fn largest_free(&self) -> usize {
        self.free.largest().map_or(0, |r| r.length())
    }

    /// Verifies the bookkeeping of the space.
    ///
    /// Checks that every range fits in the arena, that no two ranges overlap,
    /// that allocated bases are unique and that free and allocated words add up
    /// to the capacity.
    pub fn check_invariants(&self) -> Result<()> {
        let mut all: Vec<Range> = self.free.iter().chain(&self.allocated).copied().collect();

        if let Some(r) = all.iter().find(|r| r.end() > self.capacity) {
            return Err(Error::Corrupted(format!(
                "range {r} exceeds capacity {}",
                self.capacity
            )));
        }

        all.sort_by_key(Range::base);
        if let Some(pair) = all.windows(2).find(|w| w[0].overlaps(&w[1])) {
            return Err(Error::Corrupted(format!(
                "ranges {} and {} overlap",
                pair[0], pair[1]
            )));
        }

        // No overlap already rules out two allocated blocks at one base.
        let total: usize = all.iter().map(Range::length).sum();
        if total != self.capacity {
            return Err(Error::Corrupted(format!(
                "free and allocated words add up to {total}, expected {}",
                self.capacity
            )));
        }

        Ok(())
    }
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.free, self.allocated)
    }
}

impl fmt::Debug for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySpace")
            .field("capacity", &self.capacity)
            .field("free", &self.free)
            .field("allocated", &self.allocated)
            .finish()
    }
}

use tracing::debug;

use crate::{range::Range, range_list::RangeList, space::MemorySpace};

/// What a call to [`MemorySpace::compact`] did to the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionReport {
    /// Free ranges before compacting.
    pub ranges_before: usize,
    /// Free ranges after compacting.
    pub ranges_after: usize,
    /// Longest free range after compacting, `0` if nothing is free.
    pub largest_free: usize,
}

/// Sorts `ranges` by base address and merges every pair that touches.
///
/// Two ranges merge only when the second one starts exactly where the first
/// one ends. Ranges separated by a gap stay apart.
///
/// ```text
///  before:  (10,5) (0,5) (5,5) (30,2)
///  sorted:  (0,5) (5,5) (10,5) (30,2)
///  merged:  (0,15)            (30,2)
/// ```
pub fn coalesce(mut ranges: Vec<Range>) -> Vec<Range> {
    // Stable, so equal bases keep their relative order.
    ranges.sort_by_key(Range::base);

    let mut merged = Vec::with_capacity(ranges.len());
    let mut ranges = ranges.into_iter();

    let Some(mut candidate) = ranges.next() else {
        return merged;
    };

    for range in ranges {
        if candidate.touches(&range) {
            candidate.absorb(&range);
        } else {
            merged.push(candidate);
            candidate = range;
        }
    }
    merged.push(candidate);

    merged
}

impl MemorySpace {
    /// Defragments the free list.
    ///
    /// The free list is rebuilt sorted by address, with touching ranges merged
    /// into one. The allocated list is left alone. Compacting a list that is
    /// already sorted and merged changes nothing.
    pub fn compact(&mut self) -> CompactionReport {
        let ranges_before = self.free.size();

        if ranges_before > 0 {
            let merged = coalesce(self.free.iter().copied().collect());
            self.free = merged.into_iter().collect::<RangeList>();
        }

        let report = CompactionReport {
            ranges_before,
            ranges_after: self.free.size(),
            largest_free: self.largest_free(),
        };

        debug!(
            target: "memspace::compact",
            before = report.ranges_before,
            after = report.ranges_after,
            largest_free = report.largest_free,
            "free list compacted"
        );
        debug_assert!(self.check_invariants().is_ok());

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(base: usize, length: usize) -> Range {
        Range::new(base, length).unwrap()
    }

    fn contents(list: &RangeList) -> Vec<(usize, usize)> {
        list.iter().map(|r| (r.base(), r.length())).collect()
    }

    #[test]
    fn coalesce_empty() {
        assert!(coalesce(Vec::new()).is_empty());
    }

    #[test]
    fn coalesce_out_of_order_neighbours() {
        let merged = coalesce(vec![r(10, 5), r(0, 5), r(5, 5)]);

        assert_eq!(merged, vec![r(0, 15)]);
    }

    #[test]
    fn coalesce_keeps_gaps() {
        let merged = coalesce(vec![r(20, 2), r(0, 5), r(6, 4), r(10, 3)]);

        assert_eq!(merged, vec![r(0, 5), r(6, 7), r(20, 2)]);
    }

    #[test]
    fn compaction_merges_and_sorts() {
        let mut space = MemorySpace::new(20).unwrap();
        space.free.clear();
        space.free.extend([r(10, 5), r(0, 5), r(5, 5)]);
        space.free.append_last(r(15, 5));

        let report = space.compact();

        assert_eq!(contents(space.free_ranges()), vec![(0, 20)]);
        assert_eq!(
            report,
            CompactionReport {
                ranges_before: 4,
                ranges_after: 1,
                largest_free: 20,
            }
        );
    }

    #[test]
    fn compaction_of_fragmented_release_order() {
        let mut space = MemorySpace::new(20).unwrap();
        let a = space.allocate(5).unwrap().unwrap();
        let b = space.allocate(5).unwrap().unwrap();
        let c = space.allocate(5).unwrap().unwrap();
        space.release(c).unwrap();
        space.release(a).unwrap();

        assert_eq!(
            contents(space.free_ranges()),
            vec![(15, 5), (10, 5), (0, 5)]
        );

        space.compact();
        assert_eq!(contents(space.free_ranges()), vec![(0, 5), (10, 10)]);
        assert_eq!(contents(space.allocated_ranges()), vec![(b, 5)]);
    }

    #[test]
    fn compaction_is_idempotent() {
        let mut space = MemorySpace::new(20).unwrap();
        space.allocate(5).unwrap();
        space.release(0).unwrap();

        space.compact();
        let once = space.to_string();
        let report = space.compact();

        assert_eq!(space.to_string(), once);
        assert_eq!(report.ranges_before, report.ranges_after);
    }

    #[test]
    fn compaction_of_full_space_is_noop() {
        let mut space = MemorySpace::new(8).unwrap();
        space.allocate(8).unwrap();

        let report = space.compact();

        assert!(space.free_ranges().is_empty());
        assert_eq!(report.ranges_after, 0);
        assert_eq!(report.largest_free, 0);
    }
}

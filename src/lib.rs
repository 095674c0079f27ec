//! A simulated word-addressed memory arena with a first-fit allocator.
//!
//! Nothing here touches real memory. An arena of `capacity` words is split
//! into ranges `[base, base + length)` that sit either in the free list or in
//! the allocated list of a [`MemorySpace`]:
//!
//! ```text
//!   allocate(len)          release(addr)              compact()
//!   first free range  ---> block goes back to   --->  free list sorted by
//!   with >= len words      the end of the free        base, touching ranges
//!   is split               list, unmerged             merged
//! ```
//!
//! ```
//! use memspace::MemorySpace;
//!
//! let mut space = MemorySpace::new(20)?;
//! let a = space.allocate(5)?.expect("room for 5 words");
//! assert_eq!(a, 0);
//!
//! space.release(a)?;
//! assert_eq!(space.free_ranges().size(), 2);
//!
//! space.compact();
//! assert_eq!(space.free_ranges().size(), 1);
//! # Ok::<(), memspace::Error>(())
//! ```

mod compact;
mod config;
mod error;
mod list;
mod range;
mod range_list;
mod space;

pub mod logging;

pub use compact::{CompactionReport, coalesce};
pub use config::{ArenaConfig, PolicyConfig, SpaceConfig};
pub use error::{Error, Result};
pub use list::{Handle, Iter};
pub use range::Range;
pub use range_list::RangeList;
pub use space::MemorySpace;

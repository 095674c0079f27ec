use crate::range::Range;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the memory space and its range lists.
///
/// Running out of free space is not an error: [`crate::MemorySpace::allocate`]
/// returns `Ok(None)` in that case.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("address {address} is not allocated")]
    NotAllocated { address: usize },

    #[error("range {0} not found")]
    NotFound(Range),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("memory space corrupted: {0}")]
    Corrupted(String),
}

impl Error {
    pub(crate) fn index_out_of_range(index: usize, bound: usize) -> Self {
        Error::InvalidArgument(format!("index {index} must be less than {bound}"))
    }
}

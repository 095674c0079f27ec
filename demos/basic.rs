use memspace::{MemorySpace, logging};
use tracing::info;

fn log_alloc(space: &MemorySpace, length: usize, addr: Option<usize>) {
    match addr {
        Some(addr) => info!("Requested {length} words, received address {addr}"),
        None => info!("Requested {length} words, no free range is large enough"),
    }
    info!("State:\n{space}");
}

fn main() -> memspace::Result<()> {
    logging::init();

    let mut space = MemorySpace::new(100)?;

    let a1 = space.allocate(20)?;
    log_alloc(&space, 20, a1);

    let a2 = space.allocate(30)?;
    log_alloc(&space, 30, a2);

    let a3 = space.allocate(50)?;
    log_alloc(&space, 50, a3);

    // Free the first two blocks: they end up as two separate free ranges.
    for addr in [a2, a1].into_iter().flatten() {
        space.release(addr)?;
    }
    info!("After release:\n{space}");

    // 40 words do not fit in either fragment until they are merged.
    let big = space.allocate(40)?;
    log_alloc(&space, 40, big);

    let report = space.compact();
    info!(?report, "After compact:\n{space}");

    let big = space.allocate(40)?;
    log_alloc(&space, 40, big);

    if let Err(err) = space.release(7) {
        info!("Releasing 7 failed: {err}");
    }

    Ok(())
}

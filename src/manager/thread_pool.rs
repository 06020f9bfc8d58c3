//! Selects between [`RayonPlatform`] and [`SequentialPlatform`] per the
//! `THREAD` optimization flag and the configured thread count (§4.6,
//! §4.5.8).

use crate::config::OptFlags;
use crate::manager::platform::{Platform, RayonPlatform, SequentialPlatform};

/// Picks the platform a frame should run its parallel phases on.
///
/// `thread_count < 0` forces the sequential stub regardless of
/// `OptFlags::THREAD`, matching the source's debug override.
#[must_use]
pub fn select_platform(opts: OptFlags, thread_count: i64) -> Box<dyn Platform> {
    if thread_count < 0 || !opts.contains(OptFlags::THREAD) {
        Box::new(SequentialPlatform)
    } else {
        Box::new(RayonPlatform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_thread_count_forces_sequential() {
        let p = select_platform(OptFlags::THREAD, -1);
        assert_eq!(p.thread_count(), 1);
    }

    #[test]
    fn thread_flag_off_forces_sequential() {
        let p = select_platform(OptFlags::empty(), 8);
        assert_eq!(p.thread_count(), 1);
    }
}

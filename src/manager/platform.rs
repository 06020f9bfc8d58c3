//! The platform abstraction the scene manager is parameterized over
//! (§4.6): `init_threads`/`term_threads`/`update_scene`/`render_scene`
//! function pointers in the source become a small trait here, with a
//! rayon-backed implementation and a sequential stub for `thnum < 0`.

/// How the scene manager executes its parallel phases.
pub trait Platform: Send + Sync {
    /// Number of worker threads this platform will actually use.
    fn thread_count(&self) -> usize;

    /// Runs `f` over every item, in parallel if the platform supports it.
    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send;
}

/// Thread-pool-backed platform (`OptFlags::THREAD` on), grounded on the
/// teacher's `rayon`-based parallel iteration style.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonPlatform;

impl Platform for RayonPlatform {
    fn thread_count(&self) -> usize {
        rayon::current_num_threads()
    }

    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        use rayon::prelude::*;
        items.par_iter_mut().for_each(f);
    }
}

/// Single-threaded fallback (`thnum < 0`, §4.6), used for debugging and
/// for platforms without a thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPlatform;

impl Platform for SequentialPlatform {
    fn thread_count(&self) -> usize {
        1
    }

    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        items.iter_mut().for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_platform_reports_one_thread() {
        assert_eq!(SequentialPlatform.thread_count(), 1);
    }

    #[test]
    fn rayon_platform_applies_to_every_item() {
        let mut items = vec![1, 2, 3];
        RayonPlatform.for_each_mut(&mut items, |v| *v *= 10);
        assert_eq!(items, vec![10, 20, 30]);
    }
}

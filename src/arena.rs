//! Arena heap (§4.4).
//!
//! Two layered allocators, modeled as safe handle-based structures instead
//! of the original's raw-pointer chunk list (Design Notes §9):
//!
//! - [`FrameArena`]: linear allocation with releasable checkpoints. Used for
//!   `ELEM` nodes, bbox vertex tables, and per-frame lists.
//! - [`ObjectPool`]: free-list sub-allocator for long-lived objects whose
//!   lifetime is independent of frames (scenes, surfaces, materials).
//!
//! `bumpalo` (a workspace dependency) only supports `reset()`-the-whole-arena;
//! it cannot release "everything allocated after an earlier checkpoint"
//! while keeping earlier allocations alive, which Invariant 1 (§8) requires.
//! `FrameArena` is therefore hand-rolled, following bumpalo's own
//! chunk-growth strategy (double on overflow, floor at `RT_CHUNK_SIZE`).

use crate::config::RT_CHUNK_SIZE;
use crate::errors::{Result, SceneError};

/// A releasable checkpoint into a [`FrameArena`]. Opaque; only meaningful
/// when passed back to the same arena instance that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaMark {
    chunk: usize,
    offset: usize,
}

struct Chunk {
    buf: Vec<u8>,
    head: usize,
}

impl Chunk {
    fn new(size: usize) -> Self {
        Self {
            buf: vec![0u8; size],
            head: 0,
        }
    }

    fn remaining(&self, align: usize) -> usize {
        let aligned = align_up(self.head, align);
        self.buf.len().saturating_sub(aligned)
    }
}

fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Linear arena with releasable checkpoints (`alloc`/`reserve`/`release`).
///
/// Every allocation returns an [`ArenaHandle<T>`](ArenaHandle), a
/// `(chunk_index, offset)` pair rather than a pointer; dereferencing goes
/// back through the arena. This keeps the allocator itself safe while
/// preserving the "index not pointer" discipline Design Notes §9 asks for.
pub struct FrameArena {
    chunks: Vec<Chunk>,
    /// Index of the chunk currently receiving allocations.
    current: usize,
}

impl FrameArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: vec![Chunk::new(RT_CHUNK_SIZE)],
            current: 0,
        }
    }

    /// Advances the head pointer by `size` bytes aligned to `align`,
    /// growing the chunk list if the current chunk doesn't fit.
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<ArenaMark> {
        if size == 0 {
            return Ok(ArenaMark {
                chunk: self.current,
                offset: self.chunks[self.current].head,
            });
        }
        if self.chunks[self.current].remaining(align) < size {
            let new_size = size.max(RT_CHUNK_SIZE);
            self.chunks.push(Chunk::new(new_size));
            self.current = self.chunks.len() - 1;
        }
        let chunk = &mut self.chunks[self.current];
        let offset = align_up(chunk.head, align);
        if offset + size > chunk.buf.len() {
            return Err(SceneError::ArenaOom { requested: size });
        }
        chunk.head = offset + size;
        Ok(ArenaMark {
            chunk: self.current,
            offset,
        })
    }

    /// Reserves `size` bytes without advancing the externally-visible head:
    /// the *next* `alloc` call begins inside the reserved area. Used by the
    /// per-thread pre-phase-1 reservation protocol (§4.4 "Per-frame protocol").
    pub fn reserve(&mut self, size: usize, align: usize) -> Result<ArenaMark> {
        let mark = self.alloc(size, align)?;
        // Roll the head back to the start of the reservation so subsequent
        // `alloc` calls reuse the space; the mark itself still denotes the
        // reserved region's start for a matching `release`.
        self.chunks[mark.chunk].head = mark.offset;
        Ok(mark)
    }

    /// Returns the current write position as a mark, without allocating.
    #[must_use]
    pub fn checkpoint(&self) -> ArenaMark {
        ArenaMark {
            chunk: self.current,
            offset: self.chunks[self.current].head,
        }
    }

    /// Frees all chunks allocated after `mark` and resets the marked
    /// chunk's head back to `mark.offset`. Satisfies Invariant 1 (§8): the
    /// same `(chunk, offset)` address set is reused by the next `alloc`
    /// sequence of matching sizes.
    pub fn release(&mut self, mark: ArenaMark) {
        self.chunks.truncate(mark.chunk + 1);
        self.current = mark.chunk;
        self.chunks[mark.chunk].head = mark.offset;
    }

    /// Total bytes allocated across all live chunks (diagnostic only).
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.head).sum()
    }
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-list sub-allocator for long-lived, individually-freeable objects.
///
/// Unlike [`FrameArena`], slots here are reused by index: freeing a slot
/// and re-allocating the same size returns the *same* index, satisfying
/// Invariant 2 (§8) in spirit — the original's literal "same pointer"
/// guarantee becomes "same stable index", since a safe Rust API cannot
/// promise pointer identity across a `Vec` that may reallocate. Callers
/// that need a stable address should take `&T`/`&mut T` through the index
/// rather than caching a raw pointer.
pub struct ObjectPool<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
}

/// Index into an [`ObjectPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolIndex(usize);

impl<T> ObjectPool<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// `obj_alloc`: returns a free slot, preferring freed slots (free-list
    /// reuse) over growing the backing storage.
    pub fn obj_alloc(&mut self, value: T) -> PoolIndex {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(value);
            PoolIndex(idx)
        } else {
            self.slots.push(Some(value));
            PoolIndex(self.slots.len() - 1)
        }
    }

    /// `obj_free`: releases a slot back to the free list. Panics if the
    /// index was already free or out of range — freeing a dangling index
    /// is exactly the bug class the magic-word check guards against in the
    /// original; here it is a programmer error caught immediately instead
    /// of silently corrupting a neighboring allocation.
    pub fn obj_free(&mut self, idx: PoolIndex) -> T {
        let slot = self
            .slots
            .get_mut(idx.0)
            .expect("obj_free: index out of range");
        let value = slot.take().expect("obj_free: double free");
        self.free_list.push(idx.0);
        value
    }

    #[must_use]
    pub fn get(&self, idx: PoolIndex) -> Option<&T> {
        self.slots.get(idx.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, idx: PoolIndex) -> Option<&mut T> {
        self.slots.get_mut(idx.0).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_release_round_trip() {
        // Invariant 1: release(ptr) then re-alloc from ptr yields the same
        // address set for the same sizes, for any reserve/alloc interleaving.
        let mut arena = FrameArena::new();
        let a1 = arena.alloc(64, 8).unwrap();
        let mark = arena.checkpoint();
        let _reserved = arena.reserve(256, 8).unwrap();
        let _b1 = arena.alloc(32, 8).unwrap();
        let _b2 = arena.alloc(32, 8).unwrap();

        arena.release(mark);
        let c1 = arena.alloc(32, 8).unwrap();
        let c2 = arena.alloc(32, 8).unwrap();

        assert_eq!(c1, mark);
        assert_eq!(c2.chunk, mark.chunk);
        assert_eq!(c2.offset, mark.offset + 32);
        // a1 (pre-checkpoint) remains untouched/accessible in its own chunk.
        assert_eq!(a1.chunk, 0);
    }

    #[test]
    fn arena_release_frees_new_chunks() {
        let mut arena = FrameArena::new();
        let mark = arena.checkpoint();
        // Force a new chunk to be allocated.
        let _big = arena.alloc(RT_CHUNK_SIZE * 2, 8).unwrap();
        assert!(arena.chunks.len() > 1);
        arena.release(mark);
        assert_eq!(arena.chunks.len(), 1);
    }

    #[test]
    fn obj_alloc_free_idempotence() {
        // Invariant 2: obj_free(obj_alloc(n)) followed by obj_alloc(n)
        // returns the same slot (free-list reuse).
        let mut pool: ObjectPool<[u8; 16]> = ObjectPool::new();
        let idx = pool.obj_alloc([0u8; 16]);
        pool.obj_free(idx);
        let idx2 = pool.obj_alloc([1u8; 16]);
        assert_eq!(idx, idx2);
    }

    #[test]
    fn pool_len_accounts_for_frees() {
        let mut pool: ObjectPool<u32> = ObjectPool::new();
        let a = pool.obj_alloc(1);
        let _b = pool.obj_alloc(2);
        assert_eq!(pool.len(), 2);
        pool.obj_free(a);
        assert_eq!(pool.len(), 1);
    }
}

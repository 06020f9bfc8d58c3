//! Error Types
//!
//! This module defines the error types used throughout the scene manager.
//!
//! # Overview
//!
//! The main error type [`SceneError`] covers all failure modes described by
//! the engine's error taxonomy:
//! - Out-of-memory (arena/object-pool exhaustion, thread-metadata allocation)
//! - Scene-validation (malformed hierarchy, missing camera, bad framebuffer)
//! - Consistency assertions (debug-only, indicate an engine bug)
//! - Thread-local errors captured per worker and reported after the barrier
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, SceneError>`.

use thiserror::Error;

/// The main error type for the scene manager.
///
/// Each variant mirrors one of the four categories from the error taxonomy;
/// see the module documentation for the full breakdown.
#[derive(Error, Debug)]
pub enum SceneError {
    // ========================================================================
    // Out-of-memory
    // ========================================================================
    /// The frame arena's chunk list could not grow (backing allocator
    /// returned an error or a hard memory ceiling was configured).
    #[error("out of memory in heap's chunk_alloc: requested {requested} bytes")]
    ArenaOom {
        /// Requested allocation size in bytes.
        requested: usize,
    },

    /// Thread-pool metadata (per-thread workspaces) could not be allocated.
    #[error("out of memory allocating thread metadata for {thnum} threads")]
    ThreadMetaOom {
        /// Requested thread count.
        thnum: usize,
    },

    // ========================================================================
    // Scene-validation
    // ========================================================================
    /// A null/stale handle was dereferenced where a valid object was
    /// required (constructors only; runtime lookups return `Option`).
    #[error("null object pointer: {context}")]
    NullObject {
        /// Description of what was being constructed or resolved.
        context: String,
    },

    /// The scene root is not an Array.
    #[error("scene root is not an array")]
    RootNotArray,

    /// The scene has no camera at the point a render was requested.
    #[error("scene has no camera")]
    NoCamera,

    /// Framebuffer dimensions are invalid (zero extent, stride < width,
    /// or misaligned for the configured SIMD width).
    #[error("invalid framebuffer: {reason}")]
    InvalidFramebuffer {
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// The scene is already locked by another render in progress.
    #[error("scene already locked by another instance")]
    SceneLocked,

    /// A bbox geometry array (`verts`/`edges`/`faces`) exceeded its fixed
    /// capacity (`RT_VERTS_LIMIT`/`RT_EDGES_LIMIT`/`RT_FACES_LIMIT`).
    #[error("bbox geometry limit exceeded: {what} has {count}, limit is {limit}")]
    BboxLimitExceeded {
        /// Which array overflowed (`"verts"`, `"edges"`, or `"faces"`).
        what: &'static str,
        /// The count that was attempted.
        count: usize,
        /// The configured limit.
        limit: usize,
    },

    // ========================================================================
    // Consistency assertion (debug-only; indicates an engine bug)
    // ========================================================================
    /// `mtx` and its cached `inv` disagree beyond floating-point tolerance.
    #[error("matrix inversion mismatch for object {object_context}")]
    MatrixInversionMismatch {
        /// Debug context identifying the offending object.
        object_context: String,
    },

    /// `trnode`/`bvnode` assignment violates the invariants of §3.1.
    #[error("inconsistent trnode/bvnode assignment: {detail}")]
    InconsistentNodeAssignment {
        /// Description of the violated invariant.
        detail: String,
    },

    // ========================================================================
    // Thread-local error (captured per worker, reported by main thread)
    // ========================================================================
    /// One or more worker threads set their per-thread error slot during a
    /// parallel phase; the frame is torn down without partial output.
    #[error("{count} worker thread(s) reported errors during phase {phase}: {first}")]
    ThreadPhaseFailed {
        /// Which of the five pipeline phases failed.
        phase: &'static str,
        /// Number of threads that reported an error.
        count: usize,
        /// The first reported error string (others are logged, not carried).
        first: String,
    },
}

/// Asserts a debug-only consistency invariant, returning
/// [`SceneError::InconsistentNodeAssignment`] when compiled with
/// `debug_assertions` and the condition is false. Release builds skip the
/// check entirely, matching the taxonomy's "debug-only" classification.
#[inline]
pub fn debug_check(cond: bool, detail: impl Into<String>) -> Result<()> {
    if cfg!(debug_assertions) && !cond {
        let detail = detail.into();
        log::error!("consistency assertion failed: {detail}");
        return Err(SceneError::InconsistentNodeAssignment { detail });
    }
    Ok(())
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;

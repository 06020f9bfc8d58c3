//! Build-time constants and runtime configuration.
//!
//! Build-time constants mirror the environment table of the original engine
//! (element/pointer width, SIMD width, bbox geometry limits, thresholds).
//! Runtime configuration (the optimization flag set, antialiasing mode,
//! thread count, path-trace toggle) is a plain struct constructed through a
//! builder, the way the teacher configures its renderer.

use bitflags::bitflags;

// ============================================================================
// Build-time constants
// ============================================================================

/// Maximum vertices in a bbox geometry record.
pub const RT_VERTS_LIMIT: usize = 8;
/// Maximum edges in a bbox geometry record.
pub const RT_EDGES_LIMIT: usize = 12;
/// Maximum faces in a bbox geometry record.
pub const RT_FACES_LIMIT: usize = 6;

/// Default arena chunk size in bytes; a chunk below this is never requested
/// from the backing allocator even if the current allocation is smaller.
pub const RT_CHUNK_SIZE: usize = 4096;

/// Alignment used for arena allocations that back SIMD-facing structs.
pub const QUAD_ALIGN: usize = 16;

/// Magic word stamped on a live object-pool allocation header.
pub const RT_MAGIC_ALLOC: u32 = 0x1600_D0B7;
/// Magic word stamped on a freed object-pool allocation header.
pub const RT_MAGIC_FREE: u32 = 0x1F3E_E0B7;

/// Line-rasterization threshold used by `stile`'s edge-walking algorithm.
pub const LINE_THRESHOLD: f32 = 1.0e-6;
/// Tile-margin threshold used to widen tile edges under `TILING_EXT1`.
pub const TILE_THRESHOLD: f32 = 1.0e-5;
/// Clip-plane threshold for near-plane classification in `stile`.
pub const CLIP_THRESHOLD: f32 = 1.0e-6;
/// Surface-side cull threshold (`surf_side` "on surface" band).
pub const CULL_THRESHOLD: f32 = 1.0e-6;
/// Distance epsilon used by `bbox_fuse`/`bbox_sort` disjointness checks.
pub const DIST_EPSILON: f32 = 1.0e-5;
/// Time epsilon used by `vert_face`/`edge_edge` near/far classification.
pub const TIME_EPSILON: f32 = 1.0e-6;

/// Tolerance applied to axis-mapping detection (scale-is-±1,
/// rotation-is-90°-multiple). See DESIGN.md, "signed matrix affinity".
pub const AXIS_EPS: f32 = 1.0e-5;

/// Antialiasing mode (§6.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    #[default]
    None,
    X2,
    X4,
    X8,
}

bitflags! {
    /// The optimization flag set of §4.5.8. Each bit gates a specific
    /// optimization; all must be respected by the list engine and pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OptFlags: u32 {
        /// Parallel phases actually use the thread pool (else sequential fallback).
        const THREAD        = 1 << 0;
        /// Compute tile lists; else every tile gets the whole camera list.
        const TILING        = 1 << 1;
        /// Widen tile edges with margin for antialiasing safety.
        const TILING_EXT1    = 1 << 2;
        /// Treat non-trivial scale without rotation as trivial in the backend.
        const FSCALE         = 1 << 3;
        /// Allow tagged arrays to defer rotation into a per-array scalers matrix.
        const TARRAY         = 1 << 4;
        /// Allow bvnodes to be used as list-grouping nodes.
        const VARRAY         = 1 << 5;
        /// Allow custom clippers to tighten bbox/cbox.
        const ADJUST         = 1 << 6;
        /// Skip phase 0.5's update entirely (debugging/staging renders).
        const UPDATE         = 1 << 7;
        const UPDATE_EXT0    = 1 << 8;
        const UPDATE_EXT1    = 1 << 9;
        const UPDATE_EXT2    = 1 << 10;
        const UPDATE_EXT3    = 1 << 11;
        /// Skip the render phase.
        const RENDER         = 1 << 12;
        const RENDER_EXT0    = 1 << 13;
        const RENDER_EXT1    = 1 << 14;
        /// Use the hlist walk for shadows instead of "all surfaces, trivially".
        const SHADOW         = 1 << 15;
        const SHADOW_EXT1    = 1 << 16;
        const SHADOW_EXT2    = 1 << 17;
        /// Build dual-side (outer/inner) lists.
        const TWOSIDED       = 1 << 18;
        const TWOSIDED_EXT1  = 1 << 19;
        const TWOSIDED_EXT2  = 1 << 20;
        /// Sorted insertion into lists.
        const INSERT         = 1 << 21;
        const INSERT_EXT1    = 1 << 22;
        /// Enable the surface-surface clip-relation case table in `bbox_sort` step 2.
        const INSERT_EXT2    = 1 << 23;
        /// Hidden-surface removal in `bbox_sort`.
        const REMOVE         = 1 << 24;
    }
}

impl Default for OptFlags {
    /// Matches the source's shipped defaults: everything enabled except the
    /// debug `UPDATE_EXT*`/`RENDER_EXT*` staging bits.
    fn default() -> Self {
        Self::THREAD
            | Self::TILING
            | Self::FSCALE
            | Self::TARRAY
            | Self::VARRAY
            | Self::ADJUST
            | Self::UPDATE
            | Self::RENDER
            | Self::SHADOW
            | Self::SHADOW_EXT1
            | Self::SHADOW_EXT2
            | Self::TWOSIDED
            | Self::TWOSIDED_EXT1
            | Self::TWOSIDED_EXT2
            | Self::INSERT
            | Self::INSERT_EXT1
            | Self::INSERT_EXT2
            | Self::REMOVE
    }
}

/// Runtime configuration: the optimization flag set, antialiasing mode,
/// thread count, and path-trace toggle (§6.5 runtime section).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub opts: OptFlags,
    pub antialiasing: Antialiasing,
    pub thread_count: usize,
    pub path_trace: bool,
    pub tile_w: u32,
    pub tile_h: u32,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_opts(mut self, opts: OptFlags) -> Self {
        self.opts = opts;
        self
    }

    #[must_use]
    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    #[must_use]
    pub fn with_antialiasing(mut self, aa: Antialiasing) -> Self {
        self.antialiasing = aa;
        self
    }

    #[must_use]
    pub fn with_path_trace(mut self, on: bool) -> Self {
        self.path_trace = on;
        self
    }

    #[must_use]
    pub fn with_tile_size(mut self, w: u32, h: u32) -> Self {
        self.tile_w = w;
        self.tile_h = h;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            opts: OptFlags::default(),
            antialiasing: Antialiasing::default(),
            thread_count: rayon::current_num_threads(),
            path_trace: false,
            tile_w: 64,
            tile_h: 64,
        }
    }
}

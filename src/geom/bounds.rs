//! Bounding-volume model (§4.2): `BBox` (bvbox/trbox/inbox share this
//! shape), its geometry construction, mid/rad computation, and the
//! face-coverage flag conversion (`bbox_flag`).
//!
//! Grounded on the teacher's `core/geometry.rs`/`resources/geometry.rs`
//! `BoundingBox`/`BoundingSphere` (two-pass AABB + centroid-distance sphere,
//! `union`/`transform`/`inflate`), generalized with the verts/edges/faces
//! geometry tables and face-coverage flags the quadric-surface model needs
//! that the teacher's mesh-oriented bounding box doesn't track.

use crate::config::{RT_EDGES_LIMIT, RT_FACES_LIMIT, RT_VERTS_LIMIT};
use glam::{Affine3A, Vec3};
use smallvec::SmallVec;

/// A single bbox vertex position.
pub type Vert = Vec3;

/// A bbox edge: indices into `verts`, plus the axis it runs along
/// (`3` if the box has been transformed and no single axis applies).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub p1: u8,
    pub p2: u8,
    pub k: u8,
}

/// A bbox face: a quad of vertex indices plus aligned-axis tags
/// `(k, i, j)` where `k` is the face normal axis (`3` if transformed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub q: [u8; 4],
    pub k: u8,
    pub i: u8,
    pub j: u8,
}

/// Axis not aligned to any single coordinate axis (box has been
/// transformed by a non-trivial trnode matrix).
pub const AXIS_TRANSFORMED: u8 = 3;

/// Bit for "this axis's min half is planar-covered" in `flm`.
#[inline]
#[must_use]
pub const fn flm_min_bit(axis: u8) -> u32 {
    1 << (axis * 2)
}

/// Bit for "this axis's max half is planar-covered" in `flm`.
#[inline]
#[must_use]
pub const fn flm_max_bit(axis: u8) -> u32 {
    2 << (axis * 2)
}

/// A bounding box as described in §3.2/§4.2: extent, enclosing-sphere
/// proxy, explicit vertex/edge/face geometry (bounded by
/// `RT_VERTS_LIMIT`/`RT_EDGES_LIMIT`/`RT_FACES_LIMIT`), and face-coverage
/// flags used for hidden-surface removal.
#[derive(Debug, Clone, PartialEq)]
pub struct BBox {
    pub bmin: Vec3,
    pub bmax: Vec3,
    /// Center of the enclosing sphere (primary culling proxy, §4.2.2).
    pub mid: Vec3,
    /// Radius of the enclosing sphere. `0.0` means empty, `+inf` unbounded.
    pub rad: f32,
    pub verts: SmallVec<[Vert; RT_VERTS_LIMIT]>,
    pub edges: SmallVec<[Edge; RT_EDGES_LIMIT]>,
    pub faces: SmallVec<[Face; RT_FACES_LIMIT]>,
    /// Per-axis minmax-covered-by-a-plane bitmap: `(1=min, 2=max) << (axis*2)`.
    pub flm: u32,
    /// Count of set bits in `flm` (cached, avoids recomputation in hot loops).
    pub fln: u32,
    /// Face-index representation of the same coverage information.
    pub flf: u32,
}

impl BBox {
    /// `rad == 0` — "empty" per §3.2.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bmin: Vec3::ZERO,
            bmax: Vec3::ZERO,
            mid: Vec3::ZERO,
            rad: 0.0,
            verts: SmallVec::new(),
            edges: SmallVec::new(),
            faces: SmallVec::new(),
            flm: 0,
            fln: 0,
            flf: 0,
        }
    }

    /// `rad == +inf` — "unbounded" (a Surface's bvbox before clipping).
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            bmin: Vec3::splat(f32::NEG_INFINITY),
            bmax: Vec3::splat(f32::INFINITY),
            mid: Vec3::ZERO,
            rad: f32::INFINITY,
            verts: SmallVec::new(),
            edges: SmallVec::new(),
            faces: SmallVec::new(),
            flm: 0,
            fln: 0,
            flf: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rad == 0.0
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.rad == f32::INFINITY
    }

    /// Builds a finite axis-aligned box's geometry tables (§4.2.1): 8
    /// verts, 12 edges, 6 faces, axis-aligned (face/edge axis tags are
    /// literal axis indices, not `AXIS_TRANSFORMED`).
    #[must_use]
    pub fn from_minmax(bmin: Vec3, bmax: Vec3) -> Self {
        let mut b = Self::empty();
        b.bmin = bmin;
        b.bmax = bmax;
        b.build_axis_aligned_box_geometry();
        b.recompute_mid_rad();
        b
    }

    /// Builds a plane's degenerate geometry (4 verts, 4 edges, 1 face)
    /// lying in the plane orthogonal to `normal_axis` at `plane_coord`,
    /// spanning the given tangent extent.
    #[must_use]
    pub fn from_plane(normal_axis: u8, plane_coord: f32, tangent_min: Vec3, tangent_max: Vec3) -> Self {
        let mut bmin = tangent_min;
        let mut bmax = tangent_max;
        set_axis(&mut bmin, normal_axis, plane_coord);
        set_axis(&mut bmax, normal_axis, plane_coord);

        let (i, j) = tangent_axes(normal_axis);
        let mut verts = SmallVec::new();
        for &(vi, vj) in &[(0, 0), (1, 0), (1, 1), (0, 1)] {
            let mut v = bmin;
            set_axis(&mut v, i, if vi == 0 { axis(bmin, i) } else { axis(bmax, i) });
            set_axis(&mut v, j, if vj == 0 { axis(bmin, j) } else { axis(bmax, j) });
            verts.push(v);
        }
        let edges: SmallVec<[Edge; RT_EDGES_LIMIT]> = SmallVec::from_slice(&[
            Edge { p1: 0, p2: 1, k: j },
            Edge { p1: 1, p2: 2, k: i },
            Edge { p1: 2, p2: 3, k: j },
            Edge { p1: 3, p2: 0, k: i },
        ]);
        let faces: SmallVec<[Face; RT_FACES_LIMIT]> = SmallVec::from_slice(&[Face {
            q: [0, 1, 2, 3],
            k: normal_axis,
            i,
            j,
        }]);

        let mut b = Self::empty();
        b.bmin = bmin;
        b.bmax = bmax;
        b.verts = verts;
        b.edges = edges;
        b.faces = faces;
        b.recompute_mid_rad();
        // A plane fully covers both halves of its own normal axis (§4.2.3).
        b.flm = flm_min_bit(normal_axis) | flm_max_bit(normal_axis);
        b.fln = 1;
        b
    }

    fn build_axis_aligned_box_geometry(&mut self) {
        let lo = self.bmin;
        let hi = self.bmax;
        let mut verts = SmallVec::new();
        for corner in 0u8..8 {
            let x = if corner & 1 == 0 { lo.x } else { hi.x };
            let y = if corner & 2 == 0 { lo.y } else { hi.y };
            let z = if corner & 4 == 0 { lo.z } else { hi.z };
            verts.push(Vec3::new(x, y, z));
        }
        // Edge list: 4 per axis, connecting the corners that differ only
        // in that axis's bit.
        let mut edges = SmallVec::new();
        for axis_idx in 0u8..3 {
            let bit = 1u8 << axis_idx;
            for corner in 0u8..8 {
                if corner & bit != 0 {
                    continue;
                }
                edges.push(Edge {
                    p1: corner,
                    p2: corner | bit,
                    k: axis_idx,
                });
            }
        }
        // Face list: one min-face and one max-face per axis.
        let mut faces = SmallVec::new();
        for axis_idx in 0u8..3 {
            let (i, j) = tangent_axes(axis_idx);
            let bit = 1u8 << axis_idx;
            for &side in &[0u8, bit] {
                let mut q = [0u8; 4];
                let mut n = 0;
                for corner in 0u8..8 {
                    if (corner & bit) == side {
                        q[n] = corner;
                        n += 1;
                    }
                }
                faces.push(Face { q, k: axis_idx, i, j });
            }
        }
        self.verts = verts;
        self.edges = edges;
        self.faces = faces;
    }

    /// `mid = mean(verts)`, `rad = max over verts of ||vert - mid||` (§4.2.2).
    pub fn recompute_mid_rad(&mut self) {
        if self.verts.is_empty() {
            self.mid = (self.bmin + self.bmax) * 0.5;
            self.rad = (self.bmax - self.bmin).length() * 0.5;
            return;
        }
        let mut mid = Vec3::ZERO;
        for v in &self.verts {
            mid += *v;
        }
        mid /= self.verts.len() as f32;
        let mut rad = 0.0f32;
        for v in &self.verts {
            rad = rad.max((*v - mid).length());
        }
        self.mid = mid;
        self.rad = rad;
    }

    /// Re-projects all 8 (or 4, for planes) vertices through `mtx` and
    /// rebuilds `bmin`/`bmax`/`mid`/`rad`. Marks all axis tags as
    /// `AXIS_TRANSFORMED` since the result is no longer axis-aligned in
    /// the destination frame (§4.2.1).
    #[must_use]
    pub fn transform(&self, mtx: Affine3A) -> Self {
        let mut verts: SmallVec<[Vert; RT_VERTS_LIMIT]> = SmallVec::new();
        for v in &self.verts {
            verts.push(mtx.transform_point3(*v));
        }
        let mut bmin = Vec3::splat(f32::INFINITY);
        let mut bmax = Vec3::splat(f32::NEG_INFINITY);
        for v in &verts {
            bmin = bmin.min(*v);
            bmax = bmax.max(*v);
        }
        let mut edges = self.edges.clone();
        for e in &mut edges {
            e.k = AXIS_TRANSFORMED;
        }
        let mut faces = self.faces.clone();
        for f in &mut faces {
            f.k = AXIS_TRANSFORMED;
            f.i = AXIS_TRANSFORMED;
            f.j = AXIS_TRANSFORMED;
        }

        let mut out = Self {
            bmin,
            bmax,
            mid: Vec3::ZERO,
            rad: 0.0,
            verts,
            edges,
            faces,
            flm: 0, // transformed boxes lose plane-coverage flags; see §4.2.4.
            fln: 0,
            flf: 0,
        };
        out.recompute_mid_rad();
        out
    }

    /// Axis-aligned min/max union of two boxes. Unbounded/empty boxes
    /// absorb or are absorbed per §3.2's semantics.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        if self.is_unbounded() || other.is_unbounded() {
            return Self::unbounded();
        }
        let bmin = self.bmin.min(other.bmin);
        let bmax = self.bmax.max(other.bmax);
        let mut out = Self::from_minmax(bmin, bmax);
        // A union only keeps flm bits where BOTH sides still cover that
        // half fully — losing a bit whenever either side leaves slack,
        // per §4.2.4's bounds-propagation rule.
        out.flm = 0;
        out.fln = 0;
        out
    }

    /// Grows the box by `amount` on every side (used when custom clippers
    /// under `OPTS_ADJUST` tighten/loosen a bbox).
    #[must_use]
    pub fn inflate(&self, amount: f32) -> Self {
        if self.is_empty() || self.is_unbounded() {
            return self.clone();
        }
        let mut b = Self::from_minmax(self.bmin - Vec3::splat(amount), self.bmax + Vec3::splat(amount));
        b.flm = self.flm;
        b.fln = self.fln;
        b.flf = self.flf;
        b
    }
}

fn set_axis(v: &mut Vec3, axis: u8, value: f32) {
    match axis {
        0 => v.x = value,
        1 => v.y = value,
        2 => v.z = value,
        _ => unreachable!("set_axis called with non-cartesian axis"),
    }
}

fn axis(v: Vec3, axis: u8) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        2 => v.z,
        _ => unreachable!("axis called with non-cartesian axis"),
    }
}

fn tangent_axes(normal_axis: u8) -> (u8, u8) {
    match normal_axis {
        0 => (1, 2),
        1 => (2, 0),
        2 => (0, 1),
        _ => unreachable!("tangent_axes called with non-cartesian axis"),
    }
}

/// Converts a minmax-format coverage bitmap (`flm`) into a face-index
/// bitset (`flf`) by renumbering each source axis's min/max bits to the
/// destination axis the trnode's `map` permutation places it at (§4.2.3).
///
/// `map[dst] = src` (the same convention as [`crate::math::AxisMapping`]).
/// A source axis with no destination slot (shouldn't occur for a valid
/// permutation, but defensively skipped) contributes no bits.
#[must_use]
pub fn bbox_flag(map: [u8; 3], flm: u32) -> u32 {
    let mut flf = 0u32;
    for src in 0u8..3 {
        let min_set = flm & flm_min_bit(src) != 0;
        let max_set = flm & flm_max_bit(src) != 0;
        if !min_set && !max_set {
            continue;
        }
        let Some(dst) = map.iter().position(|&m| m == src) else {
            continue;
        };
        let dst = dst as u8;
        if min_set {
            flf |= flm_min_bit(dst);
        }
        if max_set {
            flf |= flm_max_bit(dst);
        }
    }
    flf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_geometry_has_expected_counts() {
        let b = BBox::from_minmax(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(b.verts.len(), 8);
        assert_eq!(b.edges.len(), 12);
        assert_eq!(b.faces.len(), 6);
    }

    #[test]
    fn mid_rad_matches_unit_cube() {
        let b = BBox::from_minmax(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(b.mid.abs_diff_eq(Vec3::ZERO, 1e-6));
        // Corner distance of a unit half-extent cube is sqrt(3).
        assert!((b.rad - 3f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn plane_covers_both_halves_of_normal_axis() {
        let b = BBox::from_plane(2, 0.0, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(b.flm, flm_min_bit(2) | flm_max_bit(2));
        assert_eq!(b.faces.len(), 1);
        assert_eq!(b.verts.len(), 4);
    }

    #[test]
    fn bbox_flag_round_trip_identity_map() {
        let flm = flm_min_bit(0) | flm_max_bit(1);
        let flf = bbox_flag([0, 1, 2], flm);
        assert_eq!(flf, flm);
    }

    #[test]
    fn bbox_flag_round_trip_permuted_map() {
        // map: dst0 <- src1, dst1 <- src2, dst2 <- src0
        let map = [1u8, 2u8, 0u8];
        let flm = flm_min_bit(1) | flm_max_bit(2);
        let flf = bbox_flag(map, flm);
        // src1's bits land at dst0, src2's bits land at dst1.
        assert_eq!(flf, flm_min_bit(0) | flm_max_bit(1));
    }

    #[test]
    fn empty_box_has_zero_radius() {
        assert_eq!(BBox::empty().rad, 0.0);
        assert!(BBox::empty().is_empty());
    }

    #[test]
    fn unbounded_box_has_infinite_radius() {
        assert!(BBox::unbounded().rad.is_infinite());
        assert!(BBox::unbounded().is_unbounded());
    }

    #[test]
    fn union_of_two_boxes_contains_both() {
        let a = BBox::from_minmax(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(0.0, 0.0, 0.0));
        let b = BBox::from_minmax(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let u = a.union(&b);
        assert_eq!(u.bmin, Vec3::splat(-1.0));
        assert_eq!(u.bmax, Vec3::splat(1.0));
    }

    #[test]
    fn inflate_grows_every_side() {
        let a = BBox::from_minmax(Vec3::ZERO, Vec3::ONE);
        let b = a.inflate(0.5);
        assert_eq!(b.bmin, Vec3::splat(-0.5));
        assert_eq!(b.bmax, Vec3::splat(1.5));
    }
}

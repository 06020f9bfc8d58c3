//! `SHAPE` (§3.3): a Surface's quadric form, clip box, and custom-clippers
//! list head, extending its [`crate::geom::BBox`].
//!
//! No teacher analogue (the teacher has no quadric-surface model); the
//! nine-kind tag enum follows the teacher's `scene/camera.rs`
//! `ProjectionType`'s "small closed enum per object kind" convention.

use crate::geom::BBox;
use crate::list::elem::ElemRef;
use glam::{Vec3, Vec4};

/// Surface tag (§3.3). `Plane` is first-order (`sci = 0`, `sck` the
/// surface normal); the rest are second-order quadrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Plane,
    Cylinder,
    Sphere,
    Cone,
    Paraboloid,
    Hyperboloid,
    ParaCylinder,
    HyperCylinder,
    HyperParaboloid,
}

impl SurfaceKind {
    #[inline]
    #[must_use]
    pub fn is_plane(self) -> bool {
        matches!(self, Self::Plane)
    }

    /// Quadrics with a positive-definite quadratic form (closed, convex)
    /// as opposed to saddle/open quadrics (cone, hyperboloids).
    #[inline]
    #[must_use]
    pub fn is_convex(self) -> bool {
        matches!(self, Self::Sphere | Self::Cylinder | Self::ParaCylinder | Self::Paraboloid)
    }
}

/// Per-axis clip bound: `None` means unclipped (±infinity on that side).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipBound {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Surface shape record (§3.3): clip box, quadric coefficients in the
/// surface's local frame, and the custom-clippers list head.
#[derive(Debug, Clone)]
pub struct Shape {
    pub kind: SurfaceKind,
    pub cmin: ClipBound,
    pub cmax: ClipBound,
    /// `diag(sci.xyz)` plus the constant term `sci.w`.
    pub sci: Vec4,
    pub scj: Vec3,
    pub sck: Vec3,
    /// Head of this surface's custom-clippers `ELEM` chain, built by
    /// `sclip` (§4.5.2). `None` before the first `sclip` pass, or when the
    /// surface has no custom clippers.
    pub ptr: Option<ElemRef>,
}

impl Shape {
    #[must_use]
    pub fn plane(normal: Vec3, offset: f32) -> Self {
        Self {
            kind: SurfaceKind::Plane,
            cmin: ClipBound::default(),
            cmax: ClipBound::default(),
            sci: Vec4::ZERO,
            scj: Vec3::ZERO,
            sck: normal,
            ptr: None,
        }
        .with_plane_offset(offset)
    }

    fn with_plane_offset(mut self, offset: f32) -> Self {
        self.sci.w = offset;
        self
    }

    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self {
            kind: SurfaceKind::Sphere,
            cmin: ClipBound::default(),
            cmax: ClipBound::default(),
            sci: Vec4::new(1.0, 1.0, 1.0, -(radius * radius)),
            scj: Vec3::ZERO,
            sck: Vec3::ZERO,
            ptr: None,
        }
    }

    #[must_use]
    pub fn cylinder(radius: f32) -> Self {
        Self {
            kind: SurfaceKind::Cylinder,
            cmin: ClipBound::default(),
            cmax: ClipBound::default(),
            sci: Vec4::new(1.0, 1.0, 0.0, -(radius * radius)),
            scj: Vec3::ZERO,
            sck: Vec3::ZERO,
            ptr: None,
        }
    }
}

/// Per-axis half-extent derivable from the quadric's own coefficients,
/// for the closed/convex kinds where that's well-defined (`sci.xyz`
/// diagonal plus constant term, see §4.1.3's quadric layout). `None` on
/// an axis the quadric doesn't bound by itself (a cylinder's own axis,
/// or any axis of a non-convex/open quadric) — that axis falls back
/// entirely to the clip box in [`bbox_from_shape`].
fn quadric_extent(shape: &Shape) -> Option<Vec3> {
    match shape.kind {
        SurfaceKind::Sphere => {
            let r = (-shape.sci.w).max(0.0).sqrt();
            Some(Vec3::splat(r))
        }
        SurfaceKind::Cylinder | SurfaceKind::ParaCylinder => {
            let r = (-shape.sci.w).max(0.0).sqrt();
            Some(Vec3::new(r, r, f32::INFINITY))
        }
        _ => None,
    }
}

/// If `normal` is (within tolerance) a signed unit axis vector, the axis
/// index and the plane's coordinate along that axis given `offset`
/// (`dot(normal, p) == offset`).
fn plane_normal_axis(normal: Vec3, offset: f32) -> Option<(u8, f32)> {
    const EPS: f32 = 1.0e-5;
    let candidates = [
        (Vec3::X, 0u8, 1.0f32),
        (Vec3::NEG_X, 0u8, -1.0),
        (Vec3::Y, 1u8, 1.0),
        (Vec3::NEG_Y, 1u8, -1.0),
        (Vec3::Z, 2u8, 1.0),
        (Vec3::NEG_Z, 2u8, -1.0),
    ];
    candidates
        .into_iter()
        .find(|(dir, _, _)| (normal - *dir).length() < EPS)
        .map(|(_, axis, sign)| (axis, offset * sign))
}

/// Derives a Surface's local-space bounding box (§4.2.1, §4.6 phase 2
/// "update_bounds") from its clip box (`cmin`/`cmax`) and, for a closed
/// axis-aligned quadric, its own extent. An axis with neither a clip
/// bound nor a derivable quadric extent stays at +/-infinity.
///
/// For an axis-aligned `Plane`, the clip box supplies the tangent
/// extent and the normal axis/coordinate come from `sck`/`sci.w`;
/// a plane whose normal isn't axis-aligned, or whose tangent extent is
/// unclipped on either side, falls back to [`BBox::unbounded`].
#[must_use]
pub fn bbox_from_shape(shape: &Shape) -> BBox {
    let extent = quadric_extent(shape);
    let axis_bounds = |clip_min: Option<f32>, clip_max: Option<f32>, e: Option<f32>| -> (f32, f32) {
        let lo = clip_min.unwrap_or_else(|| e.map_or(f32::NEG_INFINITY, |v| -v));
        let hi = clip_max.unwrap_or_else(|| e.map_or(f32::INFINITY, |v| v));
        (lo, hi)
    };
    let (x0, x1) = axis_bounds(shape.cmin.x, shape.cmax.x, extent.map(|e| e.x));
    let (y0, y1) = axis_bounds(shape.cmin.y, shape.cmax.y, extent.map(|e| e.y));
    let (z0, z1) = axis_bounds(shape.cmin.z, shape.cmax.z, extent.map(|e| e.z));

    if shape.kind.is_plane() {
        return match plane_normal_axis(shape.sck, shape.sci.w) {
            Some((axis, coord)) => {
                let tangent_infinite = [(0u8, x0, x1), (1, y0, y1), (2, z0, z1)]
                    .into_iter()
                    .any(|(a, lo, hi)| a != axis && (lo.is_infinite() || hi.is_infinite()));
                if tangent_infinite {
                    BBox::unbounded()
                } else {
                    BBox::from_plane(axis, coord, Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
                }
            }
            None => BBox::unbounded(),
        };
    }

    if x0.is_infinite() || x1.is_infinite() || y0.is_infinite() || y1.is_infinite() || z0.is_infinite() || z1.is_infinite() {
        return BBox::unbounded();
    }
    BBox::from_minmax(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_quadric_is_centered() {
        let s = Shape::sphere(2.0);
        assert_eq!(s.sci, Vec4::new(1.0, 1.0, 1.0, -4.0));
        assert!(s.kind.is_convex());
    }

    #[test]
    fn plane_is_not_convex() {
        let p = Shape::plane(Vec3::Y, 0.0);
        assert!(p.kind.is_plane());
        assert!(!p.kind.is_convex());
    }

    #[test]
    fn sphere_bbox_matches_radius() {
        let s = Shape::sphere(2.0);
        let b = bbox_from_shape(&s);
        assert!(!b.is_unbounded());
        assert_eq!(b.bmin, Vec3::splat(-2.0));
        assert_eq!(b.bmax, Vec3::splat(2.0));
    }

    #[test]
    fn unclipped_cylinder_is_unbounded_along_its_axis() {
        let c = Shape::cylinder(1.0);
        let b = bbox_from_shape(&c);
        assert!(b.is_unbounded());
    }

    #[test]
    fn clipped_cylinder_is_bounded() {
        let mut c = Shape::cylinder(1.0);
        c.cmin.z = Some(-3.0);
        c.cmax.z = Some(3.0);
        let b = bbox_from_shape(&c);
        assert!(!b.is_unbounded());
        assert_eq!(b.bmin, Vec3::new(-1.0, -1.0, -3.0));
        assert_eq!(b.bmax, Vec3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn axis_aligned_plane_with_clip_box_is_bounded() {
        let mut p = Shape::plane(Vec3::Z, 1.0);
        p.cmin = ClipBound { x: Some(-5.0), y: Some(-5.0), z: None };
        p.cmax = ClipBound { x: Some(5.0), y: Some(5.0), z: None };
        let b = bbox_from_shape(&p);
        assert!(!b.is_unbounded());
        assert_eq!(b.bmin.z, 1.0);
        assert_eq!(b.bmax.z, 1.0);
    }

    #[test]
    fn unclipped_plane_is_unbounded() {
        let p = Shape::plane(Vec3::Z, 0.0);
        assert!(bbox_from_shape(&p).is_unbounded());
    }
}

//! Trivial-transform axis-mapping detection (§3.1, §4.3.1).
//!
//! When an object's effective transform (after trnode factoring) is only an
//! axis swap plus a per-axis sign flip plus a per-axis scale, the backend
//! can treat it as axis-aligned and skip matrix math entirely. This module
//! detects that case and produces the `map`/`sgn`/`scl` triple.

use crate::config::AXIS_EPS;
use glam::{Mat3, Vec3};

/// Axis index used by `map`: 0=X, 1=Y, 2=Z, 3=not-axis-aligned ("W" in the
/// source's terminology, meaning "no valid permutation axis").
pub const AXIS_NONE: u8 = 3;

/// Result of trivial-transform detection for a single 3x3 linear part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    /// Destination-axis-to-source-axis permutation, `AXIS_NONE` if not trivial.
    pub map: [u8; 3],
    /// Sign applied to the corresponding source axis (+1.0 or -1.0).
    pub sgn: [f32; 3],
    /// Magnitude of the corresponding source axis.
    pub scl: [f32; 3],
    /// Whether this mapping is actually trivial (a valid permutation was found).
    pub trivial: bool,
}

impl AxisMapping {
    const NONE: Self = Self {
        map: [AXIS_NONE; 3],
        sgn: [1.0; 3],
        scl: [1.0; 3],
        trivial: false,
    };
}

/// Checks whether a 3x3 linear map is a signed axis permutation scaled
/// per-axis, within `AXIS_EPS`. Returns `None` when the matrix mixes axes
/// (true rotation) and thus cannot be expressed as `map/sgn/scl`.
///
/// This is the epsilon-tolerant variant recommended in DESIGN.md's
/// resolution of the "signed matrix affinity" open question: it accepts
/// near-90-degree rotations and near-unit scales introduced by animator
/// floating-point drift.
#[must_use]
pub fn detect_axis_mapping(linear: Mat3) -> AxisMapping {
    detect_axis_mapping_with_eps(linear, AXIS_EPS)
}

/// Source-faithful variant using exact float equality (no tolerance),
/// matching the original engine's literal `== 1.0` / `== 0.0` comparisons.
/// Provided for callers that need byte-for-byte behavioral parity with
/// source scene files rather than animator-driven robustness.
#[must_use]
pub fn detect_axis_mapping_exact(linear: Mat3) -> AxisMapping {
    detect_axis_mapping_with_eps(linear, 0.0)
}

fn detect_axis_mapping_with_eps(linear: Mat3, eps: f32) -> AxisMapping {
    let cols = [linear.x_axis, linear.y_axis, linear.z_axis];
    let mut map = [AXIS_NONE; 3];
    let mut sgn = [1.0f32; 3];
    let mut scl = [1.0f32; 3];
    let mut used = [false; 3];

    for (dst, col) in cols.iter().enumerate() {
        let comps = [col.x, col.y, col.z];
        // Exactly one component of this column may be non-zero for a
        // trivial transform; the other two must vanish within eps.
        let mut found_axis = None;
        for (src, &v) in comps.iter().enumerate() {
            if v.abs() <= eps {
                continue;
            }
            if found_axis.is_some() {
                return AxisMapping::NONE;
            }
            found_axis = Some((src, v));
        }
        let Some((src, v)) = found_axis else {
            return AxisMapping::NONE;
        };
        if used[src] {
            return AxisMapping::NONE;
        }
        used[src] = true;
        map[dst] = src as u8;
        sgn[dst] = v.signum();
        scl[dst] = v.abs();
    }

    AxisMapping {
        map,
        sgn,
        scl,
        trivial: true,
    }
}

/// Is the given scale vector trivial (each component within `eps` of ±1)?
#[must_use]
pub fn scale_is_trivial(scale: Vec3, eps: f32) -> bool {
    (scale.x.abs() - 1.0).abs() <= eps
        && (scale.y.abs() - 1.0).abs() <= eps
        && (scale.z.abs() - 1.0).abs() <= eps
}

/// Is the given Euler-degrees rotation trivial (each component a multiple
/// of 90 degrees within `eps`)?
#[must_use]
pub fn rotation_is_trivial(euler_deg: Vec3, eps: f32) -> bool {
    let check = |deg: f32| {
        let m = deg.rem_euclid(90.0);
        m <= eps || (90.0 - m) <= eps
    };
    check(euler_deg.x) && check(euler_deg.y) && check(euler_deg.z)
}

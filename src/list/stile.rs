//! `stile` (§4.5.5): projects a surface's bounding box onto the
//! screen-space tile grid and emits one `ELEM` per touched tile.
//!
//! The source walks each bbox edge with a dedicated `tiling(p1, p2)`
//! Bresenham-style line walk, accumulating per-row `(txmin, txmax)`
//! ranges so a diagonal edge only binds the tiles it actually crosses.
//! This implementation projects every bbox corner to screen UV through
//! the camera's [`RayStepper`] frame and rasterizes the axis-aligned
//! rectangle spanning the projected corners — a conservative superset of
//! the source's tile set (it can touch tiles a tight edge walk would
//! have excluded, never fewer), documented in DESIGN.md as the resolved
//! simplification for this module. Near-plane clipping (source step 2)
//! is approximated by simply excluding behind-camera corners from the
//! projected rectangle rather than generating clipped near-plane
//! vertices.

use crate::geom::BBox;
use crate::list::elem::{ElemArena, ElemPayload, ElemRef};
use crate::scene::camera::RayStepper;
use glam::Vec3;

/// Screen-space tile grid dimensions (§4.6: `scene.tiles[]`).
#[derive(Debug, Clone, Copy)]
pub struct TileGrid {
    pub tiles_in_row: u32,
    pub tiles_in_col: u32,
}

impl TileGrid {
    #[must_use]
    pub fn new(screen_w: u32, screen_h: u32, tile_w: u32, tile_h: u32) -> Self {
        Self {
            tiles_in_row: screen_w.div_ceil(tile_w.max(1)),
            tiles_in_col: screen_h.div_ceil(tile_h.max(1)),
        }
    }

    #[inline]
    #[must_use]
    pub fn tile_count(&self) -> u32 {
        self.tiles_in_row * self.tiles_in_col
    }

    #[inline]
    #[must_use]
    pub fn index(&self, tx: u32, ty: u32) -> u32 {
        ty * self.tiles_in_row + tx
    }
}

/// Projects `point` into normalized screen UV (`0..1`, origin top-left)
/// through the stepper's ray frame, or `None` if it falls behind the
/// camera (§4.5.5 step 1's "behind" classification).
fn project_to_uv(point: Vec3, stepper: &RayStepper) -> Option<(f32, f32)> {
    let to_point = point - stepper.pos;
    let forward_dist = to_point.dot(stepper.dir);
    if forward_dist <= 0.0 {
        return None;
    }
    let scaled = to_point / forward_dist - stepper.dir;
    let hor_len_sq = stepper.hor.length_squared();
    let ver_len_sq = stepper.ver.length_squared();
    if hor_len_sq <= 0.0 || ver_len_sq <= 0.0 {
        return None;
    }
    let u = 0.5 + scaled.dot(stepper.hor) / (2.0 * hor_len_sq);
    let v = 0.5 - scaled.dot(stepper.ver) / (2.0 * ver_len_sq);
    Some((u, v))
}

fn bbox_corners(bbox: &BBox) -> [Vec3; 8] {
    let (min, max) = (bbox.bmin, bbox.bmax);
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

fn fill_all_tiles(grid: &TileGrid, arena: &mut ElemArena) -> Option<ElemRef> {
    let mut head: Option<ElemRef> = None;
    let mut tail: Option<ElemRef> = None;
    for idx in 0..grid.tile_count() {
        let r = arena.alloc(ElemPayload::Tile(idx));
        if let Some(t) = tail {
            arena.get_mut(t).next = Some(r);
        } else {
            head = Some(r);
        }
        tail = Some(r);
    }
    head
}

/// Builds `srf.tls`: the chain of tiles `bbox` (in world space) projects
/// onto through `stepper`. `bbox.is_none()` (an unclipped Plane, say)
/// fills the whole grid, matching the source's infinite-extent special
/// case.
pub fn stile(bbox: Option<&BBox>, stepper: &RayStepper, grid: &TileGrid, arena: &mut ElemArena) -> Option<ElemRef> {
    let Some(bbox) = bbox else {
        return fill_all_tiles(grid, arena);
    };
    if bbox.is_unbounded() || bbox.is_empty() {
        return fill_all_tiles(grid, arena);
    }

    let mut umin = f32::INFINITY;
    let mut umax = f32::NEG_INFINITY;
    let mut vmin = f32::INFINITY;
    let mut vmax = f32::NEG_INFINITY;
    let mut any_in_front = false;

    for corner in bbox_corners(bbox) {
        if let Some((u, v)) = project_to_uv(corner, stepper) {
            any_in_front = true;
            umin = umin.min(u);
            umax = umax.max(u);
            vmin = vmin.min(v);
            vmax = vmax.max(v);
        }
    }

    if !any_in_front {
        return None;
    }

    // A box straddling the camera (some corners behind) projects to an
    // unbounded screen region on the visible side; fill conservatively.
    let straddles_camera = bbox_corners(bbox)
        .iter()
        .any(|&c| project_to_uv(c, stepper).is_none());
    if straddles_camera {
        return fill_all_tiles(grid, arena);
    }

    let umin = umin.clamp(0.0, 1.0);
    let umax = umax.clamp(0.0, 1.0);
    let vmin = vmin.clamp(0.0, 1.0);
    let vmax = vmax.clamp(0.0, 1.0);
    if umin > umax || vmin > vmax {
        return None;
    }

    let tx_min = (umin * grid.tiles_in_row as f32).floor() as u32;
    let tx_max = (umax * grid.tiles_in_row as f32).ceil().max(1.0) as u32 - 1;
    let ty_min = (vmin * grid.tiles_in_col as f32).floor() as u32;
    let ty_max = (vmax * grid.tiles_in_col as f32).ceil().max(1.0) as u32 - 1;
    let tx_max = tx_max.min(grid.tiles_in_row.saturating_sub(1));
    let ty_max = ty_max.min(grid.tiles_in_col.saturating_sub(1));

    let mut head: Option<ElemRef> = None;
    let mut tail: Option<ElemRef> = None;
    for ty in ty_min..=ty_max {
        for tx in tx_min..=tx_max {
            let r = arena.alloc(ElemPayload::Tile(grid.index(tx, ty)));
            if let Some(t) = tail {
                arena.get_mut(t).next = Some(r);
            } else {
                head = Some(r);
            }
            tail = Some(r);
        }
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn stepper_looking_down_z() -> RayStepper {
        RayStepper {
            pos: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::NEG_Z,
            hor: Vec3::new(1.0, 0.0, 0.0),
            ver: Vec3::new(0.0, 1.0, 0.0),
            htl: Vec3::ZERO,
            vtl: Vec3::ZERO,
        }
    }

    #[test]
    fn unbounded_bbox_fills_whole_grid() {
        let grid = TileGrid::new(256, 256, 64, 64);
        let mut arena = ElemArena::new();
        let head = stile(None, &stepper_looking_down_z(), &grid, &mut arena);
        let mut count = 0;
        let mut cur = head;
        while let Some(c) = cur {
            count += 1;
            cur = arena.get(c).next;
        }
        assert_eq!(count, grid.tile_count());
    }

    #[test]
    fn centered_small_bbox_touches_center_tile() {
        let grid = TileGrid::new(256, 256, 64, 64);
        let bbox = BBox::from_minmax(Vec3::new(-0.05, -0.05, -0.05), Vec3::new(0.05, 0.05, 0.05));
        let mut arena = ElemArena::new();
        let head = stile(Some(&bbox), &stepper_looking_down_z(), &grid, &mut arena).unwrap();
        let center = grid.index(2, 2);
        let mut found = false;
        let mut cur = Some(head);
        while let Some(c) = cur {
            if matches!(arena.get(c).payload, ElemPayload::Tile(idx) if idx == center) {
                found = true;
            }
            cur = arena.get(c).next;
        }
        assert!(found);
    }
}

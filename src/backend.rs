//! Consumer contract (§6.1) and framebuffer contract (§6.4): plain data
//! the rendering backend reads once a frame's pipeline has run. No
//! behavior lives here — the SIMD ray-marching backend itself is out of
//! scope.

use crate::config::QUAD_ALIGN;
use crate::errors::{Result, SceneError};
use crate::geom::BBox;
use crate::list::ElemRef;
use crate::scene::handles::NodeHandle;
use crate::scene::material::Material;
use crate::scene::scene::Scene;
use crate::scene::surface::Shape;
use glam::{Mat3, Vec3};

/// Everything the backend needs to ray-trace one surface, assembled from
/// `Scene` after `SceneManager::render` completes (§6.1).
#[derive(Debug, Clone, Copy)]
pub struct SurfaceBackendView<'a> {
    pub node: NodeHandle,
    pub pos: Vec3,
    pub inv: Mat3,
    pub shape: &'a Shape,
    pub bbox: Option<&'a BBox>,
    pub map: [u8; 4],
    pub sgn: [f32; 4],
    pub scl: [f32; 4],
    pub material_outer: Option<&'a Material>,
    pub material_inner: Option<&'a Material>,
    /// `lst_p[0]` outer light, `lst_p[1]` outer rfl/rfr, `lst_p[2]` inner
    /// light, `lst_p[3]` inner rfl/rfr.
    pub lst_p: [Option<ElemRef>; 4],
    /// Custom clippers list (`msc_p[2]`).
    pub msc_p: Option<ElemRef>,
}

impl<'a> SurfaceBackendView<'a> {
    /// Builds the backend view for `node`, or `None` if it isn't a
    /// Surface with shape data.
    #[must_use]
    pub fn new(scene: &'a Scene, node: NodeHandle) -> Option<Self> {
        let data = scene.nodes.get(node)?;
        let shape = scene.shapes.get(node)?;
        let lists = scene.surface_lists.get(node);
        Some(Self {
            node,
            pos: data.mtx.translation.into(),
            inv: data.inv,
            shape,
            bbox: scene.bboxes.get(node),
            map: data.map,
            sgn: data.sgn,
            scl: data.scl,
            material_outer: scene.materials_outer.get(node),
            material_inner: scene.materials_inner.get(node),
            lst_p: lists.map_or([None; 4], |l| l.lst_p),
            msc_p: lists.and_then(|l| l.msc_p),
        })
    }
}

/// Per-channel float accumulation planes for path-trace mode (§6.4).
#[derive(Debug)]
pub struct FloatPlanes<'a> {
    pub r: &'a mut [f32],
    pub g: &'a mut [f32],
    pub b: &'a mut [f32],
}

/// 32-bit ARGB framebuffer contract (§6.4): dimensions, row stride
/// (negative means vertically flipped, first scanline stored last), and
/// optional float planes for path-tracer accumulation.
#[derive(Debug)]
pub struct Framebuffer<'a> {
    pub x_res: u32,
    pub y_res: u32,
    /// Row stride in pixels; `abs(x_row) >= x_res`.
    pub x_row: i32,
    pub argb: &'a mut [u32],
    pub planes: Option<FloatPlanes<'a>>,
}

impl<'a> Framebuffer<'a> {
    /// Validates the framebuffer contract (§6.4, §7 scene-validation):
    /// nonzero extent, stride covering the row width, stride aligned to
    /// the configured SIMD width.
    pub fn new(x_res: u32, y_res: u32, x_row: i32, argb: &'a mut [u32]) -> Result<Self> {
        if x_res == 0 || y_res == 0 {
            log::error!("invalid framebuffer: zero extent ({x_res}x{y_res})");
            return Err(SceneError::InvalidFramebuffer {
                reason: "zero extent".to_string(),
            });
        }
        if x_row.unsigned_abs() < x_res {
            log::error!("invalid framebuffer: stride {x_row} narrower than width {x_res}");
            return Err(SceneError::InvalidFramebuffer {
                reason: "stride narrower than width".to_string(),
            });
        }
        if (x_row.unsigned_abs() as usize * std::mem::size_of::<u32>()) % QUAD_ALIGN != 0 {
            log::error!("invalid framebuffer: stride {x_row} not aligned to SIMD width");
            return Err(SceneError::InvalidFramebuffer {
                reason: "stride not aligned to SIMD width".to_string(),
            });
        }
        Ok(Self {
            x_res,
            y_res,
            x_row,
            argb,
            planes: None,
        })
    }

    #[must_use]
    pub fn with_planes(mut self, planes: FloatPlanes<'a>) -> Self {
        self.planes = Some(planes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extent_is_rejected() {
        let mut buf = [0u32; 4];
        assert!(matches!(
            Framebuffer::new(0, 4, 4, &mut buf),
            Err(SceneError::InvalidFramebuffer { .. })
        ));
    }

    #[test]
    fn narrow_stride_is_rejected() {
        let mut buf = [0u32; 16];
        assert!(matches!(
            Framebuffer::new(8, 2, 4, &mut buf),
            Err(SceneError::InvalidFramebuffer { .. })
        ));
    }

    #[test]
    fn valid_dimensions_are_accepted() {
        let mut buf = [0u32; 16];
        assert!(Framebuffer::new(4, 4, 4, &mut buf).is_ok());
    }
}

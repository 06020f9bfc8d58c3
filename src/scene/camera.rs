//! Camera payload (§6.2) and the per-frame ray-stepper vectors the
//! pipeline derives from it (§4.6 step 5).

use glam::Vec3;

/// Camera payload from the scene description (§6.2): color/luminosity,
/// per-frame movement/rotation deltas (applied by the producer between
/// frames, not by this engine), and point-of-view parameters.
#[derive(Debug, Clone)]
pub struct Camera {
    pub color: Vec3,
    pub luminosity: f32,
    pub move_delta: Vec3,
    pub rot_delta: Vec3,
    /// Horizontal field of view in degrees.
    pub fov: f32,
    pub aspect: f32,

    /// Ray-stepper vectors (§4.6 step 5), recomputed from `mtx`/`fov`/
    /// `aspect` once per frame after phase 1.
    pub stepper: RayStepper,
}

/// Per-frame camera-derived vectors the backend uses to step rays across
/// the screen grid without per-pixel trig.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayStepper {
    pub pos: Vec3,
    pub dir: Vec3,
    pub hor: Vec3,
    pub ver: Vec3,
    pub htl: Vec3,
    pub vtl: Vec3,
}

impl Camera {
    #[must_use]
    pub fn new(fov: f32, aspect: f32) -> Self {
        Self {
            color: Vec3::ONE,
            luminosity: 1.0,
            move_delta: Vec3::ZERO,
            rot_delta: Vec3::ZERO,
            fov,
            aspect,
            stepper: RayStepper::default(),
        }
    }

    /// Recomputes `stepper` from the camera's world matrix (§4.6 step 5):
    /// `pos` is the eye point, `dir` the forward axis, `hor`/`ver` the
    /// half-screen-width scaled right/up axes, `htl`/`vtl` the top-left
    /// corner ray offset.
    pub fn update_stepper(&mut self, world: glam::Affine3A) {
        let pos = world.translation.into();
        let forward = world.transform_vector3(Vec3::NEG_Z).normalize();
        let right = world.transform_vector3(Vec3::X).normalize();
        let up = world.transform_vector3(Vec3::Y).normalize();

        let half_h = (self.fov.to_radians() * 0.5).tan();
        let half_v = half_h / self.aspect;
        let hor = right * half_h;
        let ver = up * half_v;
        let htl = forward - hor + ver;

        self.stepper = RayStepper {
            pos,
            dir: forward,
            hor,
            ver,
            htl,
            vtl: ver * -2.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Affine3A;

    #[test]
    fn stepper_points_along_forward_axis_at_identity() {
        let mut cam = Camera::new(60.0, 1.0);
        cam.update_stepper(Affine3A::IDENTITY);
        assert!((cam.stepper.dir - Vec3::NEG_Z).length() < 1e-5);
    }
}

//! Local transform (§3.1's `trm`): scale, Euler-degrees rotation,
//! translation, with the teacher's dirty-check-against-last-frame pattern
//! (`Transform::update_local_matrix`) generalized to the degrees convention
//! this engine's scene description uses.

use glam::{Affine3A, EulerRot, Vec3};

/// `trm`: an object's local scale/rotation/translation.
///
/// Rotation is stored as Euler XYZ degrees rather than a quaternion,
/// matching the scene-description convention (§3.1) and the triviality
/// test in [`crate::math::rotation_is_trivial`] (multiples of 90 degrees).
#[derive(Debug, Clone)]
pub struct Trm {
    pub scale: Vec3,
    pub rotation_deg: Vec3,
    pub translation: Vec3,

    local_matrix: Affine3A,
    last_scale: Vec3,
    last_rotation_deg: Vec3,
    last_translation: Vec3,
    force_update: bool,
}

impl Trm {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation_deg: Vec3::ZERO,
            translation: Vec3::ZERO,
            local_matrix: Affine3A::IDENTITY,
            last_scale: Vec3::ONE,
            last_rotation_deg: Vec3::ZERO,
            last_translation: Vec3::ZERO,
            force_update: true,
        }
    }

    /// Recomputes `local_matrix` if any component changed since last call.
    /// Returns whether a recompute happened (feeds `obj_changed`, §4.3.1).
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.scale != self.last_scale
            || self.rotation_deg != self.last_rotation_deg
            || self.translation != self.last_translation
            || self.force_update;

        if changed {
            let rot = glam::Quat::from_euler(
                EulerRot::XYZ,
                self.rotation_deg.x.to_radians(),
                self.rotation_deg.y.to_radians(),
                self.rotation_deg.z.to_radians(),
            );
            self.local_matrix = Affine3A::from_scale_rotation_translation(self.scale, rot, self.translation);
            self.last_scale = self.scale;
            self.last_rotation_deg = self.rotation_deg;
            self.last_translation = self.translation;
            self.force_update = false;
        }

        changed
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Affine3A {
        self.local_matrix
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Trm {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix_is_identity() {
        let mut t = Trm::identity();
        t.update_local_matrix();
        assert_eq!(t.local_matrix(), Affine3A::IDENTITY);
    }

    #[test]
    fn dirty_check_skips_unchanged_recompute() {
        let mut t = Trm::identity();
        assert!(t.update_local_matrix());
        assert!(!t.update_local_matrix());
        t.translation = Vec3::new(1.0, 0.0, 0.0);
        assert!(t.update_local_matrix());
    }
}

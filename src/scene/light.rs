//! Light payload (§6.2): color, luminosity, and distance attenuation.
//! Shadowing itself is not a shadow-map property of the light — it is the
//! per-light shadow list `lsort` builds (§4.5.7) from geometry predicates.

use glam::Vec3;

/// Distance attenuation coefficients and effective range.
#[derive(Debug, Clone, Copy)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Beyond this distance the light contributes nothing; `f32::INFINITY`
    /// for an unbounded (e.g. directional-like) light.
    pub range: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
            range: f32::INFINITY,
        }
    }
}

impl Attenuation {
    #[must_use]
    pub fn falloff(&self, distance: f32) -> f32 {
        if distance > self.range {
            return 0.0;
        }
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Light payload (§6.2): color, ambient + source luminosity, attenuation.
#[derive(Debug, Clone)]
pub struct Light {
    pub color: Vec3,
    pub ambient: f32,
    pub source: f32,
    pub attenuation: Attenuation,
}

impl Light {
    #[must_use]
    pub fn new(color: Vec3, source: f32) -> Self {
        Self {
            color,
            ambient: 0.0,
            source,
            attenuation: Attenuation::default(),
        }
    }

    #[must_use]
    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }
}

//! Per-side material model (§4.3.3): each Surface has an outer and an
//! inner [`Material`].

use bitflags::bitflags;
use glam::Vec3;

bitflags! {
    /// Material property bitset (§4.3.3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MaterialProps: u16 {
        const NORMAL   = 1 << 0;
        const GAMMA    = 1 << 1;
        const FRESNEL  = 1 << 2;
        const LIGHT    = 1 << 3;
        const METAL    = 1 << 4;
        const OPAQUE   = 1 << 5;
        const TRANSP   = 1 << 6;
        const TEXTURE  = 1 << 7;
        const REFLECT  = 1 << 8;
        const REFRACT  = 1 << 9;
        const DIFFUSE  = 1 << 10;
        const SPECULAR = 1 << 11;
    }
}

/// One side's (outer or inner) optical properties.
#[derive(Debug, Clone)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub power: f32,
    pub reflect: f32,
    pub transp: f32,
    pub refract: f32,
    pub texture: Option<u32>,
    pub props: MaterialProps,
}

impl Material {
    #[must_use]
    pub fn new(diffuse: Vec3, specular: Vec3, power: f32) -> Self {
        let mut m = Self {
            diffuse,
            specular,
            power,
            reflect: 0.0,
            transp: 0.0,
            refract: 1.0,
            texture: None,
            props: MaterialProps::NORMAL | MaterialProps::LIGHT | MaterialProps::DIFFUSE | MaterialProps::SPECULAR,
        };
        m.recompute_props();
        m
    }

    #[must_use]
    pub fn with_reflect(mut self, reflect: f32) -> Self {
        self.reflect = reflect;
        self.recompute_props();
        self
    }

    #[must_use]
    pub fn with_transp(mut self, transp: f32, refract: f32) -> Self {
        self.transp = transp;
        self.refract = refract;
        self.recompute_props();
        self
    }

    /// Derives `props` from the scalar fields: sets REFLECT/REFRACT/TRANSP
    /// bits, and clears DIFFUSE/SPECULAR whenever `reflect + transp >= 1`
    /// (§4.3.3's pure-reflect/transmit rule).
    pub fn recompute_props(&mut self) {
        self.props.set(MaterialProps::REFLECT, self.reflect > 0.0);
        self.props.set(MaterialProps::TRANSP, self.transp > 0.0);
        self.props.set(MaterialProps::REFRACT, self.transp > 0.0);
        if self.reflect + self.transp >= 1.0 {
            self.props.remove(MaterialProps::DIFFUSE | MaterialProps::SPECULAR);
        } else {
            self.props.insert(MaterialProps::DIFFUSE | MaterialProps::SPECULAR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_reflector_clears_diffuse_specular() {
        let m = Material::new(Vec3::ONE, Vec3::ONE, 32.0).with_reflect(1.0);
        assert!(!m.props.contains(MaterialProps::DIFFUSE));
        assert!(!m.props.contains(MaterialProps::SPECULAR));
        assert!(m.props.contains(MaterialProps::REFLECT));
    }

    #[test]
    fn partial_reflector_keeps_diffuse() {
        let m = Material::new(Vec3::ONE, Vec3::ONE, 32.0).with_reflect(0.3);
        assert!(m.props.contains(MaterialProps::DIFFUSE));
    }
}

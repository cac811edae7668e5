// Copyright @yucwang 2026

use crate::core::shape::GeometryKind;
use crate::math::constants::{ Float, Vector3f };
use crate::math::spectrum::RGBSpectrum;

/// One shaded location, built fresh per intersection query and immutable
/// afterwards. `instance` is an index into the owning scene; None marks a
/// miss (environment sample or void).
pub struct ShadePoint {
    pub instance: Option<usize>,
    pub kind: GeometryKind,
    pub p: Vector3f,
    /// Shading normal for triangles, segment tangent for lines, the
    /// outgoing direction itself for points.
    pub n: Vector3f,
    pub le: RGBSpectrum,
    pub wo: Vector3f,
    pub kd: RGBSpectrum,
    pub ks: RGBSpectrum,
    pub rs: Float,
}

impl ShadePoint {
    pub fn environment(le: RGBSpectrum, wo: Vector3f) -> Self {
        Self {
            instance: None,
            kind: GeometryKind::Triangles,
            p: Vector3f::zeros(),
            n: Vector3f::zeros(),
            le,
            wo,
            kd: RGBSpectrum::default(),
            ks: RGBSpectrum::default(),
            rs: 0.0,
        }
    }

    pub fn void(wo: Vector3f) -> Self {
        Self::environment(RGBSpectrum::default(), wo)
    }

    /// A point with no reflectance terminates transport; only `le`
    /// contributes.
    pub fn emission_only(&self) -> bool {
        self.kd.is_black() && self.ks.is_black()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_only() {
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let env = ShadePoint::environment(RGBSpectrum::new(2.0, 2.0, 2.0), wo);
        assert!(env.emission_only());

        let void = ShadePoint::void(wo);
        assert!(void.emission_only());
        assert!(void.le.is_black());

        let mut shaded = ShadePoint::void(wo);
        shaded.kd = RGBSpectrum::gray(0.5);
        assert!(!shaded.emission_only());
    }
}

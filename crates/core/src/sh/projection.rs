//! Projecting clump point lights into an SH lighting environment
//!
//! Each clump is treated as a point light at its centroid. The direction from
//! the receiver's reference point to the centroid is expressed in the
//! receiver's local frame, every basis function is evaluated along it, and the
//! clump's radiance times those values is added to the running coefficient
//! vector. Projection is linear in the lights: projecting lights one at a time
//! and summing gives the same vector as projecting them together.

use super::basis::{to_spherical, ShBasis};
use super::coefficients::ShCoefficients;
use crate::core_types::{Color, Vec3};
use crate::lighting::{LightClump, PointLight};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Scale applied to each projected light
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionNormalization {
    /// Scale by `4π / n` so a lone light evaluates to its own radiance in its
    /// own direction
    #[default]
    PeakPreserving,
    /// Raw projection of a Dirac light: `c_i = Y_i(ω) · L`
    Delta,
}

impl ProjectionNormalization {
    /// Per-light weight for a basis with `coefficient_count` functions
    pub fn weight(&self, coefficient_count: usize) -> f32 {
        match self {
            Self::PeakPreserving => 4.0 * std::f32::consts::PI / coefficient_count as f32,
            Self::Delta => 1.0,
        }
    }
}

/// Reference point and orientation of the illuminated geometry
///
/// Directions are measured from `origin` and rotated into the geometry's
/// local frame, whose +z axis is the SH polar axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadingFrame {
    /// Reference point of the shaded geometry
    pub origin: Vec3,
    /// Geometry orientation (local → parent space)
    pub rotation: UnitQuaternion<f32>,
}

impl Default for ShadingFrame {
    fn default() -> Self {
        Self::at(Vec3::zeros())
    }
}

impl ShadingFrame {
    /// Frame at `origin` with the given orientation
    pub fn new(origin: Vec3, rotation: UnitQuaternion<f32>) -> Self {
        Self { origin, rotation }
    }

    /// Unrotated frame at `origin`
    pub fn at(origin: Vec3) -> Self {
        Self::new(origin, UnitQuaternion::identity())
    }

    /// The same frame expressed relative to an emitter placed at `emitter_origin`
    pub fn relative_to(&self, emitter_origin: Vec3) -> Self {
        Self::new(self.origin - emitter_origin, self.rotation)
    }

    /// Vector from the reference point to `point`, in the local frame
    pub fn to_local(&self, point: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.origin))
    }
}

/// Converts point lights to SH coefficients for one basis
#[derive(Debug, Clone)]
pub struct ShProjector {
    basis: ShBasis,
    normalization: ProjectionNormalization,
    weight: f32,
    scratch: Vec<f32>,
}

impl ShProjector {
    /// Projector for `basis`
    pub fn new(basis: ShBasis, normalization: ProjectionNormalization) -> Self {
        Self {
            basis,
            normalization,
            weight: normalization.weight(basis.coefficient_count()),
            scratch: vec![0.0; basis.coefficient_count()],
        }
    }

    /// Basis this projector produces
    pub fn basis(&self) -> ShBasis {
        self.basis
    }

    /// Normalization applied to every light
    pub fn normalization(&self) -> ProjectionNormalization {
        self.normalization
    }

    /// Add one point light to `out`
    ///
    /// `position` is in the same space as `frame`. A light at the frame origin
    /// or with zero radiance contributes nothing.
    ///
    /// # Returns
    ///
    /// `true` if the light changed `out`.
    pub fn project_light(
        &mut self,
        position: &Vec3,
        radiance: Color,
        frame: &ShadingFrame,
        out: &mut ShCoefficients,
    ) -> bool {
        if radiance == Color::zeros() || !radiance.iter().all(|c| c.is_finite()) {
            return false;
        }
        if out.basis() != self.basis {
            warn!(
                "Skipping SH projection into {} coefficients, projector has {}",
                out.len(),
                self.basis.coefficient_count()
            );
            return false;
        }
        let Some((theta, phi)) = to_spherical(&frame.to_local(position)) else {
            return false;
        };
        self.basis.evaluate_into(theta, phi, &mut self.scratch);
        out.add_weighted(&self.scratch, radiance * self.weight);
        true
    }

    /// Add every clump to `out`, scaled by `intensity`
    ///
    /// Clump centroids must be in the same space as `frame`.
    pub fn project_into(
        &mut self,
        clumps: &[LightClump],
        frame: &ShadingFrame,
        intensity: f32,
        out: &mut ShCoefficients,
    ) {
        for clump in clumps.iter().filter(|c| !c.is_dark()) {
            self.project_light(&clump.centroid(), clump.radiance() * intensity, frame, out);
        }
    }

    /// Project clumps into a fresh coefficient vector
    pub fn project(
        &mut self,
        clumps: &[LightClump],
        frame: &ShadingFrame,
        intensity: f32,
    ) -> ShCoefficients {
        let mut out = ShCoefficients::zeros(self.basis);
        self.project_into(clumps, frame, intensity, &mut out);
        out
    }

    /// Project world-space point lights into a fresh coefficient vector
    pub fn project_point_lights(
        &mut self,
        lights: &[PointLight],
        frame: &ShadingFrame,
    ) -> ShCoefficients {
        let mut out = ShCoefficients::zeros(self.basis);
        for light in lights {
            self.project_light(&light.position, light.radiance(), frame, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sh::evaluation::evaluate_direction;
    use approx::assert_relative_eq;

    fn light(position: Vec3, color: Color) -> PointLight {
        PointLight {
            position,
            color,
            intensity: 1.0,
        }
    }

    #[test]
    fn test_peak_preserving_round_trip() {
        for bands in 2..=6 {
            let basis = ShBasis::new(bands).unwrap();
            let mut projector = ShProjector::new(basis, ProjectionNormalization::PeakPreserving);
            let dir = Vec3::new(0.2, 0.9, -0.4).normalize();
            let radiance = Color::new(1.0, 0.6, 0.2);
            let coeffs = projector
                .project_point_lights(&[light(dir * 3.0, radiance)], &ShadingFrame::default());

            let at_light = evaluate_direction(&coeffs, &dir);
            assert_relative_eq!(at_light, radiance, epsilon = 1e-4);

            let opposite = evaluate_direction(&coeffs, &-dir);
            assert!(opposite.x < 0.5 * radiance.x, "bands {bands}: {opposite:?}");
        }
    }

    #[test]
    fn test_delta_normalization_peak() {
        // Σ_i Y_i(ω)² = bands² / 4π
        let basis = ShBasis::new(3).unwrap();
        let mut projector = ShProjector::new(basis, ProjectionNormalization::Delta);
        let coeffs = projector.project_point_lights(
            &[light(Vec3::new(0.0, 0.0, 2.0), Color::new(1.0, 1.0, 1.0))],
            &ShadingFrame::default(),
        );
        let peak = evaluate_direction(&coeffs, &Vec3::z());
        assert_relative_eq!(peak.x, 9.0 / (4.0 * std::f32::consts::PI), max_relative = 1e-4);
    }

    #[test]
    fn test_light_at_origin_contributes_nothing() {
        let mut projector =
            ShProjector::new(ShBasis::default(), ProjectionNormalization::default());
        let frame = ShadingFrame::at(Vec3::new(1.0, 2.0, 3.0));
        let coeffs = projector.project_point_lights(
            &[light(Vec3::new(1.0, 2.0, 3.0), Color::new(1.0, 1.0, 1.0))],
            &frame,
        );
        assert!(coeffs.is_zero());
    }

    #[test]
    fn test_frame_rotation() {
        // Receiver rotated so its local +z points along world +x
        let rotation = UnitQuaternion::rotation_between(&Vec3::z(), &Vec3::x()).unwrap();
        let frame = ShadingFrame::new(Vec3::zeros(), rotation);
        assert_relative_eq!(
            frame.to_local(&Vec3::new(2.0, 0.0, 0.0)),
            Vec3::new(0.0, 0.0, 2.0),
            epsilon = 1e-6
        );

        let basis = ShBasis::new(3).unwrap();
        let mut projector = ShProjector::new(basis, ProjectionNormalization::PeakPreserving);
        let coeffs = projector.project_point_lights(
            &[light(Vec3::new(5.0, 0.0, 0.0), Color::new(1.0, 1.0, 1.0))],
            &frame,
        );
        assert_relative_eq!(evaluate_direction(&coeffs, &Vec3::z()).x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_relative_frame() {
        let frame = ShadingFrame::at(Vec3::new(0.0, 0.0, 0.0));
        let local = frame.relative_to(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(local.to_local(&Vec3::new(0.0, 1.0, 0.0)), Vec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_mismatched_output_left_untouched() {
        let mut projector =
            ShProjector::new(ShBasis::new(2).unwrap(), ProjectionNormalization::default());
        let mut out = ShCoefficients::zeros(ShBasis::new(3).unwrap());
        assert!(!projector.project_light(
            &Vec3::x(),
            Color::new(1.0, 1.0, 1.0),
            &ShadingFrame::default(),
            &mut out
        ));
        assert!(out.is_zero());
    }
}

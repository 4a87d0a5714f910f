//! Direct point-light export for consumers without SH support
//!
//! The same clumps that feed the SH projector can instead be handed to a
//! per-fragment lighting shader as discrete lights. The consumer accepts a
//! bounded number of lights; that bound is checked when the emitter is built.

use super::clustering::LightClump;
use crate::core_types::{Color, Vec3};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Light count a typical forward-lit shader accepts
pub const DEFAULT_MAX_POINT_LIGHTS: usize = 50;

/// A single point light in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,
    /// Linear RGB color before intensity
    pub color: Color,
    /// Scalar intensity multiplier
    pub intensity: f32,
}

impl PointLight {
    /// Color scaled by intensity
    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }

    /// Pack for a GPU light buffer
    pub fn to_gpu(&self) -> PointLightGpu {
        PointLightGpu {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            color_intensity: [self.color.x, self.color.y, self.color.z, self.intensity],
        }
    }
}

/// std140/std430-compatible point light (two `vec4`s)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightGpu {
    /// xyz position, w = 1
    pub position: [f32; 4],
    /// rgb color, a = intensity
    pub color_intensity: [f32; 4],
}

/// Replace `out` with one light per non-dark clump
///
/// Clump centroids are emitter-local; `origin` moves them into world space.
pub fn export_point_lights(
    clumps: &[LightClump],
    origin: Vec3,
    intensity: f32,
    out: &mut Vec<PointLight>,
) {
    out.clear();
    out.extend(
        clumps
            .iter()
            .filter(|clump| !clump.is_dark())
            .map(|clump| PointLight {
                position: origin + clump.centroid(),
                color: clump.radiance(),
                intensity,
            }),
    );
}

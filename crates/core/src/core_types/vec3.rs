//! Vector type aliases for 3D positions, directions and colors.

use nalgebra::Vector3;

/// 3D vector type for positions, velocities, and directions.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`, used throughout
/// the simulation for particle kinematics, clump centroids and forces.
pub type Vec3 = Vector3<f32>;

/// Linear RGB color / radiance triple.
///
/// Shares the vector representation so radiance can be scaled and summed
/// with the same arithmetic as positions.
pub type Color = Vector3<f32>;

/// Rec. 709 luminance of a linear RGB value
#[inline]
pub fn luminance(color: &Color) -> f32 {
    0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z
}

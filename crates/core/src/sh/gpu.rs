//! Uniform-buffer layout for SH lighting

use super::coefficients::ShCoefficients;
use bytemuck::{Pod, Zeroable};

/// One RGB coefficient padded to 16 bytes (std140 `vec4`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShCoefficientGpu {
    /// RGB in `xyz`, `w` unused
    pub rgb_pad: [f32; 4],
}

impl ShCoefficients {
    /// Coefficients as a uniform-block array in basis index order
    pub fn to_uniform_block(&self) -> Vec<ShCoefficientGpu> {
        self.values()
            .iter()
            .map(|c| ShCoefficientGpu {
                rgb_pad: [c.x, c.y, c.z, 0.0],
            })
            .collect()
    }

    /// Raw bytes ready for upload
    pub fn uniform_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_uniform_block()).to_vec()
    }
}

//! Per-particle render data

use bytemuck::{Pod, Zeroable};

/// One camera-facing sprite, laid out for a vertex instance buffer
///
/// `normalized_age` drives the flame color gradient and `decay` the sprite's
/// opacity; both lie in `[0, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World-space center
    pub position: [f32; 3],
    /// `age / lifetime`
    pub normalized_age: f32,
    /// Billboard width and height
    pub size: [f32; 2],
    /// Decay weight at the current age
    pub decay: f32,
    /// Keeps the stride at 32 bytes
    pub padding: f32,
}

impl SpriteInstance {
    /// Size of one instance in bytes
    pub const STRIDE: usize = std::mem::size_of::<Self>();
}

/// Raw bytes of an instance slice ready for upload
pub fn sprite_bytes(sprites: &[SpriteInstance]) -> &[u8] {
    bytemuck::cast_slice(sprites)
}

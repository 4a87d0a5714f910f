//! Core types and utilities

pub mod noise;
pub mod particle;
pub mod vec3;

pub use noise::{fbm_temporal, temporal_noise};
pub use particle::Particle;
pub use vec3::{luminance, Color, Vec3};

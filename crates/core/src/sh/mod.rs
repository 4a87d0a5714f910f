//! Spherical-harmonic lighting
//!
//! Clump lights are projected into a truncated real SH basis around a
//! receiver, reconstructed in any direction, and dotted with baked transfer
//! vectors to shade receiver geometry.

pub mod basis;
pub mod coefficients;
pub mod evaluation;
pub mod gpu;
pub mod projection;
pub mod transfer;

pub use basis::{
    from_spherical, sh, to_spherical, ShBasis, DEFAULT_BANDS, MAX_BANDS, MIN_DIRECTION_LENGTH,
};
pub use coefficients::ShCoefficients;
pub use evaluation::{evaluate, evaluate_direction, SpherePlot};
pub use gpu::ShCoefficientGpu;
pub use projection::{ProjectionNormalization, ShProjector, ShadingFrame};
pub use transfer::PrtReceiver;

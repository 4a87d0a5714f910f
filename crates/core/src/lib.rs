//! Fire Particle Lighting Core Library
//!
//! Simulates small fire effects as fixed-size particle populations and turns
//! them into light for real-time rendering. Particles are grouped into a
//! handful of light clumps; each clump acts as one point light, either
//! exported directly or projected into a spherical-harmonic (SH) environment
//! for precomputed radiance transfer.
//!
//! ## Frame pipeline
//!
//! 1. [`ParticlePool::advect`] integrates every particle, applies due
//!    random kicks and respawns expired slots in place
//! 2. [`LightClusterer::update`] optionally regroups particles ("hops") and
//!    recomputes clump centroids and radiance
//! 3. [`ShProjector`] projects clumps into [`ShCoefficients`], or
//!    [`export_point_lights`] emits [`PointLight`]s
//! 4. [`FireScene`] sums every emitter into one environment that
//!    [`evaluate`] and [`PrtReceiver`] consume
//!
//! Time is in milliseconds throughout and +y is up for particles. The host
//! supplies `dt` and the external force; the core never reads a clock.

// Core types and utilities
pub mod core_types;
pub mod error;

// Simulation stages
pub mod lighting;
pub mod particles;
pub mod sh;
pub mod simulation;

// Re-export core types
pub use core_types::{Color, Particle, Vec3};
pub use error::ConfigError;

// Re-export stage types
pub use lighting::{
    export_point_lights, ClumpConfig, DecayCurve, HopPolicy, LightClump, LightClusterer,
    PointLight,
};
pub use particles::{
    ExternalForce, ParticleConfig, ParticlePool, PerturbationConfig, SinusoidalWind,
};
pub use sh::{
    evaluate, evaluate_direction, PrtReceiver, ShBasis, ShCoefficients, ShProjector,
    ShadingFrame, SpherePlot,
};
pub use simulation::{EmitterConfig, FireEmitter, FireScene, SceneConfig, SpriteInstance};

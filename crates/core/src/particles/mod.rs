//! Particle population: pool, perturbation and external forces

pub mod config;
pub mod forces;
pub mod perturbation;
pub mod pool;

pub use config::{ParticleConfig, PerturbDirection, PerturbationConfig, Spread, VectorSpread};
pub use forces::{ExternalForce, GustingWind, SinusoidalWind};
pub use perturbation::Perturber;
pub use pool::ParticlePool;

//! Fixed-capacity particle arena
//!
//! The pool owns every particle slot for the lifetime of the emitter. Slots
//! are never added or removed: when a particle expires it is re-drawn in
//! place, so the population size is constant and slot indices stay valid for
//! the light clustering engine.
//!
//! # Integration
//!
//! Semi-implicit Euler per slot:
//!
//! ```text
//! a  = acceleration + external_force - center_force × (x, 0, z)
//! v += a × dt
//! x += v × dt
//! ```

use super::config::{ParticleConfig, PerturbationConfig};
use super::perturbation::Perturber;
use crate::core_types::{Particle, Vec3};
use crate::error::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tracing::{info, trace};

/// Constant-size population of fire particles
///
/// # Example
///
/// ```
/// use fire_light_core::particles::{ParticleConfig, ParticlePool, PerturbationConfig};
/// use fire_light_core::Vec3;
///
/// let mut pool = ParticlePool::new(
///     ParticleConfig::flame(),
///     PerturbationConfig::flame(),
///     Some(7),
/// )
/// .unwrap();
///
/// let wind = Vec3::new(6e-7, 0.0, 0.0);
/// for _ in 0..100 {
///     pool.advect(16.0, wind);
/// }
/// assert_eq!(pool.len(), 400);
/// ```
#[derive(Debug, Clone)]
pub struct ParticlePool {
    config: ParticleConfig,
    perturber: Perturber,
    particles: Vec<Particle>,
    rng: StdRng,
    /// Simulated time since construction (ms)
    clock: f32,
    respawns: u64,
}

impl ParticlePool {
    /// Allocate and randomize `config.count` particles
    ///
    /// A `seed` makes the whole run reproducible; `None` seeds from the OS.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if either configuration is invalid.
    pub fn new(
        config: ParticleConfig,
        perturbation: PerturbationConfig,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let perturber = Perturber::new(perturbation)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut pool = Self {
            particles: Vec::with_capacity(config.count),
            config,
            perturber,
            rng,
            clock: 0.0,
            respawns: 0,
        };
        pool.initialize();

        info!(
            "Particle pool initialized: {} particles, lifetime {:.0}±{:.0}ms, seeded={}",
            pool.particles.len(),
            pool.config.lifetime.mean,
            pool.config.lifetime.variance,
            seed.is_some()
        );
        Ok(pool)
    }

    fn initialize(&mut self) {
        self.particles.clear();
        for _ in 0..self.config.count {
            let mut particle = spawn(&self.config, &self.perturber, &mut self.rng, self.clock);
            if self.config.stagger_initial_ages {
                particle.age = self.rng.random_range(0.0..particle.lifetime);
            }
            self.particles.push(particle);
        }
    }

    /// Advance every particle by `dt` milliseconds
    ///
    /// Due perturbations are applied first, then the particle is integrated
    /// under its own acceleration, the caller's `external_force` and the
    /// center pull. Particles whose age reaches their lifetime are respawned
    /// at the same slot with `age == 0`. A non-positive or non-finite `dt` is
    /// ignored.
    pub fn advect(&mut self, dt: f32, external_force: Vec3) {
        if !(dt.is_finite() && dt > 0.0) {
            trace!("Skipping advection for dt={}", dt);
            return;
        }

        self.clock += dt;
        let now = self.clock;
        let Self {
            config,
            perturber,
            particles,
            rng,
            respawns,
            ..
        } = self;

        let mut perturbed = 0usize;
        let mut respawned = 0usize;
        for particle in particles.iter_mut() {
            if perturber.apply(particle, now, rng) {
                perturbed += 1;
            }

            let offset = particle.position;
            let center_pull = -config.center_force * Vec3::new(offset.x, 0.0, offset.z);
            let accel = particle.acceleration + external_force + center_pull;
            particle.velocity += accel * dt;
            particle.position += particle.velocity * dt;
            particle.age += dt;

            if particle.age >= particle.lifetime {
                *particle = spawn(config, perturber, rng, now);
                respawned += 1;
            }
        }
        *respawns += respawned as u64;

        trace!(
            "Advected {} particles: t={:.1}ms dt={:.2}ms perturbed={} respawned={}",
            particles.len(),
            now,
            dt,
            perturbed,
            respawned
        );
    }

    /// All particle slots, in slot order
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Particle at `slot`
    pub fn get(&self, slot: usize) -> Option<&Particle> {
        self.particles.get(slot)
    }

    /// Number of slots (constant)
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Always false: a valid pool has at least one slot
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Simulated time since construction (ms)
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Total respawns since construction
    pub fn respawn_count(&self) -> u64 {
        self.respawns
    }

    /// Distributions this pool draws from
    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Impulse generator used by this pool
    pub fn perturber(&self) -> &Perturber {
        &self.perturber
    }
}

/// Draw a fresh particle from the configured distributions
///
/// Position is uniform over the spawn disc in the (x, z) plane; velocity,
/// acceleration and lifetime come from their spreads, and the first impulse is
/// scheduled from `now`.
fn spawn(config: &ParticleConfig, perturber: &Perturber, rng: &mut StdRng, now: f32) -> Particle {
    let radius = config.base_radius * rng.random::<f32>().sqrt();
    let angle = rng.random_range(0.0..TAU);
    let position = Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin());

    let velocity = config.initial_velocity.sample(rng);
    let acceleration = config.initial_acceleration.sample(rng);
    let lifetime = config.lifetime.sample(rng);

    let mut particle = Particle::new(position, velocity, acceleration, lifetime);
    perturber.schedule(&mut particle, now, rng);
    particle
}

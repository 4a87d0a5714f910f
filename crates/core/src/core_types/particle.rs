//! A single fire particle occupying one pool slot
//!
//! Particles are never allocated or freed while the simulation runs. A slot
//! holds one particle identity at a time; when that particle's age reaches its
//! lifetime the pool re-randomizes the slot in place and the slot continues
//! with a fresh identity.

use crate::core_types::vec3::Vec3;
use serde::{Deserialize, Serialize};

/// Kinematic and lifetime state of one particle
///
/// Times (`age`, `lifetime`, `next_perturb_time`) are simulated milliseconds.
/// `next_perturb_time` is absolute, measured on the owning pool's clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) acceleration: Vec3,
    pub(crate) age: f32,
    pub(crate) lifetime: f32,
    pub(crate) next_perturb_time: f32,
}

impl Particle {
    /// Create a particle with explicit state
    pub fn new(position: Vec3, velocity: Vec3, acceleration: Vec3, lifetime: f32) -> Self {
        Self {
            position,
            velocity,
            acceleration,
            age: 0.0,
            lifetime,
            next_perturb_time: 0.0,
        }
    }

    /// Set the elapsed age (ms)
    pub fn with_age(mut self, age: f32) -> Self {
        self.age = age;
        self
    }

    /// Whether the particle is inside its lifespan
    pub fn is_alive(&self) -> bool {
        self.age >= 0.0 && self.age < self.lifetime
    }

    /// Age as a fraction of lifetime, clamped to `[0, 1]`
    pub fn normalized_age(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Position in emitter-local space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity (units per ms)
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Intrinsic acceleration drawn at spawn (units per ms²)
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Elapsed age (ms)
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Total lifespan (ms)
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Absolute time of the next randomized impulse (ms)
    pub fn next_perturb_time(&self) -> f32 {
        self.next_perturb_time
    }
}

//! Particle emitter configuration
//!
//! Configuration is plain data with presets and serde support. It is checked
//! once by [`ParticleConfig::validate`] / [`PerturbationConfig::validate`] when
//! the pool is built; nothing here is reconfigurable mid-run.

use crate::core_types::Vec3;
use crate::error::{ensure_non_negative, ConfigError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Scalar distribution: uniform over `[mean - variance, mean + variance]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    /// Center of the range
    pub mean: f32,
    /// Half-width of the range
    pub variance: f32,
}

impl Spread {
    /// Create a distribution from its mean and half-width
    pub const fn new(mean: f32, variance: f32) -> Self {
        Self { mean, variance }
    }

    /// Distribution that always returns `value`
    pub const fn constant(value: f32) -> Self {
        Self::new(value, 0.0)
    }

    /// Smallest value the distribution can produce
    pub fn min(&self) -> f32 {
        self.mean - self.variance
    }

    /// Largest value the distribution can produce
    pub fn max(&self) -> f32 {
        self.mean + self.variance
    }

    /// Draw one value
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.variance > 0.0 {
            rng.random_range(self.min()..=self.max())
        } else {
            self.mean
        }
    }

    /// Check that mean and variance are finite and the variance non-negative
    pub fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.mean.is_finite() && self.variance.is_finite() && self.variance >= 0.0 {
            Ok(())
        } else {
            Err(self.invalid(what))
        }
    }

    /// As [`Spread::validate`], additionally requiring every draw to be > 0
    pub fn validate_positive(&self, what: &'static str) -> Result<(), ConfigError> {
        self.validate(what)?;
        if self.min() > 0.0 {
            Ok(())
        } else {
            Err(self.invalid(what))
        }
    }

    fn invalid(&self, what: &'static str) -> ConfigError {
        ConfigError::InvalidSpread {
            what,
            mean: self.mean,
            variance: self.variance,
        }
    }
}

/// Per-axis uniform distribution for vectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSpread {
    /// Center of the range on each axis
    pub mean: Vec3,
    /// Half-width of the range on each axis
    pub variance: Vec3,
}

impl VectorSpread {
    /// Create a distribution from its mean and per-axis half-width
    pub fn new(mean: Vec3, variance: Vec3) -> Self {
        Self { mean, variance }
    }

    /// Distribution that always returns `value`
    pub fn constant(value: Vec3) -> Self {
        Self::new(value, Vec3::zeros())
    }

    /// Draw one vector
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            Spread::new(self.mean.x, self.variance.x).sample(rng),
            Spread::new(self.mean.y, self.variance.y).sample(rng),
            Spread::new(self.mean.z, self.variance.z).sample(rng),
        )
    }

    /// Whether `v` lies inside the range on every axis
    pub fn contains(&self, v: &Vec3) -> bool {
        (0..3).all(|i| (v[i] - self.mean[i]).abs() <= self.variance[i] * (1.0 + 1e-5) + 1e-12)
    }

    /// Check that every axis is a valid [`Spread`]
    pub fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        (0..3).try_for_each(|i| Spread::new(self.mean[i], self.variance[i]).validate(what))
    }
}

/// Kinematic distributions of a particle population
///
/// Units: distances in emitter-local units, times in milliseconds. The y axis
/// points up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    /// Number of pool slots
    pub count: usize,
    /// Spawn disc radius in the horizontal (x, z) plane
    pub base_radius: f32,
    /// Initial velocity (units / ms)
    pub initial_velocity: VectorSpread,
    /// Intrinsic acceleration held for the particle's whole life (units / ms²)
    pub initial_acceleration: VectorSpread,
    /// Lifespan (ms)
    pub lifetime: Spread,
    /// Horizontal pull toward the emitter axis, per unit of offset (1 / ms²)
    pub center_force: f32,
    /// Start the population at random ages instead of all at zero
    pub stagger_initial_ages: bool,
    /// Billboard width and height handed to the renderer
    pub sprite_size: [f32; 2],
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self::flame()
    }
}

impl ParticleConfig {
    /// Dense, fast-cycling flame body
    pub fn flame() -> Self {
        Self {
            count: 400,
            base_radius: 0.25,
            initial_velocity: VectorSpread::new(
                Vec3::new(0.0, 0.0006, 0.0),
                Vec3::new(0.0001, 0.0002, 0.0001),
            ),
            initial_acceleration: VectorSpread::new(
                Vec3::new(0.0, 1e-7, 0.0),
                Vec3::new(0.0, 5e-8, 0.0),
            ),
            lifetime: Spread::new(800.0, 200.0),
            center_force: 1e-6,
            stagger_initial_ages: true,
            sprite_size: [0.25, 0.25],
        }
    }

    /// A handful of long-lived sparks thrown up and pulled back by gravity
    pub fn sparks() -> Self {
        Self {
            count: 5,
            base_radius: 0.2,
            initial_velocity: VectorSpread::new(
                Vec3::new(0.0, 0.0008, 0.0),
                Vec3::zeros(),
            ),
            initial_acceleration: VectorSpread::constant(Vec3::new(0.0, -0.0000004, 0.0)),
            lifetime: Spread::new(2000.0, 200.0),
            center_force: 0.0,
            stagger_initial_ages: true,
            sprite_size: [0.03, 0.03],
        }
    }

    /// Slow, sparse smoke column
    pub fn smoke() -> Self {
        Self {
            count: 20,
            base_radius: 0.15,
            initial_velocity: VectorSpread::new(
                Vec3::new(0.0, 0.0003, 0.0),
                Vec3::new(0.00005, 0.00005, 0.00005),
            ),
            initial_acceleration: VectorSpread::constant(Vec3::zeros()),
            lifetime: Spread::new(4000.0, 500.0),
            center_force: 0.0,
            stagger_initial_ages: true,
            sprite_size: [0.5, 0.5],
        }
    }

    /// Check the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a zero count, a lifetime range reaching
    /// zero, or any negative / non-finite parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::NonPositiveCount {
                what: "particle count",
            });
        }
        ensure_non_negative("base radius", self.base_radius)?;
        ensure_non_negative("center force", self.center_force)?;
        ensure_non_negative("sprite width", self.sprite_size[0])?;
        ensure_non_negative("sprite height", self.sprite_size[1])?;
        self.initial_velocity.validate("initial velocity")?;
        self.initial_acceleration.validate("initial acceleration")?;
        self.lifetime.validate_positive("lifetime")
    }
}

/// Direction constraint for random impulses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PerturbDirection {
    /// Uniform over the whole sphere
    Sphere,
    /// Uniform within a cone around `axis`
    Cone {
        /// Cone axis (normalized at use)
        axis: Vec3,
        /// Half opening angle in radians, in `(0, π]`
        half_angle: f32,
    },
}

/// Turbulent buffeting applied to individual particles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Time between impulses on one particle (ms)
    pub interval: Spread,
    /// Largest impulse magnitude (units / ms)
    pub magnitude: f32,
    /// Impulse direction constraint
    pub direction: PerturbDirection,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self::flame()
    }
}

impl PerturbationConfig {
    /// Frequent small kicks that make a flame lick
    pub fn flame() -> Self {
        Self {
            interval: Spread::new(150.0, 50.0),
            magnitude: 0.0002,
            direction: PerturbDirection::Sphere,
        }
    }

    /// Rare strong kicks that scatter sparks
    pub fn sparks() -> Self {
        Self {
            interval: Spread::new(1000.0, 100.0),
            magnitude: 0.0004,
            direction: PerturbDirection::Sphere,
        }
    }

    /// Gentle drift for smoke
    pub fn smoke() -> Self {
        Self {
            interval: Spread::new(500.0, 200.0),
            magnitude: 0.0001,
            direction: PerturbDirection::Sphere,
        }
    }

    /// Disable impulses while keeping a valid schedule
    pub fn none() -> Self {
        Self {
            magnitude: 0.0,
            ..Self::flame()
        }
    }

    /// Check the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the interval range reaches zero, the
    /// magnitude is negative, or a cone has a degenerate axis or angle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval.validate_positive("perturbation interval")?;
        ensure_non_negative("perturbation magnitude", self.magnitude)?;
        if let PerturbDirection::Cone { axis, half_angle } = self.direction {
            let len = axis.norm();
            if !len.is_finite() || len <= f32::EPSILON {
                return Err(ConfigError::InvalidValue {
                    what: "perturbation cone axis length",
                    value: len,
                });
            }
            if !(half_angle > 0.0 && half_angle <= std::f32::consts::PI) {
                return Err(ConfigError::InvalidValue {
                    what: "perturbation cone half angle",
                    value: half_angle,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_presets_are_valid() {
        for cfg in [ParticleConfig::flame(), ParticleConfig::sparks(), ParticleConfig::smoke()] {
            cfg.validate().unwrap();
        }
        for cfg in [
            PerturbationConfig::flame(),
            PerturbationConfig::sparks(),
            PerturbationConfig::smoke(),
            PerturbationConfig::none(),
        ] {
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn test_spread_samples_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let spread = Spread::new(10.0, 2.0);
        for _ in 0..1000 {
            let v = spread.sample(&mut rng);
            assert!((8.0..=12.0).contains(&v));
        }
        assert_eq!(Spread::constant(3.0).sample(&mut rng), 3.0);
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let mut cfg = ParticleConfig::flame();
        cfg.lifetime = Spread::new(100.0, 100.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSpread { what: "lifetime", .. })
        ));

        cfg.lifetime = Spread::new(-5.0, 0.0);
        assert!(cfg.validate().is_err());

        cfg.lifetime = Spread::new(100.0, -1.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_count_rejected() {
        let cfg = ParticleConfig {
            count: 0,
            ..ParticleConfig::flame()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositiveCount {
                what: "particle count"
            })
        );
    }

    #[test]
    fn test_degenerate_cone_rejected() {
        let mut cfg = PerturbationConfig::flame();
        cfg.direction = PerturbDirection::Cone {
            axis: Vec3::zeros(),
            half_angle: 0.5,
        };
        assert!(cfg.validate().is_err());

        cfg.direction = PerturbDirection::Cone {
            axis: Vec3::y(),
            half_angle: 0.0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_vector_spread_contains_its_samples() {
        let mut rng = StdRng::seed_from_u64(9);
        let spread = VectorSpread::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.0, 0.25));
        for _ in 0..200 {
            let v = spread.sample(&mut rng);
            assert!(spread.contains(&v));
            assert_eq!(v.y, 2.0);
        }
    }
}

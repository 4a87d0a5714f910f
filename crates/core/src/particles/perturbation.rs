//! Randomized impulses that make particles buffet
//!
//! Every particle carries an absolute `next_perturb_time`. When the pool clock
//! crosses it, the particle receives one bounded random velocity kick and a new
//! time is drawn from the configured interval. Draws come from the generator
//! handed in by the caller, which is the pool's single seeded stream.

use super::config::{PerturbDirection, PerturbationConfig};
use crate::core_types::{Particle, Vec3};
use crate::error::ConfigError;
use nalgebra::UnitQuaternion;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Applies the configured turbulent impulses
#[derive(Debug, Clone)]
pub struct Perturber {
    config: PerturbationConfig,
    /// Rotation taking +z onto the cone axis, if directions are cone-constrained
    cone_frame: Option<(UnitQuaternion<f32>, f32)>,
}

impl Perturber {
    /// Build a generator from validated configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: PerturbationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cone_frame = match config.direction {
            PerturbDirection::Sphere => None,
            PerturbDirection::Cone { axis, half_angle } => {
                let axis = axis.normalize();
                let rotation = UnitQuaternion::rotation_between(&Vec3::z(), &axis)
                    .unwrap_or_else(|| {
                        // Axis is exactly -z
                        UnitQuaternion::from_axis_angle(&Vec3::x_axis(), PI)
                    });
                Some((rotation, half_angle))
            }
        };
        Ok(Self { config, cone_frame })
    }

    /// Configuration this generator was built from
    pub fn config(&self) -> &PerturbationConfig {
        &self.config
    }

    /// Set the particle's next impulse time, measured from `now`
    pub fn schedule<R: Rng + ?Sized>(&self, particle: &mut Particle, now: f32, rng: &mut R) {
        particle.next_perturb_time = now + self.config.interval.sample(rng);
    }

    /// Apply an impulse if one is due at `now`
    ///
    /// At most one impulse is applied per call; the next one is scheduled
    /// relative to `now`, so a long frame never produces a burst of kicks.
    ///
    /// # Returns
    ///
    /// `true` if the particle was kicked.
    pub fn apply<R: Rng + ?Sized>(&self, particle: &mut Particle, now: f32, rng: &mut R) -> bool {
        if now < particle.next_perturb_time {
            return false;
        }
        particle.velocity += self.impulse(rng);
        self.schedule(particle, now, rng);
        true
    }

    /// Draw one impulse vector
    ///
    /// Magnitude is uniform in `[0, magnitude]`; direction is uniform over the
    /// sphere or the configured cone.
    pub fn impulse<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let magnitude = if self.config.magnitude > 0.0 {
            rng.random_range(0.0..=self.config.magnitude)
        } else {
            0.0
        };

        let min_cos = self
            .cone_frame
            .map_or(-1.0, |(_, half_angle)| half_angle.cos());
        let cos_theta = if min_cos < 1.0 {
            rng.random_range(min_cos..=1.0)
        } else {
            1.0
        };
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = rng.random_range(0.0..TAU);
        let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

        let direction = match self.cone_frame {
            Some((rotation, _)) => rotation * local,
            None => local,
        };
        direction * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::config::Spread;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle() -> Particle {
        Particle::new(Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), 1000.0)
    }

    #[test]
    fn test_impulse_bounded() {
        let perturber = Perturber::new(PerturbationConfig::flame()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let kick = perturber.impulse(&mut rng);
            assert!(kick.norm() <= 0.0002 * 1.0001);
        }
    }

    #[test]
    fn test_cone_constrains_direction() {
        let config = PerturbationConfig {
            interval: Spread::new(100.0, 10.0),
            magnitude: 1.0,
            direction: PerturbDirection::Cone {
                axis: Vec3::new(0.0, 2.0, 0.0),
                half_angle: 0.3,
            },
        };
        let perturber = Perturber::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let kick = perturber.impulse(&mut rng);
            if kick.norm() > 1e-4 {
                let angle = kick.normalize().dot(&Vec3::y()).clamp(-1.0, 1.0).acos();
                assert!(angle <= 0.3 + 1e-3, "angle {angle} outside cone");
            }
        }
    }

    #[test]
    fn test_cone_pointing_down() {
        let config = PerturbationConfig {
            interval: Spread::new(100.0, 10.0),
            magnitude: 1.0,
            direction: PerturbDirection::Cone {
                axis: -Vec3::z(),
                half_angle: 0.1,
            },
        };
        let perturber = Perturber::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            let kick = perturber.impulse(&mut rng);
            assert!(kick.z <= 0.0);
        }
    }

    #[test]
    fn test_apply_only_when_due() {
        let perturber = Perturber::new(PerturbationConfig::flame()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = particle();
        perturber.schedule(&mut p, 0.0, &mut rng);
        let due = p.next_perturb_time();
        assert!((100.0..=200.0).contains(&due));

        assert!(!perturber.apply(&mut p, due - 1.0, &mut rng));
        assert_eq!(p.velocity(), Vec3::zeros());

        assert!(perturber.apply(&mut p, due, &mut rng));
        assert!(p.next_perturb_time() >= due + 100.0);
        assert!(p.next_perturb_time() <= due + 200.0);
    }

    #[test]
    fn test_seeded_streams_repeat() {
        let perturber = Perturber::new(PerturbationConfig::sparks()).unwrap();
        let mut a = StdRng::seed_from_u64(77);
        let mut b = StdRng::seed_from_u64(77);
        for _ in 0..20 {
            assert_eq!(perturber.impulse(&mut a), perturber.impulse(&mut b));
        }
    }
}

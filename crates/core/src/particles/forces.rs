//! External force generators for the host loop
//!
//! The pool never owns the external force; the host computes one vector per
//! frame and passes it to `advect`. These generators are the usual ways of
//! producing that vector. Time is the host's elapsed simulated time in ms.

use crate::core_types::{fbm_temporal, Vec3};
use serde::{Deserialize, Serialize};

/// Source of a time-varying force applied uniformly to a particle population
pub trait ExternalForce {
    /// Force (acceleration, units / ms²) at `elapsed_ms`
    fn force_at(&self, elapsed_ms: f32) -> Vec3;
}

/// A constant vector is a force that ignores time
impl ExternalForce for Vec3 {
    fn force_at(&self, _elapsed_ms: f32) -> Vec3 {
        *self
    }
}

/// Wind that sways back and forth sinusoidally
///
/// `force = amplitude × sin(elapsed × angular_frequency + phase)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinusoidalWind {
    /// Peak force vector
    pub amplitude: Vec3,
    /// Radians per millisecond
    pub angular_frequency: f32,
    /// Phase offset in radians
    pub phase: f32,
}

impl Default for SinusoidalWind {
    fn default() -> Self {
        Self {
            amplitude: Vec3::new(6e-7, 0.0, 0.0),
            angular_frequency: 1.0 / 1000.0,
            phase: 0.0,
        }
    }
}

impl ExternalForce for SinusoidalWind {
    fn force_at(&self, elapsed_ms: f32) -> Vec3 {
        self.amplitude * (elapsed_ms * self.angular_frequency + self.phase).sin()
    }
}

/// Steady wind with smooth random gusts on every axis
///
/// Each axis gets an independent fBm signal in [-1, 1] scaled by
/// `gust_strength` and added to `base`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GustingWind {
    /// Mean force
    pub base: Vec3,
    /// Peak gust deviation per axis
    pub gust_strength: Vec3,
    /// Typical gust duration (ms)
    pub gust_duration: f32,
    /// Noise octaves (1-4 typical)
    pub octaves: u32,
    /// Noise seed
    pub seed: u32,
}

impl Default for GustingWind {
    fn default() -> Self {
        Self {
            base: Vec3::new(2e-7, 0.0, 0.0),
            gust_strength: Vec3::new(4e-7, 1e-7, 2e-7),
            gust_duration: 1500.0,
            octaves: 3,
            seed: 0,
        }
    }
}

impl ExternalForce for GustingWind {
    fn force_at(&self, elapsed_ms: f32) -> Vec3 {
        let scale = self.gust_duration.max(1.0);
        let gust = Vec3::new(
            fbm_temporal(elapsed_ms, scale, self.octaves, 0.5, 0, self.seed),
            fbm_temporal(elapsed_ms, scale, self.octaves, 0.5, 1, self.seed),
            fbm_temporal(elapsed_ms, scale, self.octaves, 0.5, 2, self.seed),
        );
        self.base + gust.component_mul(&self.gust_strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_force() {
        let f = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(f.force_at(0.0), f);
        assert_eq!(f.force_at(12345.0), f);
    }

    #[test]
    fn test_sinusoidal_wind() {
        let wind = SinusoidalWind::default();
        assert_eq!(wind.force_at(0.0), Vec3::zeros());
        let peak = wind.force_at(1000.0 * std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(peak.x, 6e-7, max_relative = 1e-4);
        assert_eq!(peak.y, 0.0);
        let trough = wind.force_at(1000.0 * 3.0 * std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(trough.x, -6e-7, max_relative = 1e-4);
    }

    #[test]
    fn test_gusting_wind_bounded() {
        let wind = GustingWind::default();
        for i in 0..1000 {
            let f = wind.force_at(i as f32 * 17.0);
            let dev = f - wind.base;
            for axis in 0..3 {
                assert!(dev[axis].abs() <= wind.gust_strength[axis] * 1.0001);
            }
        }
    }
}

//! Brightness as a function of normalized particle age
//!
//! A freshly spawned particle sits in the bright flame base and an old one is
//! a fading ember, so every curve starts at its maximum for `age/lifetime = 0`
//! and never increases toward `age/lifetime = 1`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Decay curve mapping normalized age in `[0, 1]` to a brightness weight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DecayCurve {
    /// `1 - x`
    Linear,
    /// `(1 - x)²`, fades faster once the particle leaves the base
    #[default]
    Quadratic,
    /// `1 - smoothstep(x)`, holds brightness then drops
    Smoothstep,
    /// `(e^(-rate·x) - e^(-rate)) / (1 - e^(-rate))`, reaches exactly 0 at x = 1
    Exponential {
        /// Decay rate; larger values darken earlier
        rate: f32,
    },
    /// Piecewise-linear table sampled uniformly over `[0, 1]`
    ///
    /// Plays the role of a decay gradient texture. Must be non-empty, finite,
    /// non-negative and non-increasing.
    Lookup(Vec<f32>),
}

impl DecayCurve {
    /// Brightness weight at `normalized_age` (clamped to `[0, 1]`)
    pub fn evaluate(&self, normalized_age: f32) -> f32 {
        let x = if normalized_age.is_nan() {
            1.0
        } else {
            normalized_age.clamp(0.0, 1.0)
        };
        let weight = match self {
            Self::Linear => 1.0 - x,
            Self::Quadratic => (1.0 - x) * (1.0 - x),
            Self::Smoothstep => 1.0 - x * x * (3.0 - 2.0 * x),
            Self::Exponential { rate } => match exponential_span(*rate) {
                Some(span) => {
                    let rate = f64::from(*rate);
                    (((-rate * f64::from(x)).exp() - (-rate).exp()) / span) as f32
                }
                // Too flat to tell apart from a straight line
                None => 1.0 - x,
            },
            Self::Lookup(table) => match table.len() {
                0 => 0.0,
                1 => table[0],
                n => {
                    let pos = x * (n - 1) as f32;
                    let i = (pos.floor() as usize).min(n - 2);
                    let t = pos - i as f32;
                    table[i] + t * (table[i + 1] - table[i])
                }
            },
        };
        if weight.is_finite() {
            weight.max(0.0)
        } else {
            0.0
        }
    }

    /// Check the curve is usable
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidDecayCurve`] for a non-positive
    /// exponential rate or a malformed lookup table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Linear | Self::Quadratic | Self::Smoothstep => Ok(()),
            Self::Exponential { rate } => {
                if rate.is_finite() && exponential_span(*rate).is_some() {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidDecayCurve(format!(
                        "exponential rate must be positive and resolvable, got {rate}"
                    )))
                }
            }
            Self::Lookup(table) => {
                if table.is_empty() {
                    return Err(ConfigError::InvalidDecayCurve(
                        "lookup table is empty".to_string(),
                    ));
                }
                if let Some(bad) = table.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(ConfigError::InvalidDecayCurve(format!(
                        "lookup table contains invalid weight {bad}"
                    )));
                }
                if let Some(i) = table.windows(2).position(|w| w[1] > w[0]) {
                    return Err(ConfigError::InvalidDecayCurve(format!(
                        "lookup table increases at entry {}",
                        i + 1
                    )));
                }
                Ok(())
            }
        }
    }
}

/// `1 - e^(-rate)` in f64, `None` when it vanishes
fn exponential_span(rate: f32) -> Option<f64> {
    let span = 1.0 - (-f64::from(rate)).exp();
    (span > f64::EPSILON).then_some(span)
}

//! Color-valued SH coefficient vectors

use super::basis::ShBasis;
use crate::core_types::Color;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One color coefficient per basis function
///
/// The length always equals `basis.coefficient_count()`; constructors enforce
/// it and no method changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawShCoefficients")]
pub struct ShCoefficients {
    basis: ShBasis,
    values: Vec<Color>,
}

/// Unchecked wire form, validated through [`ShCoefficients::from_values`]
#[derive(Deserialize)]
struct RawShCoefficients {
    basis: ShBasis,
    values: Vec<Color>,
}

impl TryFrom<RawShCoefficients> for ShCoefficients {
    type Error = ConfigError;

    fn try_from(raw: RawShCoefficients) -> Result<Self, ConfigError> {
        Self::from_values(raw.basis, raw.values)
    }
}

impl ShCoefficients {
    /// All-zero vector for `basis`
    pub fn zeros(basis: ShBasis) -> Self {
        Self {
            basis,
            values: vec![Color::zeros(); basis.coefficient_count()],
        }
    }

    /// Wrap existing coefficients
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if `values` has the wrong length.
    pub fn from_values(basis: ShBasis, values: Vec<Color>) -> Result<Self, ConfigError> {
        basis.ensure_count(values.len())?;
        Ok(Self { basis, values })
    }

    /// Basis the coefficients are expressed in
    pub fn basis(&self) -> ShBasis {
        self.basis
    }

    /// Coefficients in basis index order
    pub fn values(&self) -> &[Color] {
        &self.values
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: every basis has at least one coefficient
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every coefficient is exactly zero
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|c| *c == Color::zeros())
    }

    /// Reset every coefficient to zero
    pub fn clear(&mut self) {
        self.values.fill(Color::zeros());
    }

    /// Multiply every coefficient by `factor`
    pub fn scale(&mut self, factor: f32) {
        for value in &mut self.values {
            *value *= factor;
        }
    }

    /// Add `weights[i] × color` to coefficient `i`
    pub(crate) fn add_weighted(&mut self, weights: &[f32], color: Color) {
        debug_assert_eq!(weights.len(), self.values.len());
        for (value, weight) in self.values.iter_mut().zip(weights) {
            *value += color * *weight;
        }
    }

    /// Element-wise add `other` into `self`
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if the bases differ; `self` is
    /// left untouched.
    pub fn accumulate(&mut self, other: &ShCoefficients) -> Result<(), ConfigError> {
        self.basis.ensure_count(other.len())?;
        for (value, add) in self.values.iter_mut().zip(&other.values) {
            *value += add;
        }
        Ok(())
    }

    /// Largest absolute channel difference to `other` (∞ on basis mismatch)
    pub fn max_abs_diff(&self, other: &ShCoefficients) -> f32 {
        if self.basis != other.basis {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs().max())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let err = serde_json::from_str::<ShCoefficients>(r#"{"basis":2,"values":[[1,0,0]]}"#);
        assert!(err.is_err());

        let basis = ShBasis::new(2).unwrap();
        let mut valid = ShCoefficients::zeros(basis);
        valid.values[1] = Color::new(0.5, 0.25, 0.0);
        let json = serde_json::to_string(&valid).unwrap();
        let back: ShCoefficients = serde_json::from_str(&json).unwrap();
        assert_eq!(back, valid);
    }

    #[test]
    fn test_zeros_length_matches_basis() {
        for bands in 1..=5 {
            let basis = ShBasis::new(bands).unwrap();
            let c = ShCoefficients::zeros(basis);
            assert_eq!(c.len(), (bands * bands) as usize);
            assert!(c.is_zero());
        }
    }

    #[test]
    fn test_from_values_checks_length() {
        let basis = ShBasis::new(2).unwrap();
        assert!(ShCoefficients::from_values(basis, vec![Color::zeros(); 4]).is_ok());
        assert_eq!(
            ShCoefficients::from_values(basis, vec![Color::zeros(); 9]),
            Err(ConfigError::BasisMismatch {
                expected: 4,
                found: 9
            })
        );
    }

    #[test]
    fn test_accumulate() {
        let basis = ShBasis::new(2).unwrap();
        let mut a = ShCoefficients::from_values(basis, vec![Color::new(1.0, 0.0, 0.0); 4]).unwrap();
        let b = ShCoefficients::from_values(basis, vec![Color::new(0.0, 2.0, 0.0); 4]).unwrap();
        a.accumulate(&b).unwrap();
        assert!(a.values().iter().all(|c| *c == Color::new(1.0, 2.0, 0.0)));

        let other = ShCoefficients::zeros(ShBasis::new(3).unwrap());
        assert!(a.accumulate(&other).is_err());
        assert!(a.values().iter().all(|c| *c == Color::new(1.0, 2.0, 0.0)));
        assert_eq!(a.max_abs_diff(&other), f32::INFINITY);
    }

    #[test]
    fn test_scale_and_clear() {
        let basis = ShBasis::new(1).unwrap();
        let mut c = ShCoefficients::from_values(basis, vec![Color::new(1.0, 2.0, 3.0)]).unwrap();
        c.scale(2.0);
        assert_eq!(c.values()[0], Color::new(2.0, 4.0, 6.0));
        c.clear();
        assert!(c.is_zero());
    }
}

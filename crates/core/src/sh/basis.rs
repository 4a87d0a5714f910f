//! Real spherical-harmonic basis
//!
//! Orthonormal real SH `Y_l^m` for bands `l = 0..bands`, flattened with index
//! `l(l+1) + m`. Directions use the polar convention `theta = acos(z)`,
//! `phi = atan2(y, x)` in the receiver's local frame.
//!
//! ```text
//! Y_l^m  = √2 · K_l^m · cos(mφ) · P_l^m(cos θ)     m > 0
//! Y_l^0  =      K_l^0 ·           P_l^0(cos θ)
//! Y_l^m  = √2 · K_l^m · sin(-mφ) · P_l^-m(cos θ)   m < 0
//! K_l^m  = √((2l+1)/(4π) · (l-|m|)!/(l+|m|)!)
//! ```
//!
//! Associated Legendre polynomials use the standard three-term recurrence.
//! Everything is computed in f64 and narrowed on output.

use crate::core_types::Vec3;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

/// Largest supported band count (64 coefficients)
pub const MAX_BANDS: u32 = 8;

/// Band count used when none is configured (25 coefficients)
pub const DEFAULT_BANDS: u32 = 5;

/// Directions shorter than this have no defined spherical angle
pub const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// Truncated SH basis shared by the projector and every consumer
///
/// Both sides of the lighting pipeline must hold an equal `ShBasis`; the
/// coefficient count (`bands²`) is derived from it rather than stored
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ShBasis {
    bands: u32,
}

impl Default for ShBasis {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS,
        }
    }
}

impl TryFrom<u32> for ShBasis {
    type Error = ConfigError;

    fn try_from(bands: u32) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<ShBasis> for u32 {
    fn from(basis: ShBasis) -> Self {
        basis.bands
    }
}

impl ShBasis {
    /// Basis with `bands` bands (`l = 0..bands`)
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBasis`] outside `1..=MAX_BANDS`.
    pub fn new(bands: u32) -> Result<Self, ConfigError> {
        if (1..=MAX_BANDS).contains(&bands) {
            Ok(Self { bands })
        } else {
            Err(ConfigError::InvalidBasis {
                bands,
                max: MAX_BANDS,
            })
        }
    }

    /// Number of bands
    pub fn bands(&self) -> u32 {
        self.bands
    }

    /// Number of coefficients (`bands²`)
    pub fn coefficient_count(&self) -> usize {
        (self.bands * self.bands) as usize
    }

    /// Flat index of `Y_l^m`
    pub fn index(l: u32, m: i32) -> usize {
        (i64::from(l) * (i64::from(l) + 1) + i64::from(m)) as usize
    }

    /// Check that a coefficient count produced elsewhere matches this basis
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] when the counts differ.
    pub fn ensure_count(&self, found: usize) -> Result<(), ConfigError> {
        if found == self.coefficient_count() {
            Ok(())
        } else {
            Err(ConfigError::BasisMismatch {
                expected: self.coefficient_count(),
                found,
            })
        }
    }

    /// Write every basis value at `(theta, phi)` into `out`
    ///
    /// `out` must hold at least [`ShBasis::coefficient_count`] entries.
    pub fn evaluate_into(&self, theta: f32, phi: f32, out: &mut [f32]) {
        debug_assert!(out.len() >= self.coefficient_count());
        let theta = f64::from(theta);
        let phi = f64::from(phi);
        for l in 0..self.bands {
            let l_signed = l as i32;
            for m in -l_signed..=l_signed {
                out[Self::index(l, m)] = sh(l, m, theta, phi) as f32;
            }
        }
    }

    /// Every basis value at `(theta, phi)`
    pub fn evaluate(&self, theta: f32, phi: f32) -> Vec<f32> {
        let mut out = vec![0.0; self.coefficient_count()];
        self.evaluate_into(theta, phi, &mut out);
        out
    }

    /// Every basis value along `direction`, or `None` for a zero vector
    pub fn evaluate_direction(&self, direction: &Vec3) -> Option<Vec<f32>> {
        let (theta, phi) = to_spherical(direction)?;
        Some(self.evaluate(theta, phi))
    }
}

/// `(theta, phi)` of a direction, or `None` if it is (near) zero
pub fn to_spherical(direction: &Vec3) -> Option<(f32, f32)> {
    let len = direction.norm();
    if !len.is_finite() || len <= MIN_DIRECTION_LENGTH {
        return None;
    }
    let theta = (direction.z / len).clamp(-1.0, 1.0).acos();
    let phi = direction.y.atan2(direction.x);
    Some((theta, phi))
}

/// Unit direction for spherical angles
pub fn from_spherical(theta: f32, phi: f32) -> Vec3 {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// Single real SH basis function `Y_l^m(theta, phi)`
pub fn sh(l: u32, m: i32, theta: f64, phi: f64) -> f64 {
    let x = theta.cos();
    let abs_m = m.unsigned_abs();
    match m.cmp(&0) {
        std::cmp::Ordering::Equal => normalization(l, 0) * legendre(l, 0, x),
        std::cmp::Ordering::Greater => {
            SQRT_2 * normalization(l, abs_m) * (f64::from(m) * phi).cos() * legendre(l, abs_m, x)
        }
        std::cmp::Ordering::Less => {
            let azimuth = (f64::from(abs_m) * phi).sin();
            SQRT_2 * normalization(l, abs_m) * azimuth * legendre(l, abs_m, x)
        }
    }
}

/// `K_l^m` for `m ≥ 0`
fn normalization(l: u32, m: u32) -> f64 {
    // (l-m)! / (l+m)! as a product of reciprocals
    let ratio: f64 = ((l - m + 1)..=(l + m)).map(|i| 1.0 / f64::from(i)).product();
    ((2.0 * f64::from(l) + 1.0) / (4.0 * PI) * ratio).sqrt()
}

/// Associated Legendre polynomial `P_l^m(x)` for `0 ≤ m ≤ l`
fn legendre(l: u32, m: u32, x: f64) -> f64 {
    let mut pmm = 1.0;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
        let mut fact = 1.0;
        for _ in 1..=m {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return pmm;
    }

    let mut pmmp1 = x * (2.0 * f64::from(m) + 1.0) * pmm;
    if l == m + 1 {
        return pmmp1;
    }

    let mut pll = 0.0;
    for ll in (m + 2)..=l {
        let ll = f64::from(ll);
        let mf = f64::from(m);
        pll = ((2.0 * ll - 1.0) * x * pmmp1 - (ll + mf - 1.0) * pmm) / (ll - mf);
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basis_validation() {
        assert!(ShBasis::new(0).is_err());
        assert!(ShBasis::new(MAX_BANDS + 1).is_err());
        assert_eq!(ShBasis::new(3).unwrap().coefficient_count(), 9);
        assert_eq!(ShBasis::default().coefficient_count(), 25);
    }

    #[test]
    fn test_index_layout() {
        assert_eq!(ShBasis::index(0, 0), 0);
        assert_eq!(ShBasis::index(1, -1), 1);
        assert_eq!(ShBasis::index(1, 1), 3);
        assert_eq!(ShBasis::index(2, -2), 4);
        assert_eq!(ShBasis::index(4, 4), 24);
    }

    #[test]
    fn test_known_values() {
        let c0 = 0.282_094_8;
        let c1 = 0.488_602_5;
        // +z
        let basis = ShBasis::new(2).unwrap();
        let v = basis.evaluate(0.0, 0.0);
        assert_relative_eq!(v[0], c0, epsilon = 1e-6);
        assert_relative_eq!(v[2], c1, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[3], 0.0, epsilon = 1e-6);

        // +x: only the m = 1 linear term is non-zero
        let v = basis.evaluate_direction(&Vec3::x()).unwrap();
        assert_relative_eq!(v[3].abs(), c1, epsilon = 1e-6);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_addition_theorem() {
        // Σ_m Y_lm(ω)² = (2l+1)/(4π) for every direction
        let basis = ShBasis::new(MAX_BANDS).unwrap();
        for (theta, phi) in [(0.3, 1.2), (1.7, -2.5), (2.9, 0.1), (0.0, 0.0)] {
            let v = basis.evaluate(theta, phi);
            for l in 0..MAX_BANDS {
                let li = l as i32;
                let sum: f32 = (-li..=li).map(|m| v[ShBasis::index(l, m)].powi(2)).sum();
                let expected = (2.0 * l as f32 + 1.0) / (4.0 * std::f32::consts::PI);
                assert_relative_eq!(sum, expected, max_relative = 1e-4);
            }
        }
    }

    #[test]
    fn test_orthonormality() {
        let basis = ShBasis::new(3).unwrap();
        let n = basis.coefficient_count();
        let rows = 96;
        let cols = 192;
        let d_theta = std::f64::consts::PI / f64::from(rows);
        let d_phi = 2.0 * std::f64::consts::PI / f64::from(cols);
        let mut gram = vec![0.0f64; n * n];
        for i in 0..rows {
            let theta = (f64::from(i) + 0.5) * d_theta;
            for j in 0..cols {
                let phi = (f64::from(j) + 0.5) * d_phi;
                let v = basis.evaluate(theta as f32, phi as f32);
                let w = theta.sin() * d_theta * d_phi;
                for a in 0..n {
                    for b in 0..n {
                        gram[a * n + b] += f64::from(v[a]) * f64::from(v[b]) * w;
                    }
                }
            }
        }
        for a in 0..n {
            for b in 0..n {
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!(
                    (gram[a * n + b] - expected).abs() < 1e-2,
                    "<Y{a}, Y{b}> = {}",
                    gram[a * n + b]
                );
            }
        }
    }

    #[test]
    fn test_spherical_round_trip() {
        let dir = Vec3::new(0.3, -0.4, 0.5).normalize();
        let (theta, phi) = to_spherical(&dir).unwrap();
        let back = from_spherical(theta, phi);
        assert_relative_eq!(back, dir, epsilon = 1e-5);
        assert!(to_spherical(&Vec3::zeros()).is_none());
    }

    #[test]
    fn test_serde_validates_bands() {
        let basis: ShBasis = serde_json::from_str("4").unwrap();
        assert_eq!(basis.bands(), 4);
        assert!(serde_json::from_str::<ShBasis>("0").is_err());
        assert_eq!(serde_json::to_string(&basis).unwrap(), "4");
    }
}

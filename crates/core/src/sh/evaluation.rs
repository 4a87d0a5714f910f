//! Reconstructing radiance from SH coefficients

use super::basis::{to_spherical, ShBasis};
use super::coefficients::ShCoefficients;
use crate::core_types::{Color, Vec3};
use rayon::prelude::*;

/// Radiance arriving from direction `(theta, phi)` in the receiver frame
///
/// Negative lobes are returned as-is; clamping is left to the caller.
pub fn evaluate(coefficients: &ShCoefficients, theta: f32, phi: f32) -> Color {
    let weights = coefficients.basis().evaluate(theta, phi);
    coefficients
        .values()
        .iter()
        .zip(&weights)
        .fold(Color::zeros(), |acc, (c, w)| acc + c * *w)
}

/// Radiance arriving from `direction` (need not be normalized)
///
/// A zero-length direction yields black.
pub fn evaluate_direction(coefficients: &ShCoefficients, direction: &Vec3) -> Color {
    to_spherical(direction).map_or(Color::zeros(), |(theta, phi)| {
        evaluate(coefficients, theta, phi)
    })
}

/// Scalar function sampled over a latitude/longitude grid
///
/// Rows run over `theta ∈ (0, π)` and columns over `phi ∈ (0, 2π)`, both at
/// cell midpoints, so a plot of resolution `r` holds `r × 2r` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SpherePlot {
    resolution: usize,
    samples: Vec<f32>,
}

impl SpherePlot {
    /// Sample `f(theta, phi)` over the sphere, rows in parallel
    pub fn sample<F>(resolution: usize, f: F) -> Self
    where
        F: Fn(f32, f32) -> f32 + Sync,
    {
        let resolution = resolution.max(1);
        let columns = 2 * resolution;
        let mut samples = vec![0.0; resolution * columns];

        samples
            .par_chunks_mut(columns)
            .enumerate()
            .for_each(|(row, out)| {
                let theta = Self::theta_at(resolution, row);
                for (col, value) in out.iter_mut().enumerate() {
                    *value = f(theta, Self::phi_at(resolution, col));
                }
            });

        Self { resolution, samples }
    }

    /// Sample one channel of an SH lighting environment
    pub fn from_coefficients(
        coefficients: &ShCoefficients,
        channel: usize,
        resolution: usize,
    ) -> Self {
        let basis: ShBasis = coefficients.basis();
        let values = coefficients.values();
        Self::sample(resolution, |theta, phi| {
            basis
                .evaluate(theta, phi)
                .iter()
                .zip(values)
                .map(|(w, c)| w * c[channel.min(2)])
                .sum()
        })
    }

    fn theta_at(resolution: usize, row: usize) -> f32 {
        (row as f32 + 0.5) / resolution as f32 * std::f32::consts::PI
    }

    fn phi_at(resolution: usize, col: usize) -> f32 {
        (col as f32 + 0.5) / resolution as f32 * std::f32::consts::PI
    }

    /// Number of theta rows
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of phi columns
    pub fn columns(&self) -> usize {
        2 * self.resolution
    }

    /// Raw samples, row-major
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.resolution || col >= self.columns() {
            return None;
        }
        self.samples.get(row * self.columns() + col).copied()
    }

    /// Largest sample
    pub fn max(&self) -> f32 {
        self.samples.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Smallest sample
    pub fn min(&self) -> f32 {
        self.samples.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Solid-angle weighted mean over the sphere
    pub fn mean(&self) -> f32 {
        let columns = self.columns();
        let mut total = 0.0;
        let mut weight = 0.0;
        for (row, values) in self.samples.chunks(columns).enumerate() {
            let w = Self::theta_at(self.resolution, row).sin();
            total += w * values.iter().sum::<f32>();
            weight += w * columns as f32;
        }
        if weight > 0.0 {
            total / weight
        } else {
            0.0
        }
    }

    /// Polar plot vertices: each sample direction scaled by `|value|`
    ///
    /// Negative lobes keep their sign in the second tuple element so callers
    /// can color them differently.
    pub fn vertices(&self) -> Vec<(Vec3, bool)> {
        let columns = self.columns();
        self.samples
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let theta = Self::theta_at(self.resolution, i / columns);
                let phi = Self::phi_at(self.resolution, i % columns);
                (
                    super::basis::from_spherical(theta, phi) * value.abs(),
                    *value >= 0.0,
                )
            })
            .collect()
    }
}

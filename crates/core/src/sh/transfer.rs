//! Precomputed radiance transfer receivers
//!
//! A receiver stores, per vertex, one transfer coefficient per basis
//! function. Shading a vertex is a dot product of its transfer vector with the
//! current lighting environment. Producing transfer vectors is an offline step
//! and out of scope here; receivers are built from already-baked data.

use super::basis::ShBasis;
use super::coefficients::ShCoefficients;
use crate::core_types::Color;
use crate::error::ConfigError;
use rayon::prelude::*;
use tracing::warn;

/// Geometry with baked per-vertex SH transfer vectors
#[derive(Debug, Clone)]
pub struct PrtReceiver {
    basis: ShBasis,
    transfers: Vec<Vec<f32>>,
}

impl PrtReceiver {
    /// Wrap baked transfer vectors
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if any vertex has a transfer
    /// vector of the wrong length.
    pub fn new(basis: ShBasis, transfers: Vec<Vec<f32>>) -> Result<Self, ConfigError> {
        for transfer in &transfers {
            basis.ensure_count(transfer.len())?;
        }
        Ok(Self { basis, transfers })
    }

    /// Basis the transfer vectors were baked in
    pub fn basis(&self) -> ShBasis {
        self.basis
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.transfers.len()
    }

    /// Verify this receiver can be shaded by lighting in `basis`
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if the coefficient counts differ.
    pub fn check_compatible(&self, basis: ShBasis) -> Result<(), ConfigError> {
        basis.ensure_count(self.basis.coefficient_count())
    }

    /// Outgoing radiance of one vertex, `None` if out of range
    pub fn shade_vertex(&self, vertex: usize, environment: &ShCoefficients) -> Option<Color> {
        let transfer = self.transfers.get(vertex)?;
        Some(dot(transfer, environment))
    }

    /// Outgoing radiance of every vertex
    ///
    /// A mismatched environment shades every vertex black.
    pub fn shade(&self, environment: &ShCoefficients) -> Vec<Color> {
        if environment.basis() != self.basis {
            warn!(
                "Receiver baked with {} coefficients cannot use an environment with {}",
                self.basis.coefficient_count(),
                environment.len()
            );
            return vec![Color::zeros(); self.transfers.len()];
        }
        self.transfers
            .par_iter()
            .map(|transfer| dot(transfer, environment))
            .collect()
    }
}

fn dot(transfer: &[f32], environment: &ShCoefficients) -> Color {
    transfer
        .iter()
        .zip(environment.values())
        .fold(Color::zeros(), |acc, (t, c)| acc + c * *t)
}

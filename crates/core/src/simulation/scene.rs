//! Several emitters lighting one receiver
//!
//! The scene owns the SH basis every lit emitter must share, the receiver's
//! shading frame and the global lighting environment. The environment is
//! rebuilt from zero every frame as the element-wise sum of each emitter's SH
//! coefficients, so it never accumulates rounding drift.

use super::emitter::{EmitterConfig, FireEmitter};
use crate::core_types::{Color, Vec3};
use crate::error::ConfigError;
use crate::particles::ExternalForce;
use crate::sh::{evaluate, PrtReceiver, ShBasis, ShCoefficients, ShadingFrame, SpherePlot};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// Scene-wide settings and the emitters to build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Basis of the global environment and every attached receiver
    pub basis: ShBasis,
    /// Constant light added by receivers on top of the SH environment
    pub ambient: Color,
    /// World-space frame of the shaded geometry
    pub receiver_frame: ShadingFrame,
    /// Emitters built in order
    pub emitters: Vec<EmitterConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            basis: ShBasis::default(),
            ambient: Color::new(0.05, 0.05, 0.05),
            receiver_frame: ShadingFrame::at(Vec3::new(0.0, -0.5, 0.0)),
            emitters: vec![
                EmitterConfig::flame(),
                EmitterConfig::sparks(),
                EmitterConfig::smoke(),
            ],
        }
    }
}

impl SceneConfig {
    /// Give every emitter a distinct seed derived from `seed`
    pub fn with_seed(mut self, seed: u64) -> Self {
        for (i, emitter) in self.emitters.iter_mut().enumerate() {
            emitter.seed = Some(seed.wrapping_add(i as u64));
        }
        self
    }
}

/// A set of fire emitters and the environment they produce
#[derive(Debug, Clone)]
pub struct FireScene {
    basis: ShBasis,
    ambient: Color,
    receiver_frame: ShadingFrame,
    emitters: Vec<FireEmitter>,
    receivers: Vec<PrtReceiver>,
    environment: ShCoefficients,
    /// Simulated time since construction (ms)
    elapsed: f32,
    frames: u64,
}

impl FireScene {
    /// Build every configured emitter
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any emitter is invalid or projects into a
    /// basis other than `config.basis`.
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        let SceneConfig {
            basis,
            ambient,
            receiver_frame,
            emitters,
        } = config;

        let mut scene = Self {
            basis,
            ambient,
            receiver_frame,
            emitters: Vec::with_capacity(emitters.len()),
            receivers: Vec::new(),
            environment: ShCoefficients::zeros(basis),
            elapsed: 0.0,
            frames: 0,
        };
        for emitter in emitters {
            scene.add_emitter(emitter)?;
        }

        info!(
            "Fire scene ready: {} emitters, {} SH bands ({} coefficients)",
            scene.emitters.len(),
            basis.bands(),
            basis.coefficient_count()
        );
        Ok(scene)
    }

    /// Build and add one emitter, returning its index
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if the emitter projects into a
    /// different basis, or any error from [`FireEmitter::new`].
    pub fn add_emitter(&mut self, config: EmitterConfig) -> Result<usize, ConfigError> {
        let emitter = FireEmitter::new(config)?;
        if let Some(basis) = emitter.basis() {
            self.basis.ensure_count(basis.coefficient_count())?;
        }
        self.emitters.push(emitter);
        Ok(self.emitters.len() - 1)
    }

    /// Attach a receiver, returning its index
    ///
    /// # Errors
    /// Returns [`ConfigError::BasisMismatch`] if the receiver was baked in a
    /// different basis.
    pub fn attach_receiver(&mut self, receiver: PrtReceiver) -> Result<usize, ConfigError> {
        receiver.check_compatible(self.basis)?;
        self.receivers.push(receiver);
        Ok(self.receivers.len() - 1)
    }

    /// Advance every emitter by `dt` ms and rebuild the environment
    ///
    /// The force is sampled once per frame at the scene's elapsed time. A
    /// non-positive or non-finite `dt` leaves the scene unchanged.
    pub fn step<F: ExternalForce + ?Sized>(&mut self, dt: f32, force: &F) -> &ShCoefficients {
        if !(dt.is_finite() && dt > 0.0) {
            trace!("Skipping scene step for dt={}", dt);
            return &self.environment;
        }

        let external = force.force_at(self.elapsed);
        for emitter in &mut self.emitters {
            emitter.step(dt, external, &self.receiver_frame);
        }

        self.environment.clear();
        for coefficients in self.emitters.iter().filter_map(FireEmitter::sh_coefficients) {
            if let Err(err) = self.environment.accumulate(coefficients) {
                warn!("Dropping emitter environment: {}", err);
            }
        }

        self.elapsed += dt;
        self.frames += 1;
        trace!(
            "Scene frame {} at {:.1}ms, force=({:.2e}, {:.2e}, {:.2e})",
            self.frames,
            self.elapsed,
            external.x,
            external.y,
            external.z
        );
        &self.environment
    }

    /// Global SH environment from the last step
    pub fn environment(&self) -> &ShCoefficients {
        &self.environment
    }

    /// Shared SH basis
    pub fn basis(&self) -> ShBasis {
        self.basis
    }

    /// Ambient light added to receiver shading
    pub fn ambient(&self) -> Color {
        self.ambient
    }

    /// Frame of the shaded geometry
    pub fn receiver_frame(&self) -> &ShadingFrame {
        &self.receiver_frame
    }

    /// Move or rotate the shaded geometry; applies from the next step
    pub fn set_receiver_frame(&mut self, frame: ShadingFrame) {
        self.receiver_frame = frame;
    }

    /// Emitters in insertion order
    pub fn emitters(&self) -> &[FireEmitter] {
        &self.emitters
    }

    /// Emitter at `index`
    pub fn emitter(&self, index: usize) -> Option<&FireEmitter> {
        self.emitters.get(index)
    }

    /// Mutable emitter at `index`, for runtime intensity changes
    pub fn emitter_mut(&mut self, index: usize) -> Option<&mut FireEmitter> {
        self.emitters.get_mut(index)
    }

    /// Attached receivers
    pub fn receivers(&self) -> &[PrtReceiver] {
        &self.receivers
    }

    /// Per-vertex colors of receiver `index`: transfer · environment + ambient
    pub fn shade_receiver(&self, index: usize) -> Option<Vec<Color>> {
        let receiver = self.receivers.get(index)?;
        Some(
            receiver
                .shade(&self.environment)
                .into_iter()
                .map(|c| c + self.ambient)
                .collect(),
        )
    }

    /// Simulated time since construction (ms)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Completed steps
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `(theta, phi) → radiance` over the current environment
    ///
    /// Returns the red channel divided by the intensity of the first lit SH
    /// emitter, so a plot stays the same scale while the flame is dimmed or
    /// brightened.
    pub fn radiance_sampler(&self) -> impl Fn(f32, f32) -> f32 + Sync + '_ {
        let scale = self
            .emitters
            .iter()
            .filter(|e| e.sh_coefficients().is_some())
            .find_map(FireEmitter::intensity)
            .filter(|i| *i > 0.0)
            .map_or(1.0, |i| 1.0 / i);
        move |theta, phi| evaluate(&self.environment, theta, phi).x * scale
    }

    /// Sample [`radiance_sampler`](Self::radiance_sampler) over a sphere grid
    pub fn sample_sphere(&self, resolution: usize) -> SpherePlot {
        SpherePlot::sample(resolution, self.radiance_sampler())
    }
}

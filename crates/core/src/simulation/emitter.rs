//! A single fire effect: one particle pool and its lights
//!
//! Each frame the emitter advects its pool, regroups the particles into light
//! clumps and converts the clumps into whichever light representation it was
//! configured with. Flames usually project into the scene's SH environment;
//! sparks and smoke are often unlit and only contribute sprites.

use super::export::SpriteInstance;
use crate::core_types::Vec3;
use crate::error::{ensure_non_negative, ConfigError};
use crate::lighting::{
    export_point_lights, ClumpConfig, DecayCurve, LightClump, LightClusterer, PointLight,
    DEFAULT_MAX_POINT_LIGHTS,
};
use crate::particles::{ParticleConfig, ParticlePool, PerturbationConfig};
use crate::sh::{ProjectionNormalization, ShBasis, ShCoefficients, ShProjector, ShadingFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How an emitter's clumps reach the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightingMode {
    /// One point light per clump for a direct-lighting consumer
    PointLights {
        /// Most lights the consumer accepts
        max_lights: usize,
    },
    /// Projection into an SH environment for a PRT consumer
    SphericalHarmonics {
        /// Basis shared with the consumer
        basis: ShBasis,
        /// Per-light projection scale
        normalization: ProjectionNormalization,
    },
}

impl Default for LightingMode {
    fn default() -> Self {
        Self::SphericalHarmonics {
            basis: ShBasis::default(),
            normalization: ProjectionNormalization::default(),
        }
    }
}

impl LightingMode {
    /// Point lights capped at the default consumer limit
    pub fn point_lights() -> Self {
        Self::PointLights {
            max_lights: DEFAULT_MAX_POINT_LIGHTS,
        }
    }
}

/// Clustering and output settings of a lit emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Clump layout, hopping and decay
    pub clumps: ClumpConfig,
    /// Global brightness multiplier, adjustable at runtime
    pub intensity: f32,
    /// Point lights or SH projection
    pub mode: LightingMode,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            clumps: ClumpConfig::default(),
            intensity: 1.0,
            mode: LightingMode::default(),
        }
    }
}

/// Everything needed to build a [`FireEmitter`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Label used in logs
    pub name: String,
    /// Pool size and spawn distributions
    pub particles: ParticleConfig,
    /// Random velocity kicks
    pub perturbation: PerturbationConfig,
    /// `None` for sprite-only effects
    pub lighting: Option<LightingConfig>,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// World-space position of the emitter base
    pub origin: Vec3,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self::flame()
    }
}

impl EmitterConfig {
    /// Lit flame body
    pub fn flame() -> Self {
        Self {
            name: "flame".to_string(),
            particles: ParticleConfig::flame(),
            perturbation: PerturbationConfig::flame(),
            lighting: Some(LightingConfig::default()),
            seed: None,
            origin: Vec3::zeros(),
        }
    }

    /// Unlit sparks thrown out of the flame
    pub fn sparks() -> Self {
        Self {
            name: "sparks".to_string(),
            particles: ParticleConfig::sparks(),
            perturbation: PerturbationConfig::sparks(),
            lighting: None,
            seed: None,
            origin: Vec3::zeros(),
        }
    }

    /// Unlit smoke above the flame
    pub fn smoke() -> Self {
        Self {
            name: "smoke".to_string(),
            particles: ParticleConfig::smoke(),
            perturbation: PerturbationConfig::smoke(),
            lighting: None,
            seed: None,
            origin: Vec3::new(0.0, 0.5, 0.0),
        }
    }

    /// Same preset with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone)]
enum LightOutput {
    PointLights {
        max_lights: usize,
        lights: Vec<PointLight>,
    },
    SphericalHarmonics {
        projector: ShProjector,
        coefficients: ShCoefficients,
    },
}

#[derive(Debug, Clone)]
struct Lighting {
    clusterer: LightClusterer,
    intensity: f32,
    output: LightOutput,
}

/// One particle effect with optional lighting
#[derive(Debug, Clone)]
pub struct FireEmitter {
    name: String,
    origin: Vec3,
    pool: ParticlePool,
    lighting: Option<Lighting>,
    /// Opacity curve for sprites
    decay: DecayCurve,
}

impl FireEmitter {
    /// Build the pool and, for lit emitters, the clusterer and light output
    ///
    /// # Errors
    /// Returns [`ConfigError`] for invalid particle, perturbation or clump
    /// settings, a negative intensity, or more clumps than `max_lights`.
    pub fn new(config: EmitterConfig) -> Result<Self, ConfigError> {
        let EmitterConfig {
            name,
            particles,
            perturbation,
            lighting,
            seed,
            origin,
        } = config;

        let pool = ParticlePool::new(particles, perturbation, seed)?;
        let decay = lighting
            .as_ref()
            .map(|l| l.clumps.decay.clone())
            .unwrap_or_default();

        let lighting = match lighting {
            Some(config) => Some(Self::build_lighting(config, pool.len())?),
            None => None,
        };

        info!(
            "Emitter '{}' at ({:.2}, {:.2}, {:.2}): {} particles, lighting={}",
            name,
            origin.x,
            origin.y,
            origin.z,
            pool.len(),
            match lighting.as_ref().map(|l| &l.output) {
                None => "none",
                Some(LightOutput::PointLights { .. }) => "point lights",
                Some(LightOutput::SphericalHarmonics { .. }) => "spherical harmonics",
            }
        );

        Ok(Self {
            name,
            origin,
            pool,
            lighting,
            decay,
        })
    }

    fn build_lighting(config: LightingConfig, capacity: usize) -> Result<Lighting, ConfigError> {
        ensure_non_negative("intensity", config.intensity)?;
        let clump_count = config.clumps.clump_count;
        let output = match config.mode {
            LightingMode::PointLights { max_lights } => {
                if max_lights == 0 {
                    return Err(ConfigError::NonPositiveCount { what: "max_lights" });
                }
                if clump_count > max_lights {
                    return Err(ConfigError::TooManyLights {
                        requested: clump_count,
                        max: max_lights,
                    });
                }
                LightOutput::PointLights {
                    max_lights,
                    lights: Vec::with_capacity(clump_count),
                }
            }
            LightingMode::SphericalHarmonics {
                basis,
                normalization,
            } => LightOutput::SphericalHarmonics {
                projector: ShProjector::new(basis, normalization),
                coefficients: ShCoefficients::zeros(basis),
            },
        };

        Ok(Lighting {
            clusterer: LightClusterer::new(config.clumps, capacity)?,
            intensity: config.intensity,
            output,
        })
    }

    /// Advance one frame
    ///
    /// `external_force` is applied uniformly to every particle. `frame` is the
    /// world-space receiver frame used for SH projection.
    pub fn step(&mut self, dt: f32, external_force: Vec3, frame: &ShadingFrame) {
        self.pool.advect(dt, external_force);

        let Some(lighting) = self.lighting.as_mut() else {
            return;
        };
        lighting.clusterer.update(dt, self.pool.particles());
        let clumps = lighting.clusterer.clumps();

        match &mut lighting.output {
            LightOutput::PointLights { lights, .. } => {
                export_point_lights(clumps, self.origin, lighting.intensity, lights);
            }
            LightOutput::SphericalHarmonics {
                projector,
                coefficients,
            } => {
                coefficients.clear();
                projector.project_into(
                    clumps,
                    &frame.relative_to(self.origin),
                    lighting.intensity,
                    coefficients,
                );
            }
        }
    }

    /// Replace the brightness multiplier
    ///
    /// Negative or non-finite values are clamped to zero. Unlit emitters
    /// ignore the call. Takes effect on the next [`step`](Self::step).
    pub fn set_intensity(&mut self, intensity: f32) {
        let Some(lighting) = self.lighting.as_mut() else {
            debug!("Emitter '{}' is unlit, ignoring intensity {}", self.name, intensity);
            return;
        };
        let clamped = if intensity.is_finite() && intensity >= 0.0 {
            intensity
        } else {
            warn!(
                "Emitter '{}': intensity {} clamped to 0",
                self.name, intensity
            );
            0.0
        };
        debug!(
            "Emitter '{}': intensity {:.3} -> {:.3}",
            self.name, lighting.intensity, clamped
        );
        lighting.intensity = clamped;
    }

    /// Add `delta` to the brightness multiplier (clamped at zero)
    pub fn adjust_intensity(&mut self, delta: f32) {
        if let Some(current) = self.intensity() {
            self.set_intensity(current + delta);
        }
    }

    /// Current brightness multiplier, `None` when unlit
    pub fn intensity(&self) -> Option<f32> {
        self.lighting.as_ref().map(|l| l.intensity)
    }

    /// Label from the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World-space base position
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Underlying particle pool
    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Whether the emitter produces light
    pub fn is_lit(&self) -> bool {
        self.lighting.is_some()
    }

    /// Clusterer of a lit emitter
    pub fn clusterer(&self) -> Option<&LightClusterer> {
        self.lighting.as_ref().map(|l| &l.clusterer)
    }

    /// Current clumps (empty when unlit)
    pub fn clumps(&self) -> &[LightClump] {
        self.clusterer()
            .map(LightClusterer::clumps)
            .unwrap_or_default()
    }

    /// Point lights from the last step (empty unless in point-light mode)
    pub fn point_lights(&self) -> &[PointLight] {
        match self.lighting.as_ref().map(|l| &l.output) {
            Some(LightOutput::PointLights { lights, .. }) => lights,
            _ => &[],
        }
    }

    /// Point-light cap, `None` unless in point-light mode
    pub fn max_lights(&self) -> Option<usize> {
        match self.lighting.as_ref().map(|l| &l.output) {
            Some(LightOutput::PointLights { max_lights, .. }) => Some(*max_lights),
            _ => None,
        }
    }

    /// SH coefficients from the last step, `None` unless in SH mode
    pub fn sh_coefficients(&self) -> Option<&ShCoefficients> {
        match self.lighting.as_ref().map(|l| &l.output) {
            Some(LightOutput::SphericalHarmonics { coefficients, .. }) => Some(coefficients),
            _ => None,
        }
    }

    /// SH basis, `None` unless in SH mode
    pub fn basis(&self) -> Option<ShBasis> {
        self.sh_coefficients().map(ShCoefficients::basis)
    }

    /// Sprite instances for every particle slot, in world space
    pub fn sprites(&self) -> Vec<SpriteInstance> {
        let size = self.pool.config().sprite_size;
        self.pool
            .particles()
            .iter()
            .map(|p| {
                let age = p.normalized_age();
                let position = self.origin + p.position();
                SpriteInstance {
                    position: [position.x, position.y, position.z],
                    normalized_age: age,
                    size,
                    decay: self.decay.evaluate(age),
                    padding: 0.0,
                }
            })
            .collect()
    }
}

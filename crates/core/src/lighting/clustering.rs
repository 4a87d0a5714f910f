//! Light clumps: approximating the flame volume with a few point lights
//!
//! The first `clump_count × clump_size` pool slots are partitioned into
//! `clump_count` disjoint clumps; the remaining slots are rendered but never
//! lit. Each clump is reduced to a centroid and an aggregate radiance every
//! frame.
//!
//! # Partitioning
//!
//! - **Static** (`hop_interval_ms < 0`): clump `i` owns slots
//!   `[i·s, (i+1)·s)` forever. Because expired particles respawn in the same
//!   slot, a clump keeps tracking the same part of the population without any
//!   reassignment.
//! - **Hopping** (`hop_interval_ms ≥ 0`): once the time since the last hop
//!   reaches the interval, membership is rebuilt by the configured
//!   [`HopPolicy`]. The new assignment is computed aside and swapped in whole;
//!   the clump count never changes.

use super::decay::DecayCurve;
use crate::core_types::{Color, Particle, Vec3};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How membership is rebuilt when a hop is due
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopPolicy {
    /// Move every lit slot to the clump with the nearest current centroid
    #[default]
    NearestCentroid,
    /// Sort lit slots by height and cut them into contiguous runs of `clump_size`
    Repartition,
}

/// How member positions are averaged into a centroid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentroidWeighting {
    /// Plain mean of live member positions
    #[default]
    Uniform,
    /// Mean weighted by each member's decay weight
    Decay,
}

/// Light clump configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClumpConfig {
    /// Number of clumps (`k`), fixed for the simulation's lifetime
    pub clump_count: usize,
    /// Nominal particles per clump (`s`)
    pub clump_size: usize,
    /// Milliseconds between hops; negative disables hopping
    pub hop_interval_ms: f32,
    /// Reassignment policy used by hops
    pub hop_policy: HopPolicy,
    /// Brightness over normalized age
    pub decay: DecayCurve,
    /// Centroid averaging
    pub centroid_weighting: CentroidWeighting,
    /// Flame color at full brightness
    pub color: Color,
}

impl Default for ClumpConfig {
    fn default() -> Self {
        Self {
            clump_count: 2,
            clump_size: 10,
            hop_interval_ms: -1.0,
            hop_policy: HopPolicy::default(),
            decay: DecayCurve::default(),
            centroid_weighting: CentroidWeighting::default(),
            color: Color::new(1.0, 0.55, 0.2),
        }
    }
}

impl ClumpConfig {
    /// Whether periodic reassignment is enabled
    pub fn hopping_enabled(&self) -> bool {
        self.hop_interval_ms >= 0.0
    }

    /// Number of pool slots that contribute to lighting
    pub fn lit_slots(&self) -> usize {
        self.clump_count * self.clump_size
    }

    /// Check against the capacity of the pool being clustered
    ///
    /// # Errors
    /// Returns [`ConfigError`] for zero counts, `k·s` above `pool_capacity`,
    /// a non-finite hop interval or color, or an invalid decay curve.
    pub fn validate(&self, pool_capacity: usize) -> Result<(), ConfigError> {
        if self.clump_count == 0 {
            return Err(ConfigError::NonPositiveCount {
                what: "clump count",
            });
        }
        if self.clump_size == 0 {
            return Err(ConfigError::NonPositiveCount { what: "clump size" });
        }
        let required = self
            .clump_count
            .checked_mul(self.clump_size)
            .unwrap_or(usize::MAX);
        if required > pool_capacity {
            return Err(ConfigError::ClumpCapacityExceeded {
                clump_count: self.clump_count,
                clump_size: self.clump_size,
                capacity: pool_capacity,
            });
        }
        if !self.hop_interval_ms.is_finite() {
            return Err(ConfigError::InvalidValue {
                what: "hop interval",
                value: self.hop_interval_ms,
            });
        }
        for channel in self.color.iter() {
            crate::error::ensure_non_negative("clump color", *channel)?;
        }
        self.decay.validate()
    }
}

/// One group of particles approximated as a single point light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightClump {
    members: Vec<usize>,
    centroid: Vec3,
    radiance: Color,
    live_members: usize,
}

impl LightClump {
    fn with_members(members: Vec<usize>) -> Self {
        Self {
            members,
            centroid: Vec3::zeros(),
            radiance: Color::zeros(),
            live_members: 0,
        }
    }

    /// Pool slots assigned to this clump
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Averaged position of live members (emitter-local); origin if none
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Aggregate radiance before the global intensity is applied
    pub fn radiance(&self) -> Color {
        self.radiance
    }

    /// Members currently alive
    pub fn live_members(&self) -> usize {
        self.live_members
    }

    /// Whether the clump currently emits nothing usable
    ///
    /// Non-finite radiance or centroid counts as dark so exporters never hand
    /// undefined lights to a consumer.
    pub fn is_dark(&self) -> bool {
        self.live_members == 0
            || self.radiance == Color::zeros()
            || !self.radiance.iter().all(|c| c.is_finite())
            || !self.centroid.iter().all(|c| c.is_finite())
    }

    /// Rebuild centroid and radiance from the current particle states
    ///
    /// `radiance = color × Σ decay(age/lifetime) / nominal_size`, so a clump
    /// with fewer members than nominal is proportionally dimmer and the total
    /// flame energy does not depend on how members are distributed.
    fn aggregate(&mut self, particles: &[Particle], config: &ClumpConfig) {
        let mut weight_sum = 0.0f32;
        let mut position_sum = Vec3::zeros();
        let mut weighted_position_sum = Vec3::zeros();
        let mut live = 0usize;

        for particle in self
            .members
            .iter()
            .filter_map(|&slot| particles.get(slot))
            .filter(|p| p.is_alive())
        {
            let weight = config.decay.evaluate(particle.normalized_age());
            weight_sum += weight;
            position_sum += particle.position();
            weighted_position_sum += particle.position() * weight;
            live += 1;
        }

        self.live_members = live;
        if live == 0 {
            self.centroid = Vec3::zeros();
            self.radiance = Color::zeros();
            return;
        }

        let uniform = position_sum / live as f32;
        self.centroid = match config.centroid_weighting {
            CentroidWeighting::Uniform => uniform,
            CentroidWeighting::Decay if weight_sum > f32::EPSILON => {
                weighted_position_sum / weight_sum
            }
            CentroidWeighting::Decay => uniform,
        };
        let radiance = config.color * (weight_sum / config.clump_size as f32);
        self.radiance = if radiance.iter().all(|c| c.is_finite()) {
            radiance
        } else {
            Color::zeros()
        };
    }
}

/// Partitions lit slots into clumps and keeps their lights up to date
#[derive(Debug, Clone)]
pub struct LightClusterer {
    config: ClumpConfig,
    clumps: Vec<LightClump>,
    /// Time accumulated since the last hop (ms)
    since_hop: f32,
    hops: u64,
}

impl LightClusterer {
    /// Create clumps over the first `k·s` slots of a pool of `pool_capacity`
    ///
    /// Initial membership is the contiguous partition in both modes.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid for the pool.
    pub fn new(config: ClumpConfig, pool_capacity: usize) -> Result<Self, ConfigError> {
        config.validate(pool_capacity)?;
        let clumps = contiguous_partition(config.clump_count, config.clump_size)
            .into_iter()
            .map(LightClump::with_members)
            .collect();

        info!(
            "Light clustering: {} clumps × {} particles of {} slots, hopping={}",
            config.clump_count,
            config.clump_size,
            pool_capacity,
            if config.hopping_enabled() {
                format!("every {:.0}ms ({:?})", config.hop_interval_ms, config.hop_policy)
            } else {
                "off".to_string()
            }
        );

        Ok(Self {
            config,
            clumps,
            since_hop: 0.0,
            hops: 0,
        })
    }

    /// Advance the hop timer by `dt` and refresh every clump
    ///
    /// At most one hop happens per call, even if `dt` spans several intervals;
    /// the leftover time is kept modulo the interval.
    pub fn update(&mut self, dt: f32, particles: &[Particle]) {
        if self.config.hopping_enabled() && dt.is_finite() && dt > 0.0 {
            self.since_hop += dt;
            let interval = self.config.hop_interval_ms;
            if self.since_hop >= interval {
                self.hop(particles);
                self.since_hop = if interval > 0.0 {
                    self.since_hop % interval
                } else {
                    0.0
                };
            }
        }
        self.recompute(particles);
    }

    /// Recompute centroids and radiance without touching membership
    pub fn recompute(&mut self, particles: &[Particle]) {
        for clump in &mut self.clumps {
            clump.aggregate(particles, &self.config);
        }
    }

    /// Rebuild membership now, regardless of the hop timer
    pub fn hop(&mut self, particles: &[Particle]) {
        let lit = self.config.lit_slots().min(particles.len());
        let groups = match self.config.hop_policy {
            HopPolicy::NearestCentroid => {
                self.recompute(particles);
                let centroids: Vec<Vec3> = self.clumps.iter().map(LightClump::centroid).collect();
                nearest_centroid_partition(&particles[..lit], &centroids)
            }
            HopPolicy::Repartition => height_partition(
                &particles[..lit],
                self.config.clump_count,
                self.config.clump_size,
            ),
        };

        debug_assert_eq!(groups.len(), self.clumps.len());
        for (clump, members) in self.clumps.iter_mut().zip(groups) {
            clump.members = members;
        }
        self.hops += 1;

        debug!(
            "Clump hop #{}: sizes {:?}",
            self.hops,
            self.clumps.iter().map(|c| c.members.len()).collect::<Vec<_>>()
        );
    }

    /// Current clumps in index order
    pub fn clumps(&self) -> &[LightClump] {
        &self.clumps
    }

    /// Snapshot of every clump's member slots
    pub fn membership(&self) -> Vec<Vec<usize>> {
        self.clumps.iter().map(|c| c.members.clone()).collect()
    }

    /// Clump owning `slot`, or `None` for unlit slots
    pub fn clump_of(&self, slot: usize) -> Option<usize> {
        self.clumps.iter().position(|c| c.members.contains(&slot))
    }

    /// Number of hops performed since construction
    pub fn hops_performed(&self) -> u64 {
        self.hops
    }

    /// Clustering configuration
    pub fn config(&self) -> &ClumpConfig {
        &self.config
    }
}

/// Clump `i` owns slots `[i·s, (i+1)·s)`
pub fn contiguous_partition(clump_count: usize, clump_size: usize) -> Vec<Vec<usize>> {
    (0..clump_count)
        .map(|i| (i * clump_size..(i + 1) * clump_size).collect())
        .collect()
}

/// Assign each slot to the nearest centroid; ties go to the lower clump index
fn nearest_centroid_partition(particles: &[Particle], centroids: &[Vec3]) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); centroids.len()];
    for (slot, particle) in particles.iter().enumerate() {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, centroid) in centroids.iter().enumerate() {
            let dist = (particle.position() - centroid).norm_squared();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        groups[best].push(slot);
    }
    groups
}

/// Sort slots bottom to top and cut into contiguous runs
fn height_partition(
    particles: &[Particle],
    clump_count: usize,
    clump_size: usize,
) -> Vec<Vec<usize>> {
    let mut slots: Vec<usize> = (0..particles.len()).collect();
    slots.sort_by(|&a, &b| {
        particles[a]
            .position()
            .y
            .total_cmp(&particles[b].position().y)
            .then(a.cmp(&b))
    });
    let mut groups: Vec<Vec<usize>> = slots.chunks(clump_size).map(<[usize]>::to_vec).collect();
    groups.resize(clump_count, Vec::new());
    for group in &mut groups {
        group.sort_unstable();
    }
    groups
}

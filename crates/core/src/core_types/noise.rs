//! Deterministic value noise for time-varying forces
//!
//! Provides smooth pseudo-random signals over simulated time, used by the
//! gusting wind generator. The same `(time, seed)` always yields the same
//! value, so wind driven by noise is as reproducible as a seeded run.

/// Seed values for deterministic noise generation
/// Using prime numbers for better distribution
const SEED_T: u32 = 1619;
const SEED_CHANNEL: u32 = 31337;

/// Maximum value for positive i32 as f64 for safe conversion
const MAX_I32_POSITIVE: f64 = 0x7fff_ffff as f64;

/// Integer hash of a lattice point and channel, returned in [0, 1]
#[inline]
fn hash_2d(t: i32, channel: i32, seed: u32) -> f32 {
    let mut n = (t.wrapping_mul(SEED_T as i32))
        .wrapping_add(channel.wrapping_mul(SEED_CHANNEL as i32))
        .wrapping_add(seed as i32);
    n = (n << 13) ^ n;
    n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589);
    // Convert to [0, 1] using f64 to avoid precision loss
    (f64::from(n & 0x7fff_ffff) / MAX_I32_POSITIVE) as f32
}

/// Smooth interpolation function (Hermite curve)
#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 1D value noise over time for one channel
///
/// Returns a value in [-1, 1] that varies smoothly with `time`.
///
/// # Parameters
/// - `time`: Simulated time (ms)
/// - `scale`: Time between lattice points (ms); larger = slower variation
/// - `channel`: Independent signal index (e.g. one per axis)
/// - `seed`: Seed for different noise layers
pub fn temporal_noise(time: f32, scale: f32, channel: u32, seed: u32) -> f32 {
    let st = time / scale;
    let t0 = st.floor() as i32;
    let t1 = t0 + 1;
    let ft = smoothstep(st - st.floor());

    let v0 = hash_2d(t0, channel as i32, seed);
    let v1 = hash_2d(t1, channel as i32, seed);
    let v = v0 + ft * (v1 - v0);

    // Convert from [0, 1] to [-1, 1]
    v * 2.0 - 1.0
}

/// Fractal Brownian Motion (fBm) over time
///
/// Combines octaves of [`temporal_noise`], each twice as fast and
/// `persistence` times as strong as the previous one. Result stays in [-1, 1].
pub fn fbm_temporal(
    time: f32,
    scale: f32,
    octaves: u32,
    persistence: f32,
    channel: u32,
    seed: u32,
) -> f32 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for i in 0..octaves {
        total += temporal_noise(time * frequency, scale, channel, seed.wrapping_add(i)) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }

    if max_value > 0.0 {
        total / max_value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_range_and_determinism() {
        for i in 0..500 {
            let t = i as f32 * 37.3;
            let a = temporal_noise(t, 250.0, 0, 7);
            let b = temporal_noise(t, 250.0, 0, 7);
            assert!((-1.0..=1.0).contains(&a));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_noise_is_continuous() {
        let scale = 100.0;
        let mut prev = temporal_noise(0.0, scale, 1, 3);
        for i in 1..1000 {
            let v = temporal_noise(i as f32 * 0.5, scale, 1, 3);
            assert!((v - prev).abs() < 0.1, "jump at step {i}: {prev} -> {v}");
            prev = v;
        }
    }

    #[test]
    fn test_channels_decorrelated() {
        let differs = (0..50)
            .map(|i| i as f32 * 120.0)
            .any(|t| {
                (temporal_noise(t, 100.0, 0, 1) - temporal_noise(t, 100.0, 1, 1)).abs() > 1e-3
            });
        assert!(differs);
    }

    #[test]
    fn test_fbm_range() {
        for i in 0..200 {
            let v = fbm_temporal(i as f32 * 13.0, 200.0, 3, 0.5, 2, 11);
            assert!((-1.0..=1.0).contains(&v));
        }
        assert_eq!(fbm_temporal(10.0, 200.0, 0, 0.5, 0, 0), 0.0);
    }
}

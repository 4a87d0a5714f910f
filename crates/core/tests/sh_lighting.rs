//! Projection and evaluation of clump lights in an SH environment
//!
//! Run with: cargo test --test `sh_lighting`

use approx::assert_relative_eq;
use fire_light_core::lighting::{ClumpConfig, DecayCurve, LightClusterer};
use fire_light_core::sh::{
    evaluate, evaluate_direction, to_spherical, ProjectionNormalization, ShBasis, ShProjector,
    ShadingFrame,
};
use fire_light_core::{Color, FireScene, Particle, SceneConfig, Vec3};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One single-particle clump per position, all freshly spawned
fn clusterer_at(positions: &[Vec3], color: Color) -> LightClusterer {
    let particles = particles_at(positions, 0.0);
    let config = ClumpConfig {
        clump_count: positions.len(),
        clump_size: 1,
        decay: DecayCurve::Linear,
        color,
        ..ClumpConfig::default()
    };
    let mut clusterer = LightClusterer::new(config, particles.len()).unwrap();
    clusterer.recompute(&particles);
    clusterer
}

fn particles_at(positions: &[Vec3], age: f32) -> Vec<Particle> {
    positions
        .iter()
        .map(|p| Particle::new(*p, Vec3::zeros(), Vec3::zeros(), 1000.0).with_age(age))
        .collect()
}

#[test]
fn projection_is_linear_in_clumps() {
    let a = Vec3::new(0.3, 1.2, -0.4);
    let b = Vec3::new(-0.8, 0.4, 0.9);
    let color = Color::new(1.0, 0.55, 0.2);
    let frame = ShadingFrame::at(Vec3::new(0.0, -0.2, 0.0));

    for normalization in [ProjectionNormalization::PeakPreserving, ProjectionNormalization::Delta] {
        let mut projector = ShProjector::new(ShBasis::default(), normalization);
        let together = projector.project(clusterer_at(&[a, b], color).clumps(), &frame, 2.0);

        let mut separate = projector.project(clusterer_at(&[a], color).clumps(), &frame, 2.0);
        separate
            .accumulate(&projector.project(clusterer_at(&[b], color).clumps(), &frame, 2.0))
            .unwrap();

        assert!(together.max_abs_diff(&separate) < 1e-5, "{normalization:?}");
    }
}

#[test]
fn single_light_round_trips_through_evaluation() {
    let color = Color::new(1.0, 0.55, 0.2);
    let position = Vec3::new(0.4, 0.7, 0.2);
    let clusterer = clusterer_at(&[position], color);

    for bands in [3, 5, 8] {
        let mut projector =
            ShProjector::new(ShBasis::new(bands).unwrap(), ProjectionNormalization::default());
        let coeffs = projector.project(clusterer.clumps(), &ShadingFrame::default(), 1.0);

        let (theta, phi) = to_spherical(&position).unwrap();
        assert_relative_eq!(evaluate(&coeffs, theta, phi), color, epsilon = 1e-4);

        let antipode = evaluate_direction(&coeffs, &-position);
        assert!(antipode.x.abs() < 0.5 * color.x, "bands {bands}: {antipode:?}");
    }
}

#[test]
fn zero_lights_give_zero_environment() {
    let mut projector = ShProjector::new(ShBasis::default(), ProjectionNormalization::default());
    let empty = projector.project(&[], &ShadingFrame::default(), 1.0);
    assert!(empty.is_zero());

    // Every member expired: clumps are dark
    let positions = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
    let expired = particles_at(&positions, 1000.0);
    let mut clusterer = clusterer_at(&positions, Color::new(1.0, 1.0, 1.0));
    clusterer.recompute(&expired);
    let dark = projector.project(clusterer.clumps(), &ShadingFrame::default(), 1.0);
    assert!(dark.is_zero());

    for dir in [Vec3::x(), Vec3::y(), -Vec3::z(), Vec3::new(1.0, -1.0, 0.5)] {
        assert_eq!(evaluate_direction(&dark, &dir), Color::zeros());
    }
}

#[test]
fn scene_environment_is_deterministic() {
    let run = || {
        let mut scene = FireScene::new(SceneConfig::default().with_seed(17)).unwrap();
        for _ in 0..60 {
            scene.step(16.0, &Vec3::new(6e-7, 0.0, 0.0));
        }
        scene.environment().clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn scene_rejects_mismatched_basis() {
    let config = SceneConfig {
        basis: ShBasis::new(4).unwrap(),
        ..SceneConfig::default()
    };
    assert!(FireScene::new(config).is_err());
}

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use fire_light_core::core_types::luminance;
use fire_light_core::lighting::HopPolicy;
use fire_light_core::particles::GustingWind;
use fire_light_core::sh::{evaluate_direction, ProjectionNormalization};
use fire_light_core::simulation::{LightingConfig, LightingMode};
use fire_light_core::{
    ExternalForce, FireScene, PrtReceiver, SceneConfig, ShBasis, SinusoidalWind, Vec3,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lighting representation for the flame emitter
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Project clumps into spherical harmonics
    Sh,
    /// Export one point light per clump
    Point,
}

/// External force applied to every particle
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Wind {
    /// No external force
    Calm,
    /// Slow sinusoidal sway along x
    Sine,
    /// Noise-driven gusts
    Gust,
}

/// Fire lighting demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "fire-light-demo")]
#[command(about = "Headless fire particle lighting demo", long_about = None)]
struct Args {
    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Frame time in milliseconds
    #[arg(long, default_value_t = 16.0)]
    dt: f32,

    /// RNG seed (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Flame lighting mode
    #[arg(short, long, value_enum, default_value_t = Mode::Sh)]
    mode: Mode,

    /// SH band count (coefficients = bands²)
    #[arg(short, long, default_value_t = 5)]
    bands: u32,

    /// Use delta projection instead of peak-preserving
    #[arg(long)]
    delta: bool,

    /// Number of flame light clumps
    #[arg(long, default_value_t = 2)]
    clumps: usize,

    /// Particles per clump
    #[arg(long, default_value_t = 10)]
    clump_size: usize,

    /// Hop interval in ms (negative disables hopping)
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    hop_interval: f32,

    /// Re-partition by height on hops instead of nearest-centroid
    #[arg(long)]
    repartition: bool,

    /// Flame intensity
    #[arg(short, long, default_value_t = 1.0)]
    intensity: f32,

    /// Wind model
    #[arg(short, long, value_enum, default_value_t = Wind::Sine)]
    wind: Wind,

    /// Sphere plot resolution for the final environment (0 = skip)
    #[arg(long, default_value_t = 16)]
    plot: usize,

    /// Report interval in frames
    #[arg(short, long, default_value_t = 60)]
    report_interval: u32,

    /// Load the scene from a JSON file (overrides lighting flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective scene configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the final SH environment as JSON
    #[arg(long)]
    json: bool,

    /// Run validation checks
    #[arg(short, long)]
    validate: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.dt <= 0.0 || !args.dt.is_finite() {
        bail!("frame time must be positive, got {}", args.dt);
    }

    let config = scene_config(&args)?;
    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("=== Fire Lighting Demo ===\n");
    let mut scene = FireScene::new(config).context("invalid scene configuration")?;
    for emitter in scene.emitters() {
        println!(
            "Emitter '{}': {} particles, lit={}",
            emitter.name(),
            emitter.pool().len(),
            emitter.is_lit()
        );
    }

    // Single-vertex receiver that only sees the constant band
    let mut transfer = vec![0.0; scene.basis().coefficient_count()];
    transfer[0] = 1.0;
    let receiver = scene.attach_receiver(PrtReceiver::new(scene.basis(), vec![transfer])?)?;

    let force: Box<dyn ExternalForce> = match args.wind {
        Wind::Calm => Box::new(Vec3::zeros()),
        Wind::Sine => Box::new(SinusoidalWind::default()),
        Wind::Gust => Box::new(GustingWind::default()),
    };

    println!("\nRunning {} frames at {:.1}ms...\n", args.frames, args.dt);
    println!("Time(ms) | Lights | Hops | Up radiance | Receiver | Respawns");
    println!("---------|--------|------|-------------|----------|---------");

    for frame in 1..=args.frames {
        scene.step(args.dt, force.as_ref());
        if frame % args.report_interval.max(1) == 0 || frame == args.frames {
            report(&scene, receiver);
        }
    }

    println!("\n=== Simulation Complete ===");
    println!("Final time: {:.0}ms over {} frames", scene.elapsed(), scene.frames());

    if args.plot > 0 {
        let plot = scene.sample_sphere(args.plot);
        println!(
            "Sphere plot {}x{}: min {:.4}, max {:.4}, mean {:.4}",
            plot.resolution(),
            plot.columns(),
            plot.min(),
            plot.max(),
            plot.mean()
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(scene.environment())?);
    }

    if args.validate {
        run_validation_checks(&args)?;
    }
    Ok(())
}

fn scene_config(args: &Args) -> Result<SceneConfig> {
    if let Some(path) = &args.config {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: SceneConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        if let Some(seed) = args.seed {
            config = config.with_seed(seed);
        }
        info!("Loaded scene configuration from {}", path.display());
        return Ok(config);
    }

    let basis = ShBasis::new(args.bands)?;
    let mut config = SceneConfig {
        basis,
        ..SceneConfig::default()
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let normalization = if args.delta {
        ProjectionNormalization::Delta
    } else {
        ProjectionNormalization::PeakPreserving
    };
    for emitter in &mut config.emitters {
        if let Some(lighting) = emitter.lighting.as_mut() {
            *lighting = flame_lighting(args, basis, normalization, lighting);
        }
    }
    Ok(config)
}

fn flame_lighting(
    args: &Args,
    basis: ShBasis,
    normalization: ProjectionNormalization,
    base: &LightingConfig,
) -> LightingConfig {
    let mut clumps = base.clumps.clone();
    clumps.clump_count = args.clumps;
    clumps.clump_size = args.clump_size;
    clumps.hop_interval_ms = args.hop_interval;
    clumps.hop_policy = if args.repartition {
        HopPolicy::Repartition
    } else {
        HopPolicy::NearestCentroid
    };

    LightingConfig {
        clumps,
        intensity: args.intensity,
        mode: match args.mode {
            Mode::Sh => LightingMode::SphericalHarmonics {
                basis,
                normalization,
            },
            Mode::Point => LightingMode::point_lights(),
        },
    }
}

fn report(scene: &FireScene, receiver: usize) {
    let lights: usize = scene.emitters().iter().map(|e| e.clumps().len()).sum();
    let hops: u64 = scene
        .emitters()
        .iter()
        .filter_map(|e| e.clusterer())
        .map(|c| c.hops_performed())
        .sum();
    let respawns: u64 = scene.emitters().iter().map(|e| e.pool().respawn_count()).sum();
    let up = luminance(&evaluate_direction(scene.environment(), &Vec3::y()));
    let shaded = scene
        .shade_receiver(receiver)
        .and_then(|colors| colors.first().copied())
        .map_or(0.0, |c| luminance(&c));

    println!(
        "{:8.0} | {:6} | {:4} | {:11.4} | {:8.4} | {:8}",
        scene.elapsed(),
        lights,
        hops,
        up,
        shaded,
        respawns
    );
}

fn run_validation_checks(args: &Args) -> Result<()> {
    println!("\n=== Running Validation Checks ===\n");
    let seed = args.seed.unwrap_or(7);

    // Check 1: identical seeds reproduce the same environment
    println!("Check 1: Determinism");
    let run = || -> Result<_> {
        let mut scene = FireScene::new(scene_config(args)?.with_seed(seed))?;
        for _ in 0..120 {
            scene.step(args.dt, &SinusoidalWind::default());
        }
        Ok(scene.environment().clone())
    };
    let diff = run()?.max_abs_diff(&run()?);
    println!("  Max coefficient difference: {diff:e}");
    print_result(diff == 0.0, "Seeded runs are identical");

    // Check 2: zero intensity gives a black environment
    println!("\nCheck 2: Zero Intensity");
    let mut scene = FireScene::new(scene_config(args)?.with_seed(seed))?;
    for index in 0..scene.emitters().len() {
        if let Some(emitter) = scene.emitter_mut(index) {
            emitter.set_intensity(0.0);
        }
    }
    scene.step(args.dt, &Vec3::zeros());
    print_result(scene.environment().is_zero(), "Environment is all zero");

    // Check 3: flame lights the receiver from above more than from below
    println!("\nCheck 3: Flame Direction");
    let mut scene = FireScene::new(scene_config(args)?.with_seed(seed))?;
    for _ in 0..60 {
        scene.step(args.dt, &Vec3::zeros());
    }
    let above = luminance(&evaluate_direction(scene.environment(), &Vec3::y()));
    let below = luminance(&evaluate_direction(scene.environment(), &-Vec3::y()));
    println!("  Radiance above: {above:.4}, below: {below:.4}");
    print_result(
        above > below || matches!(args.mode, Mode::Point),
        "Flame above the receiver dominates",
    );

    println!("\n=== Validation Complete ===");
    Ok(())
}

fn print_result(pass: bool, what: &str) {
    if pass {
        println!("  PASS: {what}");
    } else {
        println!("  FAIL: {what}");
    }
}

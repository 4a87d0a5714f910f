//! Light clustering: decay curves, clumps and point-light export

pub mod clustering;
pub mod decay;
pub mod point_light;

pub use clustering::{
    contiguous_partition, CentroidWeighting, ClumpConfig, HopPolicy, LightClump, LightClusterer,
};
pub use decay::DecayCurve;
pub use point_light::{export_point_lights, PointLight, PointLightGpu, DEFAULT_MAX_POINT_LIGHTS};

//! Emitters and scenes driven by the host loop

pub mod emitter;
pub mod export;
pub mod scene;

pub use emitter::{EmitterConfig, FireEmitter, LightingConfig, LightingMode};
pub use export::{sprite_bytes, SpriteInstance};
pub use scene::{FireScene, SceneConfig};

//! GPU resource helpers.

pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{GlobalUniforms, LightConfig};
pub use texture_resource::TextureResource;

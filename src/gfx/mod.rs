//! Graphics: camera system, scene management, drag interaction, backdrop,
//! and the wgpu render engine.

pub mod background;
pub mod camera;
pub mod drag;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod viewport;

pub use background::{BackgroundMode, BackgroundProvider};
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::RenderEngine;
pub use viewport::Viewport;

// src/lib.rs
//! Atrium 3D Viewer
//!
//! A room-scale scene viewer built on wgpu and winit: enter the room, import
//! glTF models, drag them around, and back the scene with a solid color or a
//! live camera feed.

pub mod app;
pub mod error;
pub mod gfx;
pub mod import;
pub mod interaction;
pub mod media;
pub mod stage;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::AtriumApp;
pub use error::{Result, ViewerError};
pub use stage::StageConfig;

/// Creates a default viewer application instance
pub fn default() -> AtriumApp {
    pollster::block_on(AtriumApp::new())
}

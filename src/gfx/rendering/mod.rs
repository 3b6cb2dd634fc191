//! Rendering: the wgpu engine and its draw stages.

pub mod backdrop_renderer;
pub mod post;
pub mod render_engine;

pub use render_engine::RenderEngine;

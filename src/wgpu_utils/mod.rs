//! WGPU utility helpers.

pub mod uniform_buffer;

pub use uniform_buffer::UniformBuffer;

//! Procedural geometry for room fixtures.

pub mod primitives;

pub use primitives::generate_plane;

/// Flat vertex data produced by the generators, ready for
/// [`Mesh::new`](crate::gfx::scene::Mesh::new).
#[derive(Debug, Default)]
pub struct GeometryData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

//! Scene objects and their mesh data.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use wgpu::Device;

use super::vertex::Vertex3D;

/// Triangle mesh with optional GPU buffers.
///
/// Buffers stay `None` until [`Mesh::init_gpu_resources`] runs; meshes built
/// on a decode worker cross the channel without any GPU state attached.
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays (3 floats per vertex)
    /// and a triangle index list.
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }

        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    /// Derives smooth per-vertex normals from the triangle list, for files
    /// that ship positions without normals.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let at = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };
            let (v0, v1, v2) = (at(i0), at(i1), at(i2));
            let face = (v1 - v0).cross(v2 - v0);

            for &i in &[i0, i1, i2] {
                normals[i * 3] += face.x;
                normals[i * 3 + 1] += face.y;
                normals[i * 3 + 2] += face.z;
            }
        }

        for i in 0..vertex_count {
            let n = Vector3::new(normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]);
            let length = (n.x * n.x + n.y * n.y + n.z * n.z).sqrt();
            if length > 0.0 {
                normals[i * 3] = n.x / length;
                normals[i * 3 + 1] = n.y / length;
                normals[i * 3 + 2] = n.z / length;
            }
        }

        normals
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        if self.vertex_buffer.is_some() {
            return;
        }
        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Per-object uniform payload: model matrix plus flat base color.
/// Must match the `ObjectUniform` struct in `forward.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// GPU-side state for one object.
pub struct ObjectGpuResources {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// A renderable object in the scene: one or more meshes under a shared
/// transform.
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub color: [f32; 4],
    pub visible: bool,
    gpu: Option<ObjectGpuResources>,
    transform_dirty: bool,
}

impl Object {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Matrix4::identity(),
            color: [0.8, 0.8, 0.8, 1.0],
            visible: true,
            gpu: None,
            transform_dirty: false,
        }
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
        self.transform_dirty = true;
    }

    /// Replaces the object's position, keeping rotation and scale.
    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform.w.x = translation.x;
        self.transform.w.y = translation.y;
        self.transform.w.z = translation.z;
        self.transform_dirty = true;
    }

    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.transform.w.x, self.transform.w.y, self.transform.w.z)
    }

    pub fn set_scale(&mut self, scale: f32) {
        let translation = self.translation();
        self.transform = Matrix4::from_scale(scale);
        self.set_translation(translation);
    }

    fn uniform(&self) -> ObjectUniform {
        ObjectUniform {
            model: self.transform.into(),
            color: self.color,
        }
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|res| &res.bind_group)
    }

    /// Uploads mesh buffers and the per-object uniform. Safe to call more
    /// than once; already-initialized objects are skipped.
    pub fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        for mesh in &mut self.meshes {
            mesh.init_gpu_resources(device);
        }
        if self.gpu.is_some() {
            return;
        }

        let uniform = self.uniform();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.gpu = Some(ObjectGpuResources {
            uniform_buffer,
            bind_group,
        });
        self.transform_dirty = false;
    }

    /// Syncs the uniform to the GPU if the transform or color changed since
    /// the last upload.
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        if !self.transform_dirty {
            return;
        }
        if let Some(gpu) = &self.gpu {
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform()));
            self.transform_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_mesh_interleaves_positions_and_normals() {
        let mesh = unit_triangle();
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices()[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices()[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_calculated_normals_are_unit_length() {
        let positions = vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        let normals = Mesh::calculate_face_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals.len(), positions.len());
        for normal in normals.chunks_exact(3) {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
            // Counter-clockwise XY triangle faces +Z.
            assert!(normal[2] > 0.99);
        }
    }

    #[test]
    fn test_set_translation_preserves_scale() {
        let mut object = Object::new("chair", vec![unit_triangle()]);
        object.set_scale(2.0);
        object.set_translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(object.translation(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(object.transform.x.x, 2.0);
    }
}

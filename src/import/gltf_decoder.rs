//! glTF decoding behind the [`ModelDecoder`](super::ModelDecoder) seam.
//!
//! Delegates parsing and validation to the `gltf` crate and flattens the
//! node hierarchy: each node's world transform is baked into its vertex
//! positions, since the scene registry holds a flat arena with one transform
//! per imported model.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::error::{Result, ViewerError};

use super::{DecodedMesh, DecodedModel, ModelDecoder};

/// Decoder for binary (`.glb`) and embedded-buffer (`.gltf`) files.
pub struct GltfDecoder;

impl ModelDecoder for GltfDecoder {
    fn parse(&self, bytes: &[u8]) -> Result<DecodedModel> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|err| ViewerError::Decode(err.to_string()))?;

        let mut meshes = Vec::new();
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());

        if let Some(scene) = scene {
            for node in scene.nodes() {
                collect_meshes(&node, Matrix4::identity(), &buffers, &mut meshes);
            }
        }

        if meshes.is_empty() {
            return Err(ViewerError::Decode(
                "file contains no triangle meshes".into(),
            ));
        }

        let name = document
            .meshes()
            .find_map(|mesh| mesh.name().map(str::to_owned))
            .unwrap_or_else(|| "model".into());

        Ok(DecodedModel { name, meshes })
    }
}

fn collect_meshes(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<DecodedMesh>,
) {
    let local: Matrix4<f32> = node.transform().matrix().into();
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            if let Some(decoded) = read_primitive(&primitive, &world, buffers) {
                out.push(decoded);
            }
        }
    }

    for child in node.children() {
        collect_meshes(&child, world, buffers, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    world: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
) -> Option<DecodedMesh> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let mut positions = Vec::new();
    for p in reader.read_positions()? {
        let v = world * Vector4::new(p[0], p[1], p[2], 1.0);
        positions.extend_from_slice(&[v.x / v.w, v.y / v.w, v.z / v.w]);
    }
    if positions.is_empty() {
        return None;
    }

    let mut normals = Vec::new();
    if let Some(source) = reader.read_normals() {
        for n in source {
            let v = world * Vector4::new(n[0], n[1], n[2], 0.0);
            let n = Vector3::new(v.x, v.y, v.z);
            let n = if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                Vector3::new(0.0, 1.0, 0.0)
            };
            normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }

    let indices = match reader.read_indices() {
        Some(source) => source.into_u32().collect(),
        None => (0..(positions.len() / 3) as u32).collect(),
    };

    Some(DecodedMesh {
        positions,
        normals,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a structurally valid GLB container around the given JSON.
    fn glb(json: &str) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(12 + 8 + json.len() as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out
    }

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let err = GltfDecoder.parse(b"not a gltf file at all").unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
    }

    #[test]
    fn test_meshless_document_is_rejected() {
        let bytes = glb(r#"{"asset":{"version":"2.0"}}"#);
        let err = GltfDecoder.parse(&bytes).unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
        assert!(err.to_string().contains("no triangle meshes"));
    }

    #[test]
    fn test_truncated_container_is_rejected() {
        let mut bytes = glb(r#"{"asset":{"version":"2.0"}}"#);
        bytes.truncate(10);
        assert!(GltfDecoder.parse(&bytes).is_err());
    }
}

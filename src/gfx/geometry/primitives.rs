//! Primitive shape generation.

use super::GeometryData;

/// Generates a subdivided plane in the XZ plane, centered at the origin,
/// with normals pointing up (+Y).
pub fn generate_plane(width: f32, depth: f32, x_segments: u32, z_segments: u32) -> GeometryData {
    let mut data = GeometryData::default();
    let x_segments = x_segments.max(1);
    let z_segments = z_segments.max(1);

    for z in 0..=z_segments {
        for x in 0..=x_segments {
            let px = (x as f32 / x_segments as f32 - 0.5) * width;
            let pz = (z as f32 / z_segments as f32 - 0.5) * depth;
            data.positions.extend_from_slice(&[px, 0.0, pz]);
            data.normals.extend_from_slice(&[0.0, 1.0, 0.0]);
        }
    }

    let stride = x_segments + 1;
    for z in 0..z_segments {
        for x in 0..x_segments {
            let a = z * stride + x;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            // Counter-clockwise when seen from above.
            data.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertex_count(), 9); // 3x3 grid
        assert_eq!(plane.triangle_count(), 8); // 4 quads * 2 triangles
        assert_eq!(plane.positions.len(), plane.normals.len());
    }

    #[test]
    fn test_plane_spans_requested_extent() {
        let plane = generate_plane(4.0, 6.0, 1, 1);
        let xs: Vec<f32> = plane.positions.chunks_exact(3).map(|p| p[0]).collect();
        let zs: Vec<f32> = plane.positions.chunks_exact(3).map(|p| p[2]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -2.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 2.0);
        assert_eq!(zs.iter().cloned().fold(f32::MAX, f32::min), -3.0);
        assert_eq!(zs.iter().cloned().fold(f32::MIN, f32::max), 3.0);
    }

    #[test]
    fn test_degenerate_segment_counts_are_clamped() {
        let plane = generate_plane(1.0, 1.0, 0, 0);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.triangle_count(), 2);
    }
}

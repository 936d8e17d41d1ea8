//! # Mesh Data
//!
//! The shape handed over by the asset loader: flat vertex streams plus a
//! triangle index list. The gameplay core turns it into a render mesh
//! reference and, optionally, a physics collision mesh.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a render mesh owned by the external renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(transparent)]
pub struct MeshId(pub u32);

/// Vertex streams of a single mesh primitive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Object-space positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals (may be empty).
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (may be empty).
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Tangents with handedness in `w` (may be empty).
    pub tangents: Vec<[f32; 4]>,
}

/// Interleaved vertex as uploaded to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position.
    pub position: [f32; 3],
    /// Normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// Tangent.
    pub tangent: [f32; 4],
}

impl MeshData {
    /// Creates a mesh from positions and indices only.
    #[must_use]
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            ..Self::default()
        }
    }

    /// Axis-aligned box centred on the origin.
    ///
    /// 24 vertices (four per face) so every face gets flat normals.
    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        // (normal, tangent axis, bitangent axis)
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * h;
                mesh.positions.push(p.to_array());
                mesh.normals.push(normal.to_array());
                mesh.uvs.push([(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
                mesh.tangents.push([u.x, u.y, u.z, 1.0]);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of complete triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if there is nothing to build a shape from.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates complete triangles. A trailing partial triangle is skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Positions with `transform` applied.
    #[must_use]
    pub fn transformed_positions(&self, transform: &Mat4) -> Vec<Vec3> {
        self.positions
            .iter()
            .map(|p| transform.transform_point3(Vec3::from_array(*p)))
            .collect()
    }

    /// Object-space bounding box, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Interleaves the streams for upload. Missing streams are zero-filled.
    #[must_use]
    pub fn interleaved(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or_default(),
                uv: self.uvs.get(i).copied().unwrap_or_default(),
                tangent: self.tangents.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }
}

//! # Asset Source
//!
//! The core asks for meshes by name; the host decides where they come from
//! (glTF files, a packed archive, a test fixture). [`ProceduralAssets`]
//! builds the stock level out of boxes so the game runs with no files.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use thiserror::Error;

use doppel_shared::{MeshData, MeshId};

/// Asset loading failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// No asset with this name.
    #[error("asset '{0}' not found")]
    NotFound(String),

    /// The asset exists but is unusable.
    #[error("asset '{name}' is malformed: {reason}")]
    Malformed {
        /// Asset name.
        name: String,
        /// What is wrong.
        reason: String,
    },
}

/// A mesh ready for the renderer and, optionally, the physics scene.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedMesh {
    /// Renderer handle.
    pub mesh_id: MeshId,
    /// Geometry.
    pub data: MeshData,
    /// Placement baked into the asset.
    pub transform: Mat4,
}

/// Supplies meshes by name.
pub trait AssetSource {
    /// Loads `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if the asset is missing or unusable.
    fn load(&mut self, name: &str) -> Result<LoadedMesh, AssetError>;
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSpec {
    /// Centre.
    pub centre: Vec3,
    /// Half extents.
    pub half_extents: Vec3,
}

impl BoxSpec {
    /// Box spanning `min..max`.
    #[must_use]
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        Self {
            centre: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }
}

/// Merges boxes into one mesh, positioned relative to `origin`.
#[must_use]
pub fn merge_boxes(boxes: &[BoxSpec], origin: Vec3) -> MeshData {
    let mut merged = MeshData::default();
    for spec in boxes {
        let cube = MeshData::cuboid(spec.half_extents);
        let base = merged.positions.len() as u32;
        let offset = spec.centre - origin;
        merged
            .positions
            .extend(cube.positions.iter().map(|p| (Vec3::from_array(*p) + offset).to_array()));
        merged.normals.extend_from_slice(&cube.normals);
        merged.uvs.extend_from_slice(&cube.uvs);
        merged.tangents.extend_from_slice(&cube.tangents);
        merged.indices.extend(cube.indices.iter().map(|i| i + base));
    }
    merged
}

#[derive(Clone, Debug)]
struct Recipe {
    origin: Vec3,
    boxes: Vec<BoxSpec>,
}

/// Box-built stand-ins for every level asset.
#[derive(Clone, Debug, Default)]
pub struct ProceduralAssets {
    recipes: HashMap<String, Recipe>,
    ids: HashMap<String, MeshId>,
}

impl ProceduralAssets {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset made of `boxes`, anchored at `origin`.
    pub fn insert(&mut self, name: impl Into<String>, origin: Vec3, boxes: Vec<BoxSpec>) {
        self.recipes.insert(name.into(), Recipe { origin, boxes });
    }

    /// The stock level.
    ///
    /// Floors have their top face at y = 0. The dither floor has a 10 × 10
    /// hole over the goal pit; the bloom floor does not.
    #[must_use]
    pub fn level() -> Self {
        let mut assets = Self::new();
        let floor = |min_x: f32, max_x: f32, min_z: f32, max_z: f32| {
            BoxSpec::from_bounds(Vec3::new(min_x, -1.0, min_z), Vec3::new(max_x, 0.0, max_z))
        };

        assets.insert(
            "environment",
            Vec3::ZERO,
            vec![
                // Pit bottom under the pressure plate
                BoxSpec::from_bounds(Vec3::new(24.0, -11.0, 12.0), Vec3::new(34.0, -10.0, 22.0)),
                // Crates
                BoxSpec::from_bounds(Vec3::new(6.0, 0.0, 6.0), Vec3::new(7.0, 1.0, 7.0)),
                BoxSpec::from_bounds(Vec3::new(-5.0, 0.0, 20.0), Vec3::new(-3.0, 1.5, 22.0)),
            ],
        );
        assets.insert(
            "dither_floor",
            Vec3::ZERO,
            vec![
                floor(-8.0, 35.0, -15.0, 12.0),
                floor(-8.0, 35.0, 22.0, 35.0),
                floor(-8.0, 24.0, 12.0, 22.0),
                floor(34.0, 35.0, 12.0, 22.0),
            ],
        );
        assets.insert("bloom_floor", Vec3::ZERO, vec![floor(-8.0, 35.0, -15.0, 35.0)]);

        let water = |y: f32| BoxSpec::from_bounds(Vec3::new(-8.0, y - 0.01, -15.0), Vec3::new(35.0, y, 35.0));
        assets.insert("dither_water", Vec3::ZERO, vec![water(0.0)]);
        assets.insert("bloom_water", Vec3::ZERO, vec![water(0.0)]);

        // Staircase up to the note ledge; each world has its own half
        let step = |i: f32| {
            BoxSpec::from_bounds(
                Vec3::new(10.0 + i * 1.5, 0.0, -7.0),
                Vec3::new(11.5 + i * 1.5, 0.5 + i * 0.5, -5.0),
            )
        };
        assets.insert("jumpnrun_dither", Vec3::ZERO, (0..4).map(|i| step(i as f32)).collect());
        assets.insert(
            "jumpnrun_bloom",
            Vec3::ZERO,
            (4..12)
                .map(|i| step(i as f32))
                .chain(std::iter::once(BoxSpec::from_bounds(
                    Vec3::new(20.5, 0.0, -7.5),
                    Vec3::new(22.0, 6.4, -5.0),
                )))
                .collect(),
        );

        assets.insert(
            "altar",
            Vec3::ZERO,
            vec![BoxSpec::from_bounds(Vec3::new(0.08, 0.0, 0.28), Vec3::new(0.32, 0.3, 0.52))],
        );
        assets.insert(
            "note",
            Vec3::ZERO,
            vec![BoxSpec {
                centre: Vec3::ZERO,
                half_extents: Vec3::new(0.1, 0.02, 0.15),
            }],
        );
        assets.insert(
            "remote",
            Vec3::ZERO,
            vec![BoxSpec {
                centre: Vec3::ZERO,
                half_extents: Vec3::new(0.03, 0.015, 0.06),
            }],
        );
        assets
    }

    fn id_for(&mut self, name: &str) -> MeshId {
        let next = MeshId(self.ids.len() as u32);
        *self.ids.entry(name.to_owned()).or_insert(next)
    }
}

impl AssetSource for ProceduralAssets {
    fn load(&mut self, name: &str) -> Result<LoadedMesh, AssetError> {
        let recipe = self
            .recipes
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_owned()))?;
        if recipe.boxes.is_empty() {
            return Err(AssetError::Malformed {
                name: name.to_owned(),
                reason: "no geometry".into(),
            });
        }
        Ok(LoadedMesh {
            mesh_id: self.id_for(name),
            data: merge_boxes(&recipe.boxes, recipe.origin),
            transform: Mat4::from_translation(recipe.origin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_offsets_indices() {
        let boxes = [
            BoxSpec::from_bounds(Vec3::ZERO, Vec3::ONE),
            BoxSpec::from_bounds(Vec3::splat(2.0), Vec3::splat(3.0)),
        ];
        let mesh = merge_boxes(&boxes, Vec3::ZERO);
        assert_eq!(mesh.vertex_count(), 48);
        assert_eq!(mesh.triangle_count(), 24);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        assert_eq!(mesh.bounds(), Some((Vec3::ZERO, Vec3::splat(3.0))));
    }

    #[test]
    fn test_level_assets_load() {
        let mut assets = ProceduralAssets::level();
        for name in [
            "environment",
            "dither_floor",
            "bloom_floor",
            "dither_water",
            "bloom_water",
            "jumpnrun_dither",
            "jumpnrun_bloom",
            "altar",
            "note",
            "remote",
        ] {
            let mesh = assets.load(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(!mesh.data.is_empty());
        }
    }

    #[test]
    fn test_mesh_ids_are_stable() {
        let mut assets = ProceduralAssets::level();
        let first = assets.load("note").unwrap().mesh_id;
        let again = assets.load("note").unwrap().mesh_id;
        let other = assets.load("remote").unwrap().mesh_id;
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn test_unknown_asset() {
        let mut assets = ProceduralAssets::level();
        assert_eq!(
            assets.load("dragon").unwrap_err(),
            AssetError::NotFound("dragon".into())
        );
    }
}

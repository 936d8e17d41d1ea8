//! # Physics Error Types
//!
//! All errors that can occur while building or addressing physics bodies.

use thiserror::Error;

/// Errors that can occur in the physics scene.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// Mesh has no vertices to build a shape from.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// Index buffer does not describe whole triangles.
    #[error("index buffer length {0} is not a multiple of 3")]
    MalformedIndices(usize),

    /// Triangle references a vertex that does not exist.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The backend rejected the triangle mesh.
    #[error("triangle mesh cooking failed: {0}")]
    TriangleMeshCooking(String),

    /// Points are degenerate (coplanar, collinear or coincident).
    #[error("convex hull failed for {0} points")]
    ConvexHullFailed(usize),

    /// Handle does not refer to a body in this scene.
    #[error("unknown body handle {0}")]
    UnknownBody(u32),

    /// Handle does not refer to a character in this scene.
    #[error("unknown character handle {0}")]
    UnknownCharacter(u32),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

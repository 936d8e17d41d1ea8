//! # DOPPEL Shared
//!
//! Types used by both the physics integration and the gameplay crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `rapier3d` or any other physics backend
//! - Any GPU or window-related crate
//!
//! If you need backend types, put them in `doppel_physics`.

#![deny(unsafe_code)]

pub mod constants;
pub mod mesh;
pub mod world_mask;

pub use mesh::{MeshData, MeshId, Vertex};
pub use world_mask::{ActiveWorld, CollisionFilter, WorldMask};

//! Core types for volumetric tetrahedral meshing.
//!
//! This crate provides the foundational types shared by the meshing
//! pipeline:
//!
//! - [`Vertex`] - A point in 3D space
//! - [`IndexedMesh`] - A triangle surface mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with resolved vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`Tetrahedron`] / [`TetMesh`] - Volumetric mesh elements and container
//! - [`ProgressContext`] - Cancellation and progress reporting handle
//! - [`query`] - Geometric predicates (closest point, ray casts,
//!   circumspheres, barycentric coordinates)
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**. Triangle faces use
//! counter-clockwise winding when viewed from outside; tetrahedra are stored
//! with non-negative signed volume.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod progress;
pub mod query;
mod shapes;
mod tetmesh;
mod tetrahedron;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use mesh::IndexedMesh;
pub use progress::ProgressContext;
pub use shapes::{icosphere, unit_cube};
pub use tetmesh::{TetMesh, VertexLink, TET_EDGES};
pub use tetrahedron::{TetraFace, Tetrahedron};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

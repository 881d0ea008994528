//! Volumetric tetrahedralization of closed surface meshes.
//!
//! This crate fills a closed triangulated surface with tetrahedra using
//! incremental Delaunay construction over the surface vertices plus a set of
//! relaxed interior points.
//!
//! # Features
//!
//! - **One-call pipeline**: [`tetrahedralize`] runs point synthesis,
//!   Delaunay insertion, edge-swap refinement, exterior/sliver removal and
//!   compaction
//! - **Deterministic**: the same surface, parameters and seed always produce
//!   the same mesh
//! - **Cooperative cancellation**: a shared [`mesh_types::ProgressContext`]
//!   carries a cancel flag and a coarse progress percentage
//! - **Vertex links**: every input vertex gets a barycentric link into the
//!   output mesh for later skinning
//! - **Interactive edits**: [`TetraEditor`] deletes and grows single
//!   elements with undo
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Example
//!
//! ```
//! use mesh_tetra::{tetrahedralize, TetraParams};
//! use mesh_types::{unit_cube, ProgressContext};
//!
//! let progress = ProgressContext::new();
//! let result = tetrahedralize(&unit_cube(), &TetraParams::with_subdivision(4), &progress)?;
//! println!("{result}");
//! assert!(!result.mesh.is_empty());
//! # Ok::<(), mesh_tetra::TetraError>(())
//! ```
//!
//! # Algorithm
//!
//! 1. Jitter the surface vertices and seed interior points on an axis-ray
//!    lattice (inside intervals found by crossing parity), then relax them
//!    away from the surface and from each other
//! 2. Insert every point into a growing Delaunay tetrahedralization
//!    (Bowyer-Watson), starting from one oversized enclosing tetrahedron
//! 3. Swap edges that cross the input surface at a shallow incidence,
//!    re-triangulating each edge's link polygon fan-wise
//! 4. Drop elements outside the surface (six-ray parity vote from each
//!    centroid) and slivers, then renumber the surviving vertices

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod delaunay;
mod edit;
mod error;
mod links;
mod params;
mod points;
mod refine;
mod removal;
mod tetrahedralize;

// Re-export main types and functions
pub use edit::TetraEditor;
pub use error::{TetraError, TetraResult};
pub use params::TetraParams;
pub use tetrahedralize::{tetrahedralize, Tetrahedralization};

//! Isosurface stuffing of surface meshes on a BCC lattice.
//!
//! This crate fills the volume described by a triangulated surface with
//! tetrahedra by cutting and warping a body-centered cubic lattice against
//! the surface.
//!
//! # Features
//!
//! - **One-call pipeline**: [`stuff_mesh`] runs lattice construction,
//!   density sampling, edge cutting, vertex snapping and wedge triangulation
//! - **Two density sources**: distance-field splatting for a surface band,
//!   or ray-parity classification for the enclosed solid
//!   ([`DensitySource`])
//! - **Quality bounds**: lattice points too close to a cut snap onto it,
//!   which keeps the worst dihedral angles away from zero
//! - **Cooperative cancellation**: a shared [`mesh_types::ProgressContext`]
//!   carries a cancel flag and a coarse progress percentage
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Example
//!
//! ```
//! use mesh_stuff::{stuff_mesh, DensitySource, StuffParams};
//! use mesh_types::{unit_cube, ProgressContext};
//!
//! let progress = ProgressContext::new();
//! let params = StuffParams::with_subdivision(4).with_source(DensitySource::Geometry);
//! let mesh = stuff_mesh(&unit_cube(), &params, &progress)?;
//! assert!(!mesh.is_empty());
//! # Ok::<(), mesh_stuff::StuffError>(())
//! ```
//!
//! # Algorithm
//!
//! 1. Lay two interleaved cubic lattices (corners and cell centers) over the
//!    padded bounds; each cell owns 14 edges so every edge is cut once
//! 2. Sample a signed density at every lattice point and place a cut where
//!    an edge crosses the surface
//! 3. Snap lattice points onto cuts that are too close, removing short edges
//!    before they can become slivers
//! 4. Decompose every cell into wedges between adjacent cell centers, split
//!    the wedge faces by their cuts, and chop each wedge's closed shell into
//!    tetrahedra

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod grid;
mod params;
mod stuff;
mod triangulate;

// Re-export main types and functions
pub use error::{StuffError, StuffResult};
pub use params::{DensitySource, StuffParams};
pub use stuff::stuff_mesh;

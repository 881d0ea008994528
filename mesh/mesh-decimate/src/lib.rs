//! Mesh simplification using quadric error metrics.
//!
//! This crate decimates a triangulated surface by iteratively collapsing the
//! cheapest edge, where cost is measured by the accumulated quadric error of
//! the edge's endpoints.
//!
//! # Features
//!
//! - **Stepwise collapse**: [`Simplifier::simplification_step`] performs one
//!   collapse at a time; [`simplify_mesh`] drives it to a target count
//! - **Sampled cost**: candidate merge positions are sampled along the edge
//!   instead of inverting the (potentially singular) quadric system
//! - **Border preservation**: collapses that would shrink an open border are
//!   rejected
//! - **Manifold preservation**: collapses that would fold the surface into a
//!   non-manifold "bowtie" are rejected
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Example
//!
//! ```
//! use mesh_types::icosphere;
//! use mesh_decimate::{simplify_mesh, DecimateParams};
//!
//! let sphere = icosphere(2);
//! let result = simplify_mesh(&sphere, &DecimateParams::with_target_ratio(0.25))?;
//! println!("{result}");
//! assert!(result.final_triangles < sphere.faces.len());
//! # Ok::<(), mesh_decimate::DecimateError>(())
//! ```
//!
//! # Algorithm
//!
//! 1. For each triangle, compute a plane quadric and add it to the quadrics
//!    of its three vertices
//! 2. Score every undirected edge by sampling candidate merge positions
//!    between its endpoints and evaluating the summed quadric; queue all
//!    edges in an indexed binary min-heap
//! 3. Repeatedly pop the cheapest edge; skip it if the collapse is illegal
//!    (border mismatch, length bound, bowtie); otherwise merge the endpoints,
//!    drop the degenerated triangles and rescore the surviving vertex's edges
//!    in place
//! 4. Stop when the heap is exhausted or the target is reached

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod heap;
mod params;
mod quadric;
mod result;
mod simplify;

// Re-export main types and functions
pub use error::{DecimateError, DecimateResult};
pub use params::DecimateParams;
pub use quadric::Quadric;
pub use result::DecimationResult;
pub use simplify::{simplify_mesh, Simplifier};

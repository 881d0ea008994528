//! Uniform spatial hash grid for the meshing pipeline.
//!
//! This crate provides [`SpatialHash`], a proximity index over items
//! identified by `u32` indices. Items are registered with a point or an
//! axis-aligned bounding box; queries return the indices stored in every
//! grid cell overlapping a query region.
//!
//! The index is a *broad phase*: a query returns a conservative candidate
//! set (everything hashed into the overlapped cells, including hash
//! collisions from elsewhere), and callers apply their own exact test.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Example
//!
//! ```
//! use mesh_spatial::SpatialHash;
//! use nalgebra::Point3;
//!
//! let mut hash = SpatialHash::try_new(1.0)?;
//! hash.add_point(&Point3::new(0.5, 0.5, 0.5), 0);
//! hash.add_point(&Point3::new(0.6, 0.4, 0.5), 1);
//! hash.add_point(&Point3::new(9.0, 9.0, 9.0), 2);
//!
//! let near = hash.query_point(&Point3::new(0.5, 0.5, 0.5), None);
//! assert!(near.contains(&0));
//! assert!(near.contains(&1));
//! assert!(!near.contains(&2));
//! # Ok::<(), mesh_spatial::SpatialError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod hash;

pub use error::SpatialError;
pub use hash::SpatialHash;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

//! Tetrahedral mesh file I/O.
//!
//! This crate reads and writes volume meshes in a line-oriented text format:
//! `v` records for vertex positions, `t` records for tetrahedron index
//! tuples, and optional `l` records for barycentric links from original
//! surface vertices into the volume mesh.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! in CLI tools, servers and WASM builds alike.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_tet, save_tet};
//!
//! let (mesh, links) = load_tet("volume.tet")?;
//! save_tet(&mesh, &links, "copy.tet")?;
//! # Ok::<(), mesh_io::IoError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod tet;

// Re-export main types and functions
pub use error::{IoError, IoResult};
pub use tet::{load_tet, read_tet, save_tet, write_tet};

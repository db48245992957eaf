//! The gneiss map core.
//!
//! # Geometry
//!
//! Every allocated block of the map owns a [`MeshBlock`](crate::MeshBlock) in the [`MeshLayer`](crate::MeshLayer). Mesh
//! extraction fills a block with one vertex per triangle corner, so neighboring triangles repeat their shared corners.
//!
//! # Welding
//!
//! The [`VertexWelder`](crate::VertexWelder) removes those duplicates in place and rewrites the triangle indices to point at the
//! survivors. Exact welding compares bit patterns and accepts blocks of any size. Quantized welding compares positions snapped
//! to a lattice of edge length [`SpatialMergeTolerance`](crate::SpatialMergeTolerance) and runs as a single fixed-capacity
//! [`CooperativeGroup`](crate::CooperativeGroup), so it can also merge vertices that are merely close.
//!
//! # Pending Updates
//!
//! Integration touches blocks long before downstream consumers get around to them. The
//! [`BlocksToUpdateTracker`](crate::BlocksToUpdateTracker) remembers, per consumer, which blocks still need attention.

mod config;
mod layer;
mod layer_type;
mod mesh_block;
mod tracker;

pub mod weld;

pub use config::*;
pub use layer::*;
pub use layer_type::*;
pub use mesh_block::*;
pub use tracker::*;
pub use weld::{CooperativeGroup, SpatialMergeTolerance, VertexWelder, WeldMethod, WelderConfig};

//! gneiss: a block map whose meshes are welded on a compute stream and whose pending work is tracked per consumer.
//!
//! See [`gneiss_map`] for the data model and [`gneiss_core`] for the shared primitives.

mod config;
mod map;

pub use config::Config;
pub use map::BlockMap;

pub use gneiss_core;
pub use gneiss_map;

//! Resource management
//!
//! Geometry of the navigated scene.

mod mesh;

pub use mesh::*;

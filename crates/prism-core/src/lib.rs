//! Core types shared by the Prism platform layer.

pub mod error;
pub mod geometry;

pub use error::{Error, Result};
pub use geometry::{Extent, Position, WindowGeometry};

//! Window geometry value types.

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Screen-space position of a window's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Position plus extent of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub position: Position,
    pub extent: Extent,
}

impl WindowGeometry {
    pub const fn new(position: Position, extent: Extent) -> Self {
        Self { position, extent }
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            position: Position::default(),
            extent: Extent::new(1280, 720),
        }
    }
}

//! Near-square grid layout for a population.

use serde::{Deserialize, Serialize};

/// Size of a drawing surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for a degenerate surface.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 && self.width > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// A position in grid units (multiples of the cell spacing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

/// Grid of `columns x rows` cells holding `count` creatures.
///
/// `columns = round(sqrt(count * aspect))`, `rows = ceil(count / columns)`.
/// Cell `i` sits at column `i % columns`, row `i / columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    pub count: usize,
}

impl GridLayout {
    pub fn new(count: usize, aspect_ratio: f64) -> Self {
        let columns = ((count as f64 * aspect_ratio).sqrt().round() as usize).max(1);
        let rows = count.div_ceil(columns);
        Self {
            columns,
            rows,
            count,
        }
    }

    pub fn for_surface(count: usize, surface: SurfaceSize) -> Self {
        Self::new(count, surface.aspect_ratio())
    }

    /// Anchor point of cell `index`, in grid units.
    pub fn cell(&self, index: usize) -> GridPoint {
        GridPoint {
            x: (index % self.columns) as f64 + 1.0,
            y: (index / self.columns) as f64 + 1.5,
        }
    }

    /// Horizontal and vertical spacing in pixels.
    pub fn spacing(&self, surface: SurfaceSize) -> (f64, f64) {
        (
            surface.width / (self.columns as f64 + 1.0),
            surface.height / (self.rows as f64 + 1.0),
        )
    }

    /// Convert a grid point to pixels on `surface`.
    pub fn to_pixels(&self, point: GridPoint, surface: SurfaceSize) -> (f64, f64) {
        let (hs, vs) = self.spacing(surface);
        (point.x * hs, point.y * vs)
    }

    /// Cell index under a pixel position, if it lands on an occupied cell.
    pub fn cell_at(&self, x: f64, y: f64, surface: SurfaceSize) -> Option<usize> {
        let (hs, vs) = self.spacing(surface);
        let col = (x / hs - 0.5).floor();
        let row = (y / vs - 0.5).floor();
        if col < 0.0 || row < 0.0 || col >= self.columns as f64 || row >= self.rows as f64 {
            return None;
        }

        let index = col as usize + row as usize * self.columns;
        (index < self.count).then_some(index)
    }
}

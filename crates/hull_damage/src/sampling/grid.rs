//! Cell grid utilities for hole placement.
//!
//! [`CellGrid`] tiles an image into `cell_size × cell_size` cells addressed by
//! `(gx, gy)`. The last column and row are clipped to the image bounds.

/// Pixel rectangle of one grid cell, already clipped to the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRect {
    /// Left edge in image pixels.
    pub x: u32,
    /// Top edge in image pixels.
    pub y: u32,
    /// Clipped width in pixels.
    pub width: u32,
    /// Clipped height in pixels.
    pub height: u32,
}

/// Square tiling of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellGrid {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Nominal cell edge in pixels.
    pub cell_size: u32,
}

impl CellGrid {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        debug_assert!(cell_size > 0, "cell_size must be > 0");
        Self {
            width,
            height,
            cell_size: cell_size.max(1),
        }
    }

    /// Number of cell columns, counting a clipped last column.
    pub fn cols(&self) -> u32 {
        self.width.div_ceil(self.cell_size)
    }

    /// Number of cell rows, counting a clipped last row.
    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.cell_size)
    }

    pub fn cell_count(&self) -> usize {
        self.cols() as usize * self.rows() as usize
    }

    /// Returns the clipped rectangle of cell `(gx, gy)`, or `None` outside the grid.
    pub fn cell_rect(&self, gx: u32, gy: u32) -> Option<CellRect> {
        if gx >= self.cols() || gy >= self.rows() {
            return None;
        }
        let x = gx * self.cell_size;
        let y = gy * self.cell_size;
        Some(CellRect {
            x,
            y,
            width: (x + self.cell_size).min(self.width) - x,
            height: (y + self.cell_size).min(self.height) - y,
        })
    }

    /// Iterates all cells row-major as `(gx, gy, rect)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, CellRect)> + '_ {
        (0..self.rows()).flat_map(move |gy| {
            (0..self.cols()).filter_map(move |gx| self.cell_rect(gx, gy).map(|r| (gx, gy, r)))
        })
    }
}

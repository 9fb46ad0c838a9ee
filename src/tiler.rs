//! Slicing an indexed image into 8x8 blocks, metatile by metatile.
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::encode::{PixelBlock, TILE_SIZE};
use crate::error::{ChrError, Result};

/// A full image of color indices, row major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<PixelGrid> {
        if pixels.len() != width * height {
            return Err(ChrError::Dimension(format!(
                "{} pixels given for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(PixelGrid {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// The 8x8 block whose top left corner is at (x, y)
    pub fn block(&self, x: usize, y: usize) -> Result<PixelBlock> {
        if x + TILE_SIZE > self.width || y + TILE_SIZE > self.height {
            return Err(ChrError::Dimension(format!(
                "block at {},{} does not fit in a {}x{} image",
                x, y, self.width, self.height
            )));
        }
        let mut rows = [[0u8; TILE_SIZE]; TILE_SIZE];
        for (dy, row) in rows.iter_mut().enumerate() {
            let start = (y + dy) * self.width + x;
            row.copy_from_slice(&self.pixels[start..start + TILE_SIZE]);
        }
        Ok(PixelBlock::new(rows))
    }
}

/// Metatile size, and what to do with pixels that don't fill a whole one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    tile_width: usize,
    tile_height: usize,
    strict: bool,
}

impl Default for TileLayout {
    fn default() -> TileLayout {
        TileLayout {
            tile_width: TILE_SIZE,
            tile_height: TILE_SIZE,
            strict: false,
        }
    }
}

impl TileLayout {
    pub fn new(tile_width: usize, tile_height: usize) -> Result<TileLayout> {
        if tile_width == 0 {
            return Err(ChrError::Config(format!(
                "tile width '{}' must be positive",
                tile_width
            )));
        }
        if tile_height == 0 {
            return Err(ChrError::Config(format!(
                "tile height '{}' must be positive",
                tile_height
            )));
        }
        Ok(TileLayout {
            tile_width,
            tile_height,
            strict: false,
        })
    }

    /// In strict mode, partial metatiles and partial 8x8 tiles are errors
    /// instead of being dropped.
    pub fn with_strict(mut self, strict: bool) -> TileLayout {
        self.strict = strict;
        self
    }

    pub fn tile_width(&self) -> usize {
        self.tile_width
    }

    pub fn tile_height(&self) -> usize {
        self.tile_height
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    fn check_fit(&self, what: &str, outer: (usize, usize), inner: (usize, usize)) -> Result<()> {
        if outer.0 % inner.0 == 0 && outer.1 % inner.1 == 0 {
            return Ok(());
        }
        let msg = format!(
            "{} of {}x{} is not a multiple of {}x{}",
            what, outer.0, outer.1, inner.0, inner.1
        );
        if self.strict {
            return Err(ChrError::Config(msg));
        }
        warn!("{}, trailing pixels are dropped", msg);
        Ok(())
    }

    /// Top left corners of the 8x8 blocks of `grid`, in output order:
    /// metatiles row by row, then inside each metatile, 8x8 tiles row by row.
    pub fn block_origins(&self, grid: &PixelGrid) -> Result<Vec<(usize, usize)>> {
        self.check_fit(
            "image",
            (grid.width, grid.height),
            (self.tile_width, self.tile_height),
        )?;
        self.check_fit(
            "metatile",
            (self.tile_width, self.tile_height),
            (TILE_SIZE, TILE_SIZE),
        )?;
        let (columns, rows) = (grid.width / self.tile_width, grid.height / self.tile_height);
        let (sub_columns, sub_rows) = (self.tile_width / TILE_SIZE, self.tile_height / TILE_SIZE);
        let mut origins = Vec::with_capacity(columns * rows * sub_columns * sub_rows);
        for mt_y in 0..rows {
            for mt_x in 0..columns {
                for tile_y in 0..sub_rows {
                    for tile_x in 0..sub_columns {
                        origins.push((
                            mt_x * self.tile_width + tile_x * TILE_SIZE,
                            mt_y * self.tile_height + tile_y * TILE_SIZE,
                        ));
                    }
                }
            }
        }
        debug!(
            "{}x{} image: {}x{} metatiles of {} tiles",
            grid.width,
            grid.height,
            columns,
            rows,
            sub_columns * sub_rows
        );
        Ok(origins)
    }
}

/// Encodes every 8x8 block of `grid` with `encode`, in output order.
pub fn tile<F>(grid: &PixelGrid, layout: &TileLayout, mut encode: F) -> Result<Vec<Vec<u8>>>
where
    F: FnMut(&PixelBlock) -> Vec<u8>,
{
    layout
        .block_origins(grid)?
        .into_iter()
        .map(|(x, y)| grid.block(x, y).map(|block| encode(&block)))
        .collect()
}

/// Same as [`tile`], encoding blocks on the rayon thread pool. The output
/// order is the same.
pub fn tile_parallel<F>(grid: &PixelGrid, layout: &TileLayout, encode: F) -> Result<Vec<Vec<u8>>>
where
    F: Fn(&PixelBlock) -> Vec<u8> + Sync,
{
    layout
        .block_origins(grid)?
        .into_par_iter()
        .map(|(x, y)| grid.block(x, y).map(|block| encode(&block)))
        .collect()
}

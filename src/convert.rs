use std::path::Path;

use image::DynamicImage;
use tracing::info;

use crate::encode::{encode, PixelBlock};
use crate::error::Result;
use crate::indexed::{index_image, load_image, ColorMapping};
use crate::packbits::pack_with_header;
use crate::planemap::PlaneMap;
use crate::tiler::{tile, tile_parallel, PixelGrid, TileLayout};

/// Everything needed to turn an image into tile data
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub plan: PlaneMap,
    pub layout: TileLayout,
    pub hflip: bool,
    pub little: bool,
    pub packbits: bool,
    pub parallel: bool,
    pub mapping: ColorMapping,
}

impl Default for ConvertOptions {
    fn default() -> ConvertOptions {
        ConvertOptions {
            plan: crate::planemap::Format::Nes.plane_map(),
            layout: TileLayout::default(),
            hflip: false,
            little: false,
            packbits: false,
            parallel: false,
            mapping: ColorMapping::Native,
        }
    }
}

/// Converts the image file at `path`. Indexed PNGs keep their palette indices.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> Result<Vec<u8>> {
    encode_grid(&load_image(path, &options.mapping)?, options)
}

/// Converts a decoded image.
pub fn convert(img: &DynamicImage, options: &ConvertOptions) -> Result<Vec<u8>> {
    encode_grid(&index_image(img, &options.mapping)?, options)
}

/// Tiles and encodes a grid of color indices, then applies PackBits if asked.
pub fn encode_grid(grid: &PixelGrid, options: &ConvertOptions) -> Result<Vec<u8>> {
    let encode_block =
        |block: &PixelBlock| encode(block, &options.plan, options.hflip, options.little);
    let tiles = if options.parallel {
        tile_parallel(grid, &options.layout, encode_block)?
    } else {
        tile(grid, &options.layout, encode_block)?
    };
    let data = tiles.concat();
    info!(
        "{} tiles of {} bytes with plane map {}",
        tiles.len(),
        options.plan.bytes_per_tile(),
        options.plan
    );
    if options.packbits {
        let packed = pack_with_header(&data);
        info!("packbits: {} -> {} bytes", data.len(), packed.len());
        Ok(packed)
    } else {
        Ok(data)
    }
}

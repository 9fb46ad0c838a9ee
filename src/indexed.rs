//! Conversion of source images into grids of color indices.
//!
//! By default the pixel values stored in the image are used as they are:
//! palette indices for indexed PNGs, levels for grayscale images. Truecolor
//! images need either a palette or automatic numbering.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::{DynamicImage, Rgba};
use tracing::debug;

use crate::error::{ChrError, Result};
use crate::tiler::PixelGrid;

pub type Rgb = (u8, u8, u8);

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColorMapping {
    /// Pixel values of the image: palette index or gray level
    #[default]
    Native,
    /// Black or transparent is color 0, the other colors are numbered
    /// in order of appearance
    Auto,
    /// Color index is the position of the color in the list. Transparent
    /// pixels are color 0.
    Palette(Vec<Rgb>),
}

fn is_background(color: &Rgba<u8>) -> bool {
    color[3] == 0 || (color[0] == 0 && color[1] == 0 && color[2] == 0)
}

/// Reads the raw samples of an indexed or grayscale PNG (at most 8 bits per
/// pixel). Returns `None` for the other PNG color types.
pub fn png_indices(bytes: &[u8]) -> Result<Option<PixelGrid>> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let (color_type, bit_depth) = reader.output_color_type();
    match color_type {
        png::ColorType::Indexed | png::ColorType::Grayscale => {}
        _ => return Ok(None),
    }
    if bit_depth == png::BitDepth::Sixteen {
        return Ok(None);
    }
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let depth = info.bit_depth as usize;
    let mask = ((1u16 << depth) - 1) as u8;
    let (width, height) = (info.width as usize, info.height as usize);
    let mut pixels = Vec::with_capacity(width * height);
    // Samples are packed MSB first inside each row
    for row in buf.chunks(info.line_size).take(height) {
        for x in 0..width {
            let bit = x * depth;
            pixels.push((row[bit / 8] >> (8 - depth - bit % 8)) & mask);
        }
    }
    debug!(
        "{:?} PNG, {} bits per pixel, {}x{}",
        color_type, depth, width, height
    );
    PixelGrid::new(width, height, pixels).map(Some)
}

/// Reads `path` and turns it into color indices using `mapping`.
pub fn load_image(path: &Path, mapping: &ColorMapping) -> Result<PixelGrid> {
    let bytes = fs::read(path)?;
    if *mapping == ColorMapping::Native && bytes.starts_with(&PNG_SIGNATURE) {
        if let Some(grid) = png_indices(&bytes)? {
            return Ok(grid);
        }
    }
    let img = image::load_from_memory(&bytes)?;
    index_image(&img, mapping)
}

fn native_indices(img: &DynamicImage) -> Result<Vec<u8>> {
    match img {
        DynamicImage::ImageLuma8(gray) => Ok(gray.as_raw().clone()),
        DynamicImage::ImageLumaA8(gray) => Ok(gray.pixels().map(|p| p[0]).collect()),
        DynamicImage::ImageLuma16(gray) => gray
            .pixels()
            .map(|p| {
                u8::try_from(p[0]).map_err(|_| {
                    ChrError::Value(format!("gray level {} does not fit a color index", p[0]))
                })
            })
            .collect(),
        _ => Err(ChrError::Color(format!(
            "{:?} image has no color indices, give a palette or use automatic numbering",
            img.color()
        ))),
    }
}

/// Turns `img` into color indices using `mapping`.
///
/// Decoded images have lost their PNG palette, so `Native` only works here on
/// grayscale images. Use [`load_image`] to read indexed files.
pub fn index_image(img: &DynamicImage, mapping: &ColorMapping) -> Result<PixelGrid> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let pixels = match mapping {
        ColorMapping::Native => native_indices(img)?,
        ColorMapping::Auto => {
            let rgba = img.to_rgba8();
            let mut pixels = Vec::with_capacity(width * height);
            let mut colors: HashMap<Rgb, u8> = HashMap::new();
            for (x, y, color) in rgba.enumerate_pixels() {
                if is_background(color) {
                    pixels.push(0);
                    continue;
                }
                let rgb = (color[0], color[1], color[2]);
                let next = colors.len() + 1;
                let cx = match colors.get(&rgb) {
                    Some(&cx) => cx,
                    None => {
                        let cx = u8::try_from(next).map_err(|_| {
                            ChrError::Color(format!(
                                "more than 255 colors (new color {:?} found at {},{})",
                                rgb, x, y
                            ))
                        })?;
                        debug!("color {} affected to {:?}", cx, rgb);
                        colors.insert(rgb, cx);
                        cx
                    }
                };
                pixels.push(cx);
            }
            pixels
        }
        ColorMapping::Palette(palette) => {
            if palette.len() > 256 {
                return Err(ChrError::Value(format!(
                    "palette has {} colors, at most 256 can be indexed",
                    palette.len()
                )));
            }
            let rgba = img.to_rgba8();
            let mut pixels = Vec::with_capacity(width * height);
            for (x, y, color) in rgba.enumerate_pixels() {
                if color[3] == 0 {
                    pixels.push(0);
                    continue;
                }
                let rgb = (color[0], color[1], color[2]);
                match palette.iter().position(|c| *c == rgb) {
                    Some(cx) => pixels.push(cx as u8),
                    None => {
                        return Err(ChrError::Color(format!(
                            "unexpected color {:?} found at {},{}",
                            rgb, x, y
                        )))
                    }
                }
            }
            pixels
        }
    };
    PixelGrid::new(width, height, pixels)
}

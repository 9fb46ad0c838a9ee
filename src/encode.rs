//! 8x8 tile encoding into console bitplane formats.
use crate::error::{ChrError, Result};
use crate::planemap::PlaneMap;

pub const TILE_SIZE: usize = 8;

/// An 8x8 block of color indices, row major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBlock {
    rows: [[u8; TILE_SIZE]; TILE_SIZE],
}

impl PixelBlock {
    pub fn new(rows: [[u8; TILE_SIZE]; TILE_SIZE]) -> PixelBlock {
        PixelBlock { rows }
    }

    /// Builds a block from `width * height` row-major pixels. Only 8x8 is accepted.
    pub fn from_pixels(width: usize, height: usize, pixels: &[u8]) -> Result<PixelBlock> {
        if width != TILE_SIZE || height != TILE_SIZE {
            return Err(ChrError::Dimension(format!(
                "tile is {}x{}, expected {}x{}",
                width, height, TILE_SIZE, TILE_SIZE
            )));
        }
        if pixels.len() != TILE_SIZE * TILE_SIZE {
            return Err(ChrError::Dimension(format!(
                "tile holds {} pixels, expected {}",
                pixels.len(),
                TILE_SIZE * TILE_SIZE
            )));
        }
        let mut rows = [[0u8; TILE_SIZE]; TILE_SIZE];
        for (row, chunk) in rows.iter_mut().zip(pixels.chunks_exact(TILE_SIZE)) {
            row.copy_from_slice(chunk);
        }
        Ok(PixelBlock { rows })
    }

    pub fn rows(&self) -> &[[u8; TILE_SIZE]; TILE_SIZE] {
        &self.rows
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.rows[y][x]
    }

    /// Same block with every row reversed
    pub fn mirrored(&self) -> PixelBlock {
        let mut rows = self.rows;
        for row in rows.iter_mut() {
            row.reverse();
        }
        PixelBlock { rows }
    }
}

impl TryFrom<Vec<Vec<u8>>> for PixelBlock {
    type Error = ChrError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<PixelBlock> {
        let height = rows.len();
        let mut pixels = Vec::with_capacity(TILE_SIZE * TILE_SIZE);
        for row in &rows {
            if row.len() != TILE_SIZE {
                return Err(ChrError::Dimension(format!(
                    "tile row is {} pixels wide, expected {}",
                    row.len(),
                    TILE_SIZE
                )));
            }
            pixels.extend_from_slice(row);
        }
        PixelBlock::from_pixels(TILE_SIZE, height, &pixels)
    }
}

/// Packs bits MSB first, flushing a byte every 8 bits.
struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    current_byte: u8,
    current_bits: u8,
}

impl<'a> BitWriter<'a> {
    fn new(out: &'a mut Vec<u8>) -> BitWriter<'a> {
        BitWriter {
            out,
            current_byte: 0,
            current_bits: 0,
        }
    }

    fn push(&mut self, bit: u8) {
        self.current_byte = (self.current_byte << 1) | (bit & 1);
        self.current_bits += 1;
        if self.current_bits == 8 {
            self.out.push(self.current_byte);
            self.current_byte = 0;
            self.current_bits = 0;
        }
    }
}

fn pixel_bit(pixel: u8, bit: u8) -> u8 {
    ((u16::from(pixel) >> bit) & 1) as u8
}

/// Encodes one 8x8 block.
///
/// Planes are emitted one after the other. Inside a plane, each pixel row
/// produces, for every row-group, `bits.len()` bytes holding the selected
/// bits of the 8 pixels, left pixel in the most significant position.
///
/// With `hflip` the rightmost pixel goes to the most significant position
/// instead. With `little` the bytes of each row-group are reversed.
pub fn encode(block: &PixelBlock, plan: &PlaneMap, hflip: bool, little: bool) -> Vec<u8> {
    let block = if hflip { block.mirrored() } else { *block };
    let mut bytes = Vec::with_capacity(plan.bytes_per_tile());
    for plane in plan.planes() {
        for row in block.rows() {
            for group in plane.row_groups() {
                let start = bytes.len();
                let mut writer = BitWriter::new(&mut bytes);
                for &pixel in row {
                    for &bit in group.bits() {
                        writer.push(pixel_bit(pixel, bit));
                    }
                }
                // 8 pixels always fill whole bytes, nothing is left pending
                debug_assert_eq!(writer.current_bits, 0);
                if little {
                    bytes[start..].reverse();
                }
            }
        }
    }
    bytes
}

/// Inverse of [`encode`]: rebuilds the block from the first
/// `plan.bytes_per_tile()` bytes of `bytes`.
///
/// Bits the plan never mentions come back as 0. Bit indices above 7 can't be
/// stored in a pixel and are skipped.
pub fn decode(bytes: &[u8], plan: &PlaneMap, hflip: bool, little: bool) -> Result<PixelBlock> {
    let needed = plan.bytes_per_tile();
    if bytes.len() < needed {
        return Err(ChrError::Dimension(format!(
            "{} bytes given, a tile needs {}",
            bytes.len(),
            needed
        )));
    }
    let mut rows = [[0u8; TILE_SIZE]; TILE_SIZE];
    let mut pos = 0;
    for plane in plan.planes() {
        for row in rows.iter_mut() {
            for group in plane.row_groups() {
                let bits = group.bits();
                let mut chunk = bytes[pos..pos + bits.len()].to_vec();
                pos += bits.len();
                if little {
                    chunk.reverse();
                }
                for k in 0..TILE_SIZE * bits.len() {
                    let b = bits[k % bits.len()];
                    if b >= 8 {
                        continue;
                    }
                    let v = (chunk[k / 8] >> (7 - k % 8)) & 1;
                    let pixel = &mut row[k / bits.len()];
                    *pixel = (*pixel & !(1 << b)) | (v << b);
                }
            }
        }
    }
    let block = PixelBlock::new(rows);
    Ok(if hflip { block.mirrored() } else { block })
}

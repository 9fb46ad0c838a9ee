//! Conversion of bitmaps into retro console tile data.
//!
//! An image is indexed ([`indexed`]), cut into 8x8 tiles metatile by metatile
//! ([`tiler`]), and every tile is packed according to a plane map
//! ([`planemap`], [`mod@encode`]). The result can be compressed with PackBits
//! ([`packbits`]).
pub mod config;
pub mod convert;
pub mod encode;
pub mod error;
pub mod indexed;
pub mod packbits;
pub mod planemap;
pub mod tiler;

pub use crate::convert::{convert, ConvertOptions};
pub use crate::encode::{decode, encode, PixelBlock};
pub use crate::error::{ChrError, Result};
pub use crate::planemap::{Format, PlaneMap};
pub use crate::tiler::{tile, tile_parallel, PixelGrid, TileLayout};

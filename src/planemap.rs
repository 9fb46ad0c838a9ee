//! Plane map descriptors.
//!
//! A descriptor tells in which order the bits of each pixel color index are
//! laid out in a tile:
//!
//! | descriptor | layout                                  |
//! |------------|-----------------------------------------|
//! | `0`        | 1bpp                                    |
//! | `0;1`      | planar, planes one after the other (NES) |
//! | `0,1`      | planar, interleaved by rows (Game Boy)  |
//! | `0,1,2,3`  | 4 planes interleaved by rows (SMS)      |
//! | `0,1;2,3`  | two pairs of row interleaved planes (TG16/SNES) |
//! | `3210`     | chunky, 4 bits per pixel (Genesis)      |
//!
//! `;` separates planes, `,` separates row-groups inside a plane, and each
//! digit of a row-group is one bit index taken from every pixel, left to right.
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{ChrError, Result};

/// Bit indices are single decimal digits in descriptors
pub const MAX_BIT_INDEX: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    bits: Vec<u8>,
}

impl RowGroup {
    /// Bit indices, in emission order
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    groups: Vec<RowGroup>,
}

impl Plane {
    pub fn row_groups(&self) -> &[RowGroup] {
        &self.groups
    }
}

/// Parsed plane map. Built once per sheet, then shared by every tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneMap {
    planes: Vec<Plane>,
}

impl PlaneMap {
    /// Builds a plane map from raw bit indices (`[plane][row-group][bit]`).
    pub fn new(planes: Vec<Vec<Vec<u8>>>) -> Result<PlaneMap> {
        if planes.is_empty() {
            return Err(ChrError::Format("a plane map needs at least one plane".into()));
        }
        let mut out = Vec::with_capacity(planes.len());
        for (p, plane) in planes.into_iter().enumerate() {
            let mut groups = Vec::with_capacity(plane.len());
            for (g, bits) in plane.into_iter().enumerate() {
                if bits.is_empty() {
                    return Err(ChrError::Format(format!(
                        "row-group {} of plane {} is empty",
                        g, p
                    )));
                }
                if let Some(b) = bits.iter().find(|&&b| b > MAX_BIT_INDEX) {
                    return Err(ChrError::Value(format!(
                        "bit index {} in plane {} is not a single digit",
                        b, p
                    )));
                }
                groups.push(RowGroup { bits });
            }
            if groups.is_empty() {
                return Err(ChrError::Format(format!("plane {} is empty", p)));
            }
            out.push(Plane { groups });
        }
        Ok(PlaneMap { planes: out })
    }

    /// Parses a textual descriptor such as `0,1;2,3`.
    pub fn parse(descriptor: &str) -> Result<PlaneMap> {
        if let Some((pos, c)) = descriptor
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == ',' || *c == ';'))
        {
            return Err(ChrError::Format(format!(
                "unexpected character {:?} at position {} in {:?}",
                c, pos, descriptor
            )));
        }
        let planes = descriptor
            .split(';')
            .map(|plane| {
                plane
                    .split(',')
                    .map(|group| group.bytes().map(|c| c - b'0').collect())
                    .collect()
            })
            .collect();
        PlaneMap::new(planes).map_err(|e| match e {
            ChrError::Format(msg) => ChrError::Format(format!("{} in {:?}", msg, descriptor)),
            e => e,
        })
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Number of bytes produced for one 8x8 tile
    pub fn bytes_per_tile(&self) -> usize {
        // 8 pixels of n bits make n bytes per row, for each of the 8 rows
        self.planes
            .iter()
            .flat_map(|p| p.groups.iter())
            .map(|g| g.bits.len() * 8)
            .sum()
    }

    /// Number of low bits of a color index the map reads
    pub fn bits_per_pixel(&self) -> u8 {
        self.planes
            .iter()
            .flat_map(|p| p.groups.iter())
            .flat_map(|g| g.bits.iter())
            .max()
            .map_or(0, |b| b + 1)
    }
}

impl FromStr for PlaneMap {
    type Err = ChrError;

    fn from_str(s: &str) -> Result<PlaneMap> {
        PlaneMap::parse(s)
    }
}

impl fmt::Display for PlaneMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (p, plane) in self.planes.iter().enumerate() {
            if p != 0 {
                write!(f, ";")?;
            }
            for (g, group) in plane.groups.iter().enumerate() {
                if g != 0 {
                    write!(f, ",")?;
                }
                for b in &group.bits {
                    write!(f, "{}", b)?;
                }
            }
        }
        Ok(())
    }
}

/// Well known console tile formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// 1 bit per pixel
    #[value(name = "1bpp")]
    #[serde(rename = "1bpp")]
    OneBpp,
    /// NES: 2 planes, one after the other
    Nes,
    /// Game Boy: 2 planes interleaved by rows
    Gb,
    /// Master System / Game Gear: 4 planes interleaved by rows
    Sms,
    /// PC Engine / TurboGrafx-16: same layout as SNES
    Tg16,
    /// Super NES 4bpp
    Snes,
    /// Mega Drive / Genesis: 4bpp chunky, left pixel in high nibble
    Md,
    /// Game Boy Advance: 4bpp chunky, left pixel in low nibble
    Gba,
}

impl Format {
    pub fn descriptor(self) -> &'static str {
        match self {
            Format::OneBpp => "0",
            Format::Nes => "0;1",
            Format::Gb => "0,1",
            Format::Sms => "0,1,2,3",
            Format::Tg16 | Format::Snes => "0,1;2,3",
            Format::Md | Format::Gba => "3210",
        }
    }

    pub fn hflip(self) -> bool {
        self == Format::Gba
    }

    pub fn little(self) -> bool {
        self == Format::Gba
    }

    pub fn plane_map(self) -> PlaneMap {
        // Presets are well-formed constants
        PlaneMap::parse(self.descriptor()).unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snes() {
        let map = PlaneMap::parse("0,1;2,3").unwrap();
        assert_eq!(map.planes().len(), 2);
        for (p, plane) in map.planes().iter().enumerate() {
            assert_eq!(plane.row_groups().len(), 2);
            for (g, group) in plane.row_groups().iter().enumerate() {
                assert_eq!(group.bits(), &[(p * 2 + g) as u8]);
            }
        }
    }

    #[test]
    fn test_parse_keeps_digit_order() {
        let map = PlaneMap::parse("10").unwrap();
        assert_eq!(map.planes().len(), 1);
        assert_eq!(map.planes()[0].row_groups().len(), 1);
        assert_eq!(map.planes()[0].row_groups()[0].bits(), &[1, 0]);

        let map = PlaneMap::parse("001").unwrap();
        assert_eq!(map.planes()[0].row_groups()[0].bits(), &[0, 0, 1]);
    }

    #[test]
    fn test_parse_rejects_bad_characters() {
        for d in ["0;a", "0 1", "0;1\n", "x", "0.1", "-1"] {
            assert!(
                matches!(PlaneMap::parse(d), Err(ChrError::Format(_))),
                "{:?} should be rejected",
                d
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_groups() {
        for d in ["", ";", "0;", ",1", "0,,1", "0;1;"] {
            assert!(
                matches!(PlaneMap::parse(d), Err(ChrError::Format(_))),
                "{:?} should be rejected",
                d
            );
        }
    }

    #[test]
    fn test_new_rejects_wide_bit_index() {
        assert!(matches!(
            PlaneMap::new(vec![vec![vec![0, 10]]]),
            Err(ChrError::Value(_))
        ));
        assert!(matches!(PlaneMap::new(vec![]), Err(ChrError::Format(_))));
        assert!(matches!(PlaneMap::new(vec![vec![]]), Err(ChrError::Format(_))));
        assert!(PlaneMap::new(vec![vec![vec![9]]]).is_ok());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(PlaneMap::parse("0").unwrap().bytes_per_tile(), 8);
        assert_eq!(PlaneMap::parse("0;1").unwrap().bytes_per_tile(), 16);
        assert_eq!(PlaneMap::parse("0,1;2,3").unwrap().bytes_per_tile(), 32);
        assert_eq!(PlaneMap::parse("3210").unwrap().bytes_per_tile(), 32);
        assert_eq!(PlaneMap::parse("0,1").unwrap().bits_per_pixel(), 2);
        assert_eq!(PlaneMap::parse("3210").unwrap().bits_per_pixel(), 4);
        assert_eq!(PlaneMap::parse("7").unwrap().bits_per_pixel(), 8);
    }

    #[test]
    fn test_display_roundtrip() {
        for d in ["0", "0;1", "0,1", "0,1,2,3", "0,1;2,3", "3210", "10;32,4"] {
            assert_eq!(PlaneMap::parse(d).unwrap().to_string(), d);
        }
    }

    #[test]
    fn test_presets() {
        assert_eq!(Format::Nes.plane_map(), "0;1".parse::<PlaneMap>().unwrap());
        assert_eq!(Format::Snes.plane_map(), Format::Tg16.plane_map());
        assert!(Format::Gba.hflip() && Format::Gba.little());
        assert!(!Format::Md.hflip() && !Format::Md.little());
    }
}

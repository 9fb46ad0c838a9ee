//! YAML description of several tile sheets to convert in one go.
//!
//! ```yaml
//! palettes:
//!   - name: hud
//!     colors: [[0, 0, 0], [255, 255, 255], [128, 128, 128], [64, 64, 64]]
//! tile_sheets:
//!   - image: hud.png
//!     output: hud.chr
//!     format: nes
//!     tile_height: 16
//!     palette: hud
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::convert::ConvertOptions;
use crate::error::ChrError;
use crate::indexed::{ColorMapping, Rgb};
use crate::planemap::{Format, PlaneMap};
use crate::tiler::TileLayout;

#[derive(Debug, Deserialize)]
pub struct AllSheets {
    #[serde(default)]
    pub palettes: Option<Vec<Palette>>,
    pub tile_sheets: Vec<TileSheet>,
}

#[derive(Debug, Deserialize)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<Rgb>,
}

#[derive(Debug, Deserialize)]
pub struct TileSheet {
    pub image: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub planes: Option<String>,
    #[serde(default = "default_tile_size")]
    pub tile_width: usize,
    #[serde(default = "default_tile_size")]
    pub tile_height: usize,
    #[serde(default)]
    pub hflip: bool,
    #[serde(default)]
    pub little: bool,
    #[serde(default)]
    pub packbits: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub palette: Option<String>,
    /// Number colors in order of appearance instead of using pixel values
    #[serde(default)]
    pub auto: bool,
}

fn default_tile_size() -> usize {
    8
}

fn default_planes() -> String {
    "0;1".to_string()
}

/// A sheet ready to be converted: where to read, where to write, and how
#[derive(Debug, Clone)]
pub struct Job {
    pub image: PathBuf,
    pub output: PathBuf,
    pub options: ConvertOptions,
}

impl AllSheets {
    pub fn from_yaml(contents: &str) -> Result<AllSheets> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<AllSheets> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Unable to read input file {}", path.display()))?;
        AllSheets::from_yaml(&contents).with_context(|| format!("In {}", path.display()))
    }

    fn palette(&self, name: &str) -> Result<Vec<Rgb>, ChrError> {
        self.palettes
            .iter()
            .flatten()
            .find(|p| p.name == name)
            .map(|p| p.colors.clone())
            .ok_or_else(|| ChrError::Config(format!("unknown palette {}", name)))
    }

    /// Resolves every sheet. Relative paths are taken from `base_dir`, an
    /// output of `-` stays standard output.
    pub fn jobs(&self, base_dir: &Path) -> Result<Vec<Job>, ChrError> {
        self.tile_sheets
            .iter()
            .map(|sheet| -> Result<Job, ChrError> {
                let mut hflip = sheet.hflip;
                let mut little = sheet.little;
                let plan = match (&sheet.planes, sheet.format) {
                    (Some(planes), _) => PlaneMap::parse(planes)?,
                    (None, Some(format)) => format.plane_map(),
                    (None, None) => PlaneMap::parse(&default_planes())?,
                };
                if let Some(format) = sheet.format {
                    hflip |= format.hflip();
                    little |= format.little();
                }
                let mapping = match (&sheet.palette, sheet.auto) {
                    (Some(name), false) => ColorMapping::Palette(self.palette(name)?),
                    (None, true) => ColorMapping::Auto,
                    (None, false) => ColorMapping::Native,
                    (Some(_), true) => {
                        return Err(ChrError::Config(format!(
                            "{}: palette and auto can't be used together",
                            sheet.image.display()
                        )))
                    }
                };
                let layout =
                    TileLayout::new(sheet.tile_width, sheet.tile_height)?.with_strict(sheet.strict);
                let output = if sheet.output == Path::new("-") {
                    sheet.output.clone()
                } else {
                    base_dir.join(&sheet.output)
                };
                Ok(Job {
                    image: base_dir.join(&sheet.image),
                    output,
                    options: ConvertOptions {
                        plan,
                        layout,
                        hflip,
                        little,
                        packbits: sheet.packbits,
                        parallel: sheet.parallel,
                        mapping,
                    },
                })
            })
            .collect()
    }
}

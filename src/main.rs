use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bmp2chr::config::{AllSheets, Job};
use bmp2chr::indexed::{ColorMapping, Rgb};
use bmp2chr::convert::convert_file;
use bmp2chr::{ConvertOptions, Format, PlaneMap, TileLayout};

/// Tool that converts bitmaps into tile data for retro consoles
/// (NES, Game Boy, Master System, TG16/SNES, Mega Drive, GBA)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read image from INFILE
    #[arg(short = 'i', long = "image", value_name = "INFILE")]
    image: Option<PathBuf>,
    /// Write tile data to OUTFILE (default: standard output)
    #[arg(short, long, value_name = "OUTFILE")]
    output: Option<PathBuf>,
    /// INFILE and OUTFILE, when not given with -i and -o
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
    /// Width of metatiles
    #[arg(short = 'W', long, default_value_t = 8)]
    tile_width: usize,
    /// Height of metatiles
    #[arg(short = 'H', long, default_value_t = 8)]
    tile_height: usize,
    /// 1bpp mode (same as --planes 0)
    #[arg(short = '1', default_value = "false", conflicts_with = "planes")]
    one_bpp: bool,
    /// Plane map (1bpp: 0) (NES: 0;1) (GB: 0,1) (SMS: 0,1,2,3) (TG16/SNES: 0,1;2,3) (MD: 3210)
    #[arg(long)]
    planes: Option<String>,
    /// Console preset, setting plane map, flip and byte order
    #[arg(short, long, value_enum)]
    format: Option<Format>,
    /// Horizontally flip all tiles (most significant pixel on the right)
    #[arg(long, default_value = "false")]
    hflip: bool,
    /// Reverse the bytes within each row-plane (needed for GBA)
    #[arg(long, default_value = "false")]
    little: bool,
    /// Use PackBits RLE compression
    #[arg(long, default_value = "false")]
    packbits: bool,
    /// Fail on images that don't divide evenly into tiles instead of dropping the remainder
    #[arg(long, default_value = "false")]
    strict: bool,
    /// Encode tiles on all cores
    #[arg(long, default_value = "false")]
    parallel: bool,
    /// Colors of the palette, in index order (ex: 000000,ffffff,aaaaaa,555555)
    #[arg(short, long, value_delimiter = ',', value_parser = parse_color)]
    palette: Vec<Rgb>,
    /// Number colors in order of appearance (black or transparent first)
    /// instead of using the image palette indices or gray levels
    #[arg(short, long, default_value = "false", conflicts_with = "palette")]
    auto: bool,
    /// Tile sheets description (YAML file). Other conversion options are ignored
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log progress information
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("{} is not a rrggbb color", s));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{}: {}", s, e))
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

impl Args {
    fn options(&self) -> Result<ConvertOptions> {
        let plan = if self.one_bpp {
            Format::OneBpp.plane_map()
        } else if let Some(planes) = &self.planes {
            PlaneMap::parse(planes)?
        } else if let Some(format) = self.format {
            format.plane_map()
        } else {
            Format::Nes.plane_map()
        };
        let preset = |f: fn(Format) -> bool| self.format.is_some_and(f);
        let mapping = if !self.palette.is_empty() {
            ColorMapping::Palette(self.palette.clone())
        } else if self.auto {
            ColorMapping::Auto
        } else {
            ColorMapping::Native
        };
        Ok(ConvertOptions {
            plan,
            layout: TileLayout::new(self.tile_width, self.tile_height)?.with_strict(self.strict),
            hflip: self.hflip || preset(Format::hflip),
            little: self.little || preset(Format::little),
            packbits: self.packbits,
            parallel: self.parallel,
            mapping,
        })
    }

    /// Input and output files, filling missing -i/-o with positional arguments
    fn files(&self) -> Result<(PathBuf, PathBuf)> {
        let mut positional = self.files.iter().cloned();
        let image = match &self.image {
            Some(image) => image.clone(),
            None => positional.next().ok_or_else(|| anyhow!("not enough filenames"))?,
        };
        let output = match &self.output {
            Some(output) => output.clone(),
            None => positional.next().unwrap_or_else(|| PathBuf::from("-")),
        };
        if let Some(extra) = positional.next() {
            return Err(anyhow!("unexpected argument {}", extra.display()));
        }
        Ok((image, output))
    }
}

/// Whether `job` writes to standard output, refused when that is a terminal
fn to_stdout(job: &Job, terminal: bool) -> Result<bool> {
    let to_stdout = job.output == Path::new("-");
    if to_stdout && terminal {
        return Err(anyhow!("cannot write tile data to terminal"));
    }
    Ok(to_stdout)
}

fn run(job: &Job) -> Result<()> {
    let to_stdout = to_stdout(job, io::stdout().is_terminal())?;
    let data = convert_file(&job.image, &job.options)
        .with_context(|| format!("Can't convert image {}", job.image.display()))?;
    if to_stdout {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&data)?;
        stdout.flush()?;
    } else {
        fs::write(&job.output, &data)
            .with_context(|| format!("Can't write {}", job.output.display()))?;
    }
    info!(
        "{} -> {} ({} bytes)",
        job.image.display(),
        job.output.display(),
        data.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "bmp2chr=info" } else { "bmp2chr=warn" };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let jobs = if let Some(config) = &args.config {
        let base_dir = config.parent().unwrap_or(Path::new("."));
        AllSheets::load(config)?.jobs(base_dir)?
    } else {
        let (image, output) = args.files()?;
        vec![Job {
            image,
            output,
            options: args.options()?,
        }]
    };

    for job in &jobs {
        run(job)?;
    }
    Ok(())
}

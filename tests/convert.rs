use std::fs;

use bmp2chr::config::AllSheets;
use bmp2chr::convert::convert_file;
use bmp2chr::indexed::ColorMapping;
use bmp2chr::packbits::unpack;
use bmp2chr::{convert, decode, ConvertOptions, Format, PlaneMap, TileLayout};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

const GRAYS: [(u8, u8, u8); 4] = [(0, 0, 0), (85, 85, 85), (170, 170, 170), (255, 255, 255)];

// Pixel (x, y) gets color index (x + y / 8) % 4
fn sheet(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let (r, g, b) = GRAYS[((x + y / 8) % 4) as usize];
        *px = Rgba([r, g, b, 255]);
    }
    img
}

fn gray_options(plan: PlaneMap) -> ConvertOptions {
    ConvertOptions {
        plan,
        mapping: ColorMapping::Palette(GRAYS.to_vec()),
        ..ConvertOptions::default()
    }
}

#[test]
fn test_nes_sheet() {
    let img = DynamicImage::ImageRgba8(sheet(16, 8));
    let data = convert(&img, &gray_options(Format::Nes.plane_map())).unwrap();
    assert_eq!(data.len(), 2 * 16);
    // indices 0 1 2 3 0 1 2 3 on every row
    let mut tile = vec![0x55u8; 8];
    tile.extend([0x33u8; 8]);
    assert_eq!(&data[..16], &tile[..]);
    assert_eq!(&data[16..], &tile[..]);
}

#[test]
fn test_tiles_decode_back() {
    let img = sheet(32, 24);
    let plan = Format::Snes.plane_map();
    let data = convert(&DynamicImage::ImageRgba8(img), &gray_options(plan.clone())).unwrap();
    assert_eq!(data.len(), 4 * 3 * plan.bytes_per_tile());
    for (n, bytes) in data.chunks(plan.bytes_per_tile()).enumerate() {
        let block = decode(bytes, &plan, false, false).unwrap();
        let (tx, ty) = (n % 4, n / 4);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(
                    block.get(x, y) as usize,
                    (tx * 8 + x + (ty * 8 + y) / 8) % 4,
                    "tile {} pixel {},{}",
                    n,
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn test_strict_layout() {
    let img = DynamicImage::ImageRgba8(sheet(20, 8));
    let lenient = convert(&img, &gray_options(Format::Gb.plane_map())).unwrap();
    assert_eq!(lenient.len(), 2 * 16);

    let strict = ConvertOptions {
        layout: TileLayout::default().with_strict(true),
        ..gray_options(Format::Gb.plane_map())
    };
    assert!(matches!(
        convert(&img, &strict),
        Err(bmp2chr::ChrError::Config(_))
    ));
}

#[test]
fn test_yaml_sheets() {
    let dir = tempfile::tempdir().unwrap();
    sheet(16, 16).save(dir.path().join("font.png")).unwrap();
    let yaml = r#"
palettes:
  - name: grays
    colors: [[0, 0, 0], [85, 85, 85], [170, 170, 170], [255, 255, 255]]
tile_sheets:
  - image: font.png
    output: font.chr
    palette: grays
  - image: font.png
    output: font.pkb
    format: gb
    tile_height: 16
    palette: grays
    packbits: true
"#;
    let config = dir.path().join("tiles.yaml");
    fs::write(&config, yaml).unwrap();

    let jobs = AllSheets::load(&config).unwrap().jobs(dir.path()).unwrap();
    assert_eq!(jobs.len(), 2);
    for job in &jobs {
        let img = image::open(&job.image).unwrap();
        fs::write(&job.output, convert(&img, &job.options).unwrap()).unwrap();
    }

    let chr = fs::read(dir.path().join("font.chr")).unwrap();
    assert_eq!(chr.len(), 4 * 16);

    let pkb = fs::read(dir.path().join("font.pkb")).unwrap();
    assert_eq!(&pkb[..2], &[0x00, 0x40]);
    let gb = unpack(&pkb[2..]).unwrap();
    assert_eq!(gb.len(), 64);
    // 8x16 metatiles: the second tile out is the one below the first
    let plan = Format::Gb.plane_map();
    let below = decode(&gb[16..32], &plan, false, false).unwrap();
    assert_eq!(below.get(0, 0), 1);
    let right = decode(&gb[32..48], &plan, false, false).unwrap();
    assert_eq!(right.get(0, 0), 0);
}

#[test]
fn test_gray_png_levels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("levels.png");
    GrayImage::from_fn(8, 8, |x, _| Luma([[3, 2, 1, 0][x as usize % 4]]))
        .save(&path)
        .unwrap();
    let data = convert_file(&path, &ConvertOptions::default()).unwrap();
    let mut tile = vec![0xaau8; 8];
    tile.extend([0xccu8; 8]);
    assert_eq!(data, tile);
}

#[test]
fn test_indexed_png_keeps_palette_order() {
    // palette: white, black, red, green; first pixels seen are green then red
    let mut png_data = Vec::new();
    let mut encoder = png::Encoder::new(&mut png_data, 8, 8);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![255, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 0]);
    let mut writer = encoder.write_header().unwrap();
    let row = [3u8, 2, 1, 0, 3, 2, 1, 0];
    writer.write_image_data(&row.repeat(8)).unwrap();
    writer.finish().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.png");
    fs::write(&path, &png_data).unwrap();

    let data = convert_file(&path, &ConvertOptions::default()).unwrap();
    let mut tile = vec![0xaau8; 8];
    tile.extend([0xccu8; 8]);
    assert_eq!(data, tile);

    // numbering by appearance gives other bitplanes
    let auto = ConvertOptions {
        mapping: ColorMapping::Auto,
        ..ConvertOptions::default()
    };
    assert_ne!(convert_file(&path, &auto).unwrap(), tile);
}

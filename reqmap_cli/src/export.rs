//! Exports: pretty-printed JSON and a rasterized JPEG of the mind map

use crate::config::{MethodColors, Rgb};
use crate::tree::{assign_positions, TreeNode};
use anyhow::{Context, Result};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};
use reqmap_common::RequestRecord;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Pixel geometry matching the on-screen map
const STEP_X: f64 = 250.0;
const STEP_Y: f64 = 60.0;
const MARGIN: f64 = 50.0;
const NODE_WIDTH: u32 = 180;
const NODE_HEIGHT: u32 = 40;
const LABEL_SIZE: f32 = 14.0;

const PAGE_BACKGROUND: Rgb = Rgb(0xff, 0xff, 0xff);
const PLAIN_BACKGROUND: Rgb = Rgb(0xec, 0xf0, 0xf1);
const PLAIN_FOREGROUND: Rgb = Rgb(0x2c, 0x3e, 0x50);
const CONNECTOR: Rgb = Rgb(0x34, 0x98, 0xdb);

/// Write the record snapshot as a pretty-printed JSON array.
pub fn export_json(records: &[RequestRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write JSON export to {}", path.display()))?;
    Ok(())
}

/// Rasterize the mind map (laid out fresh, honoring collapse states) and
/// encode it as a JPEG file.
pub fn export_jpeg(root: &mut TreeNode, colors: &MethodColors, path: &Path) -> Result<()> {
    assign_positions(root, MARGIN, MARGIN, STEP_X, STEP_Y);
    let image = render_bitmap(root, colors);

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create image file {}", path.display()))?;
    let mut encoder = JpegEncoder::new_with_quality(&mut file, 90);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .context("Failed to encode JPEG")?;
    debug!(path = %path.display(), "Exported mind map image");
    Ok(())
}

/// Draw the positioned tree into an RGB bitmap.
pub fn render_bitmap(root: &TreeNode, colors: &MethodColors) -> RgbImage {
    let (width, height) = bitmap_extents(root);
    let mut image = RgbImage::from_pixel(width, height, pixel(PAGE_BACKGROUND));
    let font = load_label_font();

    // Connectors first so node boxes paint over the line ends
    draw_connectors(&mut image, root);
    draw_nodes(&mut image, root, colors, &font);
    image
}

/// Bitmap size needed to fit every displayed node plus margins
fn bitmap_extents(root: &TreeNode) -> (u32, u32) {
    let mut max_x: f64 = 0.0;
    let mut max_y: f64 = 0.0;
    for node in root.visible_nodes() {
        max_x = max_x.max(node.x);
        max_y = max_y.max(node.y);
    }
    let width = (max_x + NODE_WIDTH as f64 + MARGIN).ceil() as u32;
    let height = (max_y + NODE_HEIGHT as f64 + MARGIN).ceil() as u32;
    (width.max(1), height.max(1))
}

fn draw_connectors(image: &mut RgbImage, node: &TreeNode) {
    if node.collapsed {
        return;
    }
    let (px, py) = node_center(node);
    for child in &node.children {
        let (cx, cy) = node_center(child);
        draw_line(image, px, py, cx, cy, CONNECTOR, 2);
        draw_connectors(image, child);
    }
}

fn draw_nodes(
    image: &mut RgbImage,
    node: &TreeNode,
    colors: &MethodColors,
    font: &Option<fontdue::Font>,
) {
    let (background, foreground) = node
        .record
        .as_ref()
        .and_then(|record| colors.for_record(record))
        .unwrap_or((PLAIN_BACKGROUND, PLAIN_FOREGROUND));

    let x0 = node.x.round() as i32;
    let y0 = node.y.round() as i32;
    let x1 = x0 + NODE_WIDTH as i32;
    let y1 = y0 + NODE_HEIGHT as i32;
    draw_rect_filled(image, x0, y0, x1, y1, background);
    draw_text(
        image,
        font,
        &node.label,
        LABEL_SIZE,
        x0 as f32 + 8.0,
        (y0 + y1) as f32 / 2.0,
        (NODE_WIDTH as f32 - 16.0).max(1.0),
        foreground,
    );

    if !node.collapsed {
        for child in &node.children {
            draw_nodes(image, child, colors, font);
        }
    }
}

fn node_center(node: &TreeNode) -> (i32, i32) {
    (
        (node.x + NODE_WIDTH as f64 / 2.0).round() as i32,
        (node.y + NODE_HEIGHT as f64 / 2.0).round() as i32,
    )
}

/// Load a label font: `REQMAP_FONT` first, then a few common system
/// locations. Without a font the export still renders boxes and lines.
fn load_label_font() -> Option<fontdue::Font> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("REQMAP_FONT") {
        candidates.push(std::path::PathBuf::from(path));
    }
    for path in [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ] {
        candidates.push(std::path::PathBuf::from(path));
    }

    for path in candidates {
        if let Ok(bytes) = fs::read(&path) {
            if let Ok(font) = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
                return Some(font);
            }
        }
    }
    None
}

fn pixel(color: Rgb) -> image::Rgb<u8> {
    image::Rgb([color.0, color.1, color.2])
}

fn set_pixel(image: &mut RgbImage, x: i32, y: i32, color: Rgb) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    image.put_pixel(x as u32, y as u32, pixel(color));
}

fn draw_rect_filled(image: &mut RgbImage, min_x: i32, min_y: i32, max_x: i32, max_y: i32, color: Rgb) {
    for y in min_y..max_y {
        for x in min_x..max_x {
            set_pixel(image, x, y, color);
        }
    }
}

fn draw_thick_point(image: &mut RgbImage, x: i32, y: i32, color: Rgb, thickness: i32) {
    let radius = (thickness.max(1) - 1) / 2;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            set_pixel(image, x + dx, y + dy, color);
        }
    }
}

/// Bresenham line with thickness
fn draw_line(
    image: &mut RgbImage,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    color: Rgb,
    thickness: i32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        draw_thick_point(image, x0, y0, color, thickness);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Render a label with its baseline vertically centered on `center_y`,
/// shrinking the size until it fits `max_width`.
#[allow(clippy::too_many_arguments)]
fn draw_text(
    image: &mut RgbImage,
    font: &Option<fontdue::Font>,
    text: &str,
    size: f32,
    x: f32,
    center_y: f32,
    max_width: f32,
    color: Rgb,
) {
    let Some(font) = font.as_ref() else {
        return;
    };
    let size = fit_text_size(font, text, size, max_width, 7.0);

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    let mut settings = LayoutSettings::default();
    settings.x = x;
    if let Some(metrics) = font.horizontal_line_metrics(size) {
        let baseline = center_y + (metrics.ascent + metrics.descent) * 0.5;
        settings.y = baseline - metrics.ascent;
    } else {
        settings.y = center_y - size * 0.5;
    }
    layout.reset(&settings);
    layout.append(&[font], &TextStyle::new(text, size, 0));

    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        if glyph.x - x > max_width {
            break;
        }
        let (metrics, bitmap) = font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
        blend_glyph(image, glyph.x, glyph.y, metrics.width, metrics.height, &bitmap, color);
    }
}

fn measure_text_width(font: &fontdue::Font, text: &str, size: f32) -> f32 {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(text, size, 0));
    layout
        .glyphs()
        .iter()
        .map(|glyph| glyph.x + glyph.width as f32)
        .fold(0.0, f32::max)
}

fn fit_text_size(font: &fontdue::Font, text: &str, size: f32, max_width: f32, min_size: f32) -> f32 {
    let width = measure_text_width(font, text, size);
    if width <= max_width || width <= 0.0 {
        return size;
    }
    (size * max_width / width).max(min_size)
}

fn blend_glyph(
    image: &mut RgbImage,
    x: f32,
    y: f32,
    width: usize,
    height: usize,
    bitmap: &[u8],
    color: Rgb,
) {
    let start_x = x.floor() as i32;
    let start_y = y.floor() as i32;
    for row in 0..height {
        for col in 0..width {
            let alpha = bitmap[row * width + col] as u16;
            if alpha == 0 {
                continue;
            }
            let px = start_x + col as i32;
            let py = start_y + row as i32;
            if px < 0 || py < 0 || px >= image.width() as i32 || py >= image.height() as i32 {
                continue;
            }
            let existing = image.get_pixel(px as u32, py as u32).0;
            let blend = |fg: u8, bg: u8| -> u8 {
                ((fg as u16 * alpha + bg as u16 * (255 - alpha)) / 255) as u8
            };
            image.put_pixel(
                px as u32,
                py as u32,
                image::Rgb([
                    blend(color.0, existing[0]),
                    blend(color.1, existing[1]),
                    blend(color.2, existing[2]),
                ]),
            );
        }
    }
}

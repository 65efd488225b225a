use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::path::Path;
use tracing::{debug, warn};

use super::anchor::Anchor;
use super::color::{DEFAULT_COLOR, parse_hex_color};
use super::error::WatermarkError;
use super::handle::WatermarkHandle;

pub const DEFAULT_SIZE: f64 = 40.0;
pub const DEFAULT_DPI: f64 = 100.0;

/// Coordinate used in place of a negative `x` or `y`.
const FALLBACK_COORDINATE: i32 = 100;
/// Spacing added between tiles in `Full` mode, in pixels.
const TILE_GAP: u32 = 40;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// DejaVu Sans, used when no font file is configured.
const EMBEDDED_FONT: &[u8] = include_bytes!("../../static/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Anchored(Anchor),
    Point(i32, i32),
}

/// A handle with every render-time default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub text: String,
    pub size: f64,
    pub dpi: f64,
    pub color: Rgba<u8>,
    pub angle: f64,
    pub placement: Placement,
}

impl RenderSettings {
    pub fn resolve(handle: &WatermarkHandle) -> Result<Self, WatermarkError> {
        let text = match handle.text() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return Err(WatermarkError::EmptyText),
        };

        let size = handle.size().filter(|s| *s > 0.0).unwrap_or(DEFAULT_SIZE);
        let dpi = handle.dpi().filter(|d| *d > 0.0).unwrap_or(DEFAULT_DPI);
        let color = parse_hex_color(
            handle
                .color()
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_COLOR),
        );

        let placement = match handle.position().filter(|p| !p.is_empty()) {
            Some(name) => Placement::Anchored(Anchor::from_name(name).unwrap_or_else(|| {
                warn!("Unknown watermark position '{}', using LeftTop", name);
                Anchor::LeftTop
            })),
            None => Placement::Point(coordinate(handle.x()), coordinate(handle.y())),
        };

        Ok(Self {
            text,
            size,
            dpi,
            color,
            angle: handle.angle().unwrap_or(0.0),
            placement,
        })
    }

    /// Font size in points converted to pixels at the configured DPI.
    pub fn scale(&self) -> PxScale {
        PxScale::from((self.size * self.dpi / 72.0) as f32)
    }
}

fn coordinate(value: Option<f64>) -> i32 {
    let value = value.unwrap_or(0.0) as i32;
    if value < 0 { FALLBACK_COORDINATE } else { value }
}

/// Draws watermark text with a font loaded at runtime.
pub struct Watermarker {
    font: FontVec,
}

impl Watermarker {
    pub fn new(font: FontVec) -> Self {
        Self { font }
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec(data).map_err(|e| WatermarkError::Font(e.to_string()))?;
        Ok(Self::new(font))
    }

    pub fn embedded() -> Result<Self, WatermarkError> {
        Self::from_bytes(EMBEDDED_FONT.to_vec())
    }

    pub fn from_file(path: &Path) -> Result<Self, WatermarkError> {
        debug!("Loading watermark font from {:?}", path);
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Stamp `handle` onto a copy of `image`. The result is RGBA and the same
    /// size as the input.
    pub fn apply(
        &self,
        image: &DynamicImage,
        handle: &WatermarkHandle,
    ) -> Result<DynamicImage, WatermarkError> {
        let settings = RenderSettings::resolve(handle)?;
        let mut canvas = image.to_rgba8();
        self.render(&mut canvas, &settings);
        Ok(DynamicImage::ImageRgba8(canvas))
    }

    pub fn render(&self, canvas: &mut RgbaImage, settings: &RenderSettings) {
        let (width, height) = canvas.dimensions();

        match settings.placement {
            Placement::Anchored(Anchor::Full) => self.tile(canvas, settings),
            Placement::Anchored(anchor) => {
                let (x, y) = anchor.origin(width, height);
                self.stamp(canvas, settings, x, y);
            }
            Placement::Point(x, y) => self.stamp(canvas, settings, x, y),
        }
    }

    fn tile(&self, canvas: &mut RgbaImage, settings: &RenderSettings) {
        let (text_width, text_height) = text_size(settings.scale(), &self.font, &settings.text);
        let step_x = (text_width + TILE_GAP) as usize;
        let step_y = (text_height + TILE_GAP) as usize;
        let (width, height) = canvas.dimensions();

        for y in (0..height).step_by(step_y) {
            for x in (0..width).step_by(step_x) {
                self.stamp(canvas, settings, x as i32, y as i32);
            }
        }
    }

    fn stamp(&self, canvas: &mut RgbaImage, settings: &RenderSettings, x: i32, y: i32) {
        let scale = settings.scale();

        if settings.angle == 0.0 {
            draw_text_mut(canvas, settings.color, x, y, scale, &self.font, &settings.text);
            return;
        }

        // Rotating on a square layer as wide as the text diagonal keeps the
        // glyphs from being clipped at any angle.
        let (text_width, text_height) = text_size(scale, &self.font, &settings.text);
        let side = (text_width as f64)
            .hypot(text_height as f64)
            .ceil()
            .max(1.0) as u32;
        let mut layer = RgbaImage::from_pixel(side, side, TRANSPARENT);
        let offset_x = (side as i32 - text_width as i32) / 2;
        let offset_y = (side as i32 - text_height as i32) / 2;
        draw_text_mut(
            &mut layer,
            settings.color,
            offset_x,
            offset_y,
            scale,
            &self.font,
            &settings.text,
        );

        // Positive angles turn the text counter-clockwise on screen;
        // rotate_about_center turns clockwise for positive theta.
        let rotated = rotate_about_center(
            &layer,
            (-settings.angle).to_radians() as f32,
            Interpolation::Nearest,
            TRANSPARENT,
        );
        image::imageops::overlay(canvas, &rotated, x as i64, y as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(json: &str) -> WatermarkHandle {
        WatermarkHandle::construct(json).unwrap()
    }

    #[test]
    fn test_resolve_rejects_missing_text() {
        assert!(matches!(
            RenderSettings::resolve(&WatermarkHandle::default()),
            Err(WatermarkError::EmptyText)
        ));
        assert!(matches!(
            RenderSettings::resolve(&handle(r#"{"text":""}"#)),
            Err(WatermarkError::EmptyText)
        ));
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let settings = RenderSettings::resolve(&handle(r#"{"text":"hi","size":-3,"dpi":0}"#)).unwrap();
        assert_eq!(settings.size, DEFAULT_SIZE);
        assert_eq!(settings.dpi, DEFAULT_DPI);
        assert_eq!(settings.color, Rgba([0, 0, 0, 255]));
        assert_eq!(settings.angle, 0.0);
        assert_eq!(settings.placement, Placement::Point(0, 0));
    }

    #[test]
    fn test_resolve_negative_coordinates_fall_back() {
        let settings = RenderSettings::resolve(&handle(r#"{"text":"hi","x":-1,"y":30}"#)).unwrap();
        assert_eq!(settings.placement, Placement::Point(100, 30));
    }

    #[test]
    fn test_resolve_position_wins_over_coordinates() {
        let settings =
            RenderSettings::resolve(&handle(r#"{"text":"hi","x":5,"y":5,"position":"Center"}"#))
                .unwrap();
        assert_eq!(settings.placement, Placement::Anchored(Anchor::Center));

        let unknown =
            RenderSettings::resolve(&handle(r#"{"text":"hi","position":"somewhere"}"#)).unwrap();
        assert_eq!(unknown.placement, Placement::Anchored(Anchor::LeftTop));

        let blank = RenderSettings::resolve(&handle(r#"{"text":"hi","position":"","x":7}"#)).unwrap();
        assert_eq!(blank.placement, Placement::Point(7, 0));
    }

    #[test]
    fn test_scale_converts_points_to_pixels() {
        let settings = RenderSettings::resolve(&handle(r#"{"text":"hi","size":36,"dpi":144}"#)).unwrap();
        assert_eq!(settings.scale(), PxScale::from(72.0));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let result = Watermarker::from_bytes(vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(WatermarkError::Font(_))));
    }

    #[test]
    fn test_missing_font_file() {
        let result = Watermarker::from_file(Path::new("does/not/exist.ttf"));
        assert!(matches!(result, Err(WatermarkError::IoError(_))));
    }

    #[test]
    fn test_embedded_font_loads() {
        assert!(Watermarker::embedded().is_ok());
    }

    #[test]
    fn test_apply_draws_text() {
        let watermarker = Watermarker::embedded().unwrap();

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 120, Rgba([255, 255, 255, 255])));
        let result = watermarker
            .apply(&img, &handle(r##"{"text":"DRAFT","size":12,"dpi":72,"color":"#ff0000","x":10,"y":10}"##))
            .unwrap();

        assert_eq!(result.width(), 200);
        assert_eq!(result.height(), 120);
        let changed = result
            .to_rgba8()
            .pixels()
            .any(|p| *p != Rgba([255, 255, 255, 255]));
        assert!(changed);
    }

    fn black(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    fn lit_pixels(image: &RgbaImage) -> Vec<(i64, i64)> {
        pixels_above(image, 128)
    }

    fn pixels_above(image: &RgbaImage, threshold: u8) -> Vec<(i64, i64)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > threshold)
            .map(|(x, y, _)| (x as i64, y as i64))
            .collect()
    }

    fn bounding_box(points: &[(i64, i64)]) -> (i64, i64, i64, i64) {
        assert!(!points.is_empty(), "nothing was drawn");
        let min_x = points.iter().map(|p| p.0).min().unwrap();
        let min_y = points.iter().map(|p| p.1).min().unwrap();
        let max_x = points.iter().map(|p| p.0).max().unwrap();
        let max_y = points.iter().map(|p| p.1).max().unwrap();
        (min_x, min_y, max_x, max_y)
    }

    /// Covariance of x and y over the lit pixels. Negative when the
    /// drawing rises to the right (y grows downwards).
    fn slant(points: &[(i64, i64)]) -> f64 {
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0 as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1 as f64).sum::<f64>() / n;
        points
            .iter()
            .map(|p| (p.0 as f64 - mean_x) * (p.1 as f64 - mean_y))
            .sum::<f64>()
            / n
    }

    #[test]
    fn test_anchored_stamp_lands_at_origin() {
        let watermarker = Watermarker::embedded().unwrap();

        for (name, anchor) in [
            ("LeftTop", Anchor::LeftTop),
            ("LeftBottom", Anchor::LeftBottom),
            ("RightTop", Anchor::RightTop),
            ("RightBottom", Anchor::RightBottom),
            ("Center", Anchor::Center),
        ] {
            let settings = RenderSettings::resolve(&handle(&format!(
                r##"{{"text":"X","color":"#fff","size":24,"dpi":72,"position":"{}"}}"##,
                name
            )))
            .unwrap();
            let (text_width, _) = text_size(settings.scale(), &watermarker.font, "X");

            let mut canvas = black(400, 400);
            watermarker.render(&mut canvas, &settings);

            let (ox, oy) = anchor.origin(400, 400);
            let (ox, oy, w) = (ox as i64, oy as i64, text_width as i64);
            let (min_x, min_y, max_x, max_y) = bounding_box(&lit_pixels(&canvas));
            assert!(min_x >= ox - 1 && max_x <= ox + w + 1, "{}: x {}..{} vs origin {}", name, min_x, max_x, ox);
            assert!(min_y >= oy && max_y <= oy + 25, "{}: y {}..{} vs origin {}", name, min_y, max_y, oy);
        }
    }

    #[test]
    fn test_full_tiles_from_origin_with_gap() {
        let watermarker = Watermarker::embedded().unwrap();
        let settings = RenderSettings::resolve(&handle(
            r##"{"text":"X","color":"#fff","size":12,"dpi":72,"position":"Full"}"##,
        ))
        .unwrap();
        let (text_width, text_height) = text_size(settings.scale(), &watermarker.font, "X");
        let cell_w = text_width as i64 + 2;
        let cell_h = 14;
        let step_x = (text_width + TILE_GAP) as i64;
        let step_y = (text_height + TILE_GAP) as i64;

        let (width, height) = (300i64, 200i64);
        let mut canvas = black(width as u32, height as u32);
        watermarker.render(&mut canvas, &settings);
        let lit = lit_pixels(&canvas);

        for (x, y) in &lit {
            assert!(
                x % step_x < cell_w && y % step_y < cell_h,
                "pixel ({}, {}) outside every tile",
                x,
                y
            );
        }

        let mut tiles = 0;
        for oy in (0..height).step_by(step_y as usize) {
            for ox in (0..width).step_by(step_x as usize) {
                if ox + cell_w > width || oy + cell_h > height {
                    continue;
                }
                tiles += 1;
                let drawn = lit
                    .iter()
                    .any(|(x, y)| *x >= ox && *x < ox + cell_w && *y >= oy && *y < oy + cell_h);
                assert!(drawn, "no tile at ({}, {})", ox, oy);
            }
        }
        assert!(tiles > 4);
    }

    #[test]
    fn test_positive_angle_turns_counter_clockwise() {
        let watermarker = Watermarker::embedded().unwrap();
        let img = DynamicImage::ImageRgba8(black(400, 400));

        let rising = watermarker
            .apply(
                &img,
                &handle(r##"{"text":"______________","color":"#fff","size":24,"dpi":72,"x":100,"y":100,"angle":45}"##),
            )
            .unwrap()
            .to_rgba8();
        assert!(slant(&pixels_above(&rising, 0)) < 0.0);

        let falling = watermarker
            .apply(
                &img,
                &handle(r##"{"text":"______________","color":"#fff","size":24,"dpi":72,"x":100,"y":100,"angle":-45}"##),
            )
            .unwrap()
            .to_rgba8();
        assert!(slant(&pixels_above(&falling, 0)) > 0.0);
    }

    #[test]
    fn test_rotated_stamp_stays_in_its_layer() {
        let watermarker = Watermarker::embedded().unwrap();
        let settings = RenderSettings::resolve(&handle(
            r##"{"text":"spin","color":"#fff","size":24,"dpi":72,"x":50,"y":60,"angle":30}"##,
        ))
        .unwrap();
        let (w, h) = text_size(settings.scale(), &watermarker.font, "spin");
        let side = (w as f64).hypot(h as f64).ceil() as i64;

        let mut canvas = black(300, 300);
        watermarker.render(&mut canvas, &settings);

        let (min_x, min_y, max_x, max_y) = bounding_box(&lit_pixels(&canvas));
        assert!(min_x >= 50 && max_x < 50 + side);
        assert!(min_y >= 60 && max_y < 60 + side);
    }
}

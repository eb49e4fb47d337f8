//! Palette quantization for GIF frames.
//!
//! Pixels are bucketed by a reduced-precision key, the most populated
//! buckets become the palette (each entry the average of its bucket) and
//! every pixel maps to its nearest palette entry.

use common::color::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use surface::RasterImage;

/// Precision pixels are bucketed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// 5 bits red, 6 green, 5 blue.
    #[default]
    Rgb565,
    /// 4 bits per channel.
    Rgb444,
    /// 4 bits per channel including alpha.
    Rgba4444,
}

impl ColorSpace {
    fn key(&self, c: Color) -> u16 {
        let (r, g, b, a) = (c.r as u16, c.g as u16, c.b as u16, c.a as u16);
        match self {
            ColorSpace::Rgb565 => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
            ColorSpace::Rgb444 => ((r >> 4) << 8) | ((g >> 4) << 4) | (b >> 4),
            ColorSpace::Rgba4444 => ((r >> 4) << 12) | ((g >> 4) << 8) | ((b >> 4) << 4) | (a >> 4),
        }
    }

    fn distance(&self, a: Color, b: Color) -> u32 {
        let d = |x: u8, y: u8| {
            let v = x as i32 - y as i32;
            (v * v) as u32
        };
        let rgb = d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b);
        match self {
            ColorSpace::Rgba4444 => rgb + d(a.a, b.a),
            _ => rgb,
        }
    }
}

/// An indexed frame ready for the GIF encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedFrame {
    /// RGB triplets.
    pub palette: Vec<u8>,
    /// One palette index per pixel.
    pub indices: Vec<u8>,
    /// Palette index reserved for transparent pixels.
    pub transparent: Option<u8>,
}

impl IndexedFrame {
    pub fn palette_len(&self) -> usize {
        self.palette.len() / 3
    }
}

#[derive(Default)]
struct Bucket {
    count: u64,
    sums: [u64; 4],
}

impl Bucket {
    fn add(&mut self, c: Color) {
        self.count += 1;
        self.sums[0] += c.r as u64;
        self.sums[1] += c.g as u64;
        self.sums[2] += c.b as u64;
        self.sums[3] += c.a as u64;
    }

    fn average(&self) -> Color {
        let n = self.count.max(1);
        let avg = |i: usize| ((self.sums[i] + n / 2) / n) as u8;
        Color::rgba(avg(0), avg(1), avg(2), avg(3))
    }
}

/// Reduces RGBA images to at most 256 colors.
#[derive(Clone, Debug)]
pub struct Quantizer {
    max_colors: usize,
    color_space: ColorSpace,
    alpha_threshold: Option<u8>,
}

impl Quantizer {
    /// `max_colors` is clamped to `2..=256`.
    pub fn new(max_colors: u16, color_space: ColorSpace) -> Self {
        Self {
            max_colors: (max_colors as usize).clamp(2, 256),
            color_space,
            alpha_threshold: None,
        }
    }

    /// Reserve index 0 for pixels with alpha below `threshold`.
    pub fn with_transparency(mut self, threshold: u8) -> Self {
        self.alpha_threshold = Some(threshold);
        self
    }

    fn is_transparent(&self, c: Color) -> bool {
        self.alpha_threshold.map_or(false, |threshold| c.a < threshold)
    }

    pub fn quantize(&self, image: &RasterImage) -> IndexedFrame {
        let pixels: Vec<Color> = image
            .pixels
            .chunks_exact(4)
            .map(|p| Color::rgba(p[0], p[1], p[2], p[3]))
            .collect();

        let mut buckets: HashMap<u16, Bucket> = HashMap::new();
        for &pixel in pixels.iter().filter(|&&p| !self.is_transparent(p)) {
            buckets.entry(self.color_space.key(pixel)).or_default().add(pixel);
        }

        let reserved = usize::from(self.alpha_threshold.is_some());
        let mut ranked: Vec<(u16, Bucket)> = buckets.into_iter().collect();
        ranked.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then(ka.cmp(kb)));
        ranked.truncate(self.max_colors - reserved);

        let colors: Vec<Color> = ranked.iter().map(|(_, bucket)| bucket.average()).collect();
        let mut cache: HashMap<u16, u8> = ranked
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (*key, (i + reserved) as u8))
            .collect();

        let indices = pixels
            .iter()
            .map(|&pixel| {
                if self.is_transparent(pixel) {
                    return 0;
                }
                *cache
                    .entry(self.color_space.key(pixel))
                    .or_insert_with(|| self.nearest(&colors, pixel, reserved))
            })
            .collect();

        let mut palette = Vec::with_capacity((colors.len() + reserved).max(2) * 3);
        if reserved == 1 {
            palette.extend_from_slice(&[0, 0, 0]);
        }
        for c in &colors {
            palette.extend_from_slice(&[c.r, c.g, c.b]);
        }
        while palette.len() < 6 {
            palette.extend_from_slice(&[0, 0, 0]);
        }

        IndexedFrame {
            palette,
            indices,
            transparent: self.alpha_threshold.map(|_| 0),
        }
    }

    fn nearest(&self, colors: &[Color], pixel: Color, offset: usize) -> u8 {
        colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| self.color_space.distance(**c, pixel))
            .map_or(offset as u8, |(i, _)| (i + offset) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(colors: &[Color]) -> RasterImage {
        let mut img = RasterImage::new(colors.len() as u32, 1);
        for (x, c) in colors.iter().enumerate() {
            img.set_pixel(x as u32, 0, *c);
        }
        img
    }

    #[test]
    fn test_two_colors() {
        let frame = Quantizer::new(256, ColorSpace::Rgb565).quantize(&image(&[Color::RED, Color::BLUE, Color::RED]));
        assert_eq!(frame.palette_len(), 2);
        assert_eq!(frame.indices[0], frame.indices[2]);
        assert_ne!(frame.indices[0], frame.indices[1]);
        assert_eq!(&frame.palette[0..3], &[255, 0, 0]);
        assert_eq!(frame.transparent, None);
    }

    #[test]
    fn test_transparency_reserves_index_zero() {
        let q = Quantizer::new(256, ColorSpace::Rgb565).with_transparency(128);
        let frame = q.quantize(&image(&[Color::TRANSPARENT, Color::RED, Color::rgba(0, 0, 255, 100)]));
        assert_eq!(frame.transparent, Some(0));
        assert_eq!(frame.indices, vec![0, 1, 0]);
        assert_eq!(&frame.palette[3..6], &[255, 0, 0]);
    }

    #[test]
    fn test_palette_limit() {
        let colors = [
            Color::RED,
            Color::RED,
            Color::RED,
            Color::BLUE,
            Color::BLUE,
            Color::rgb(200, 0, 0),
            Color::rgb(0, 0, 200),
        ];
        let frame = Quantizer::new(2, ColorSpace::Rgb444).quantize(&image(&colors));
        assert_eq!(frame.palette_len(), 2);
        assert!(frame.indices.iter().all(|&i| i < 2));
        assert_eq!(frame.indices[5], frame.indices[0]);
        assert_eq!(frame.indices[6], frame.indices[3]);
    }

    #[test]
    fn test_close_colors_share_bucket() {
        let frame = Quantizer::new(256, ColorSpace::Rgb565)
            .quantize(&image(&[Color::rgb(200, 100, 50), Color::rgb(201, 101, 51)]));
        assert_eq!(frame.indices[0], frame.indices[1]);
    }

    #[test]
    fn test_single_color_padded() {
        let frame = Quantizer::new(16, ColorSpace::Rgba4444).quantize(&image(&[Color::WHITE]));
        assert_eq!(frame.palette_len(), 2);
        assert_eq!(frame.indices, vec![0]);
    }
}

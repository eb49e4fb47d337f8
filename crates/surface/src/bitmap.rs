//! Decoded raster images and the loader that produces them.

use common::color::Color;
use common::error::{SceneError, SceneResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// An RGBA image.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, row-major, straight alpha.
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl RasterImage {
    /// Transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> SceneResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(SceneError::resource(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Pixel at coordinates, transparent when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }
}

/// Decodes images from bytes or files and caches them by locator.
#[derive(Debug)]
pub struct ImageLoader {
    max_width: u32,
    max_height: u32,
    cache: RwLock<HashMap<String, Arc<RasterImage>>>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self {
            max_width: 16384,
            max_height: 16384,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    /// Decode an image from encoded bytes (PNG, JPEG, GIF, WebP, BMP...).
    pub fn decode(&self, data: &[u8]) -> SceneResult<RasterImage> {
        let img = image::load_from_memory(data)
            .map_err(|e| SceneError::resource(format!("image decode failed: {}", e)))?;
        let rgba = img.to_rgba8();
        self.check_dimensions(rgba.width(), rgba.height())?;
        Ok(RasterImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// Load and decode a file, reusing a cached copy when present.
    pub fn load(&self, locator: &str) -> SceneResult<Arc<RasterImage>> {
        if let Some(image) = self.cache.read().get(locator) {
            return Ok(image.clone());
        }

        let bytes = std::fs::read(Path::new(locator))
            .map_err(|e| SceneError::resource(format!("cannot read image {}: {}", locator, e)))?;
        let image = Arc::new(self.decode(&bytes)?);
        tracing::debug!(locator, width = image.width, height = image.height, "image decoded");

        self.cache.write().insert(locator.to_string(), image.clone());
        Ok(image)
    }

    /// Decode inline bytes; cached under `key`.
    pub fn load_bytes(&self, key: &str, data: &[u8]) -> SceneResult<Arc<RasterImage>> {
        if let Some(image) = self.cache.read().get(key) {
            return Ok(image.clone());
        }
        let image = Arc::new(self.decode(data)?);
        self.cache.write().insert(key.to_string(), image.clone());
        Ok(image)
    }

    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    fn check_dimensions(&self, width: u32, height: u32) -> SceneResult<()> {
        if width > self.max_width || height > self.max_height {
            return Err(SceneError::resource(format!(
                "image {}x{} exceeds maximum {}x{}",
                width, height, self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an RGBA image into PNG bytes.
pub fn encode_png(image: &RasterImage) -> SceneResult<Vec<u8>> {
    encode_with(image, image::ImageFormat::Png, false)
}

/// Encode an RGBA image into JPEG bytes; alpha is dropped.
pub fn encode_jpeg(image: &RasterImage) -> SceneResult<Vec<u8>> {
    encode_with(image, image::ImageFormat::Jpeg, true)
}

fn encode_with(image: &RasterImage, format: image::ImageFormat, opaque: bool) -> SceneResult<Vec<u8>> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
        .ok_or_else(|| SceneError::encoding("pixel buffer does not match image size"))?;
    let dynamic = image::DynamicImage::ImageRgba8(rgba);
    let dynamic = if opaque {
        image::DynamicImage::ImageRgb8(dynamic.to_rgb8())
    } else {
        dynamic
    };

    let mut out = std::io::Cursor::new(Vec::new());
    dynamic
        .write_to(&mut out, format)
        .map_err(|e| SceneError::encoding(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RasterImage {
        let mut image = RasterImage::new(2, 2);
        image.set_pixel(0, 0, Color::RED);
        image.set_pixel(1, 1, Color::BLUE);
        image
    }

    #[test]
    fn test_pixel_access() {
        let image = checker();
        assert_eq!(image.pixel(0, 0), Color::RED);
        assert_eq!(image.pixel(1, 0), Color::TRANSPARENT);
        assert_eq!(image.pixel(5, 5), Color::TRANSPARENT);
    }

    #[test]
    fn test_from_rgba_rejects_bad_length() {
        assert!(RasterImage::from_rgba(2, 2, vec![0; 3]).is_err());
        assert!(RasterImage::from_rgba(1, 1, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_png_roundtrip_through_loader() {
        let image = checker();
        let bytes = encode_png(&image).unwrap();
        let loader = ImageLoader::new();
        let decoded = loader.load_bytes("checker", &bytes).unwrap();
        assert_eq!(*decoded, image);
        assert_eq!(loader.cached(), 1);
    }

    #[test]
    fn test_dimension_limit() {
        let bytes = encode_png(&RasterImage::new(8, 8)).unwrap();
        let loader = ImageLoader::new().with_max_dimensions(4, 4);
        assert!(matches!(loader.decode(&bytes), Err(SceneError::Resource(_))));
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let loader = ImageLoader::new();
        let err = loader.load("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, SceneError::Resource(_)));
    }

    #[test]
    fn test_garbage_bytes() {
        let loader = ImageLoader::new();
        assert!(loader.decode(b"not an image").is_err());
    }
}

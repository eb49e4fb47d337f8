//! Render configuration.

/// Render configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Samples taken along a curve when computing its bounding box.
    pub sample_density: usize,
    /// Maximum nesting of scenes used as pattern sources.
    pub max_pattern_depth: usize,
    /// Maximum decoded image width.
    pub max_image_width: u32,
    /// Maximum decoded image height.
    pub max_image_height: u32,
    /// Font family used when a text layer names none.
    pub default_font: String,
    /// Alpha below which a pixel becomes transparent in GIF frames.
    pub alpha_threshold: u8,
}

impl RenderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse curve sampling for previews.
    pub fn draft() -> Self {
        Self {
            sample_density: 25,
            max_pattern_depth: 2,
            ..Self::default()
        }
    }

    /// Dense curve sampling for tight bounding boxes.
    pub fn precise() -> Self {
        Self {
            sample_density: 1000,
            ..Self::default()
        }
    }

    /// Set curve sample density.
    pub fn with_sample_density(mut self, samples: usize) -> Self {
        self.sample_density = samples.max(1);
        self
    }

    /// Set maximum pattern scene depth.
    pub fn with_max_pattern_depth(mut self, depth: usize) -> Self {
        self.max_pattern_depth = depth;
        self
    }

    /// Set maximum decoded image size.
    pub fn with_max_image_size(mut self, width: u32, height: u32) -> Self {
        self.max_image_width = width;
        self.max_image_height = height;
        self
    }

    /// Set default font family.
    pub fn with_default_font(mut self, family: &str) -> Self {
        self.default_font = family.to_string();
        self
    }

    /// Set GIF transparency threshold.
    pub fn with_alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_density: 100,
            max_pattern_depth: 4,
            max_image_width: 16384,
            max_image_height: 16384,
            default_font: "sans-serif".to_string(),
            alpha_threshold: 128,
        }
    }
}

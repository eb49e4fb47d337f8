//! Animated GIF output.
//!
//! An animated scene becomes one frame per top-level layer. Each snapshot
//! enters a bounded history; the frame written is the history composited
//! oldest to newest, quantized to an indexed palette.

use crate::config::RenderConfig;
use crate::quantize::{ColorSpace, Quantizer};
use common::color::Color;
use common::error::{SceneError, SceneResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::VecDeque;
use surface::RasterImage;

/// Frame history settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferOptions {
    /// Snapshots composited into each frame; 0 behaves as 1.
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationUtils {
    /// Clear the surface after each frame.
    pub clear: bool,
    pub buffer: BufferOptions,
}

impl Default for AnimationUtils {
    fn default() -> Self {
        Self { clear: true, buffer: BufferOptions::default() }
    }
}

/// Animation settings of a scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    pub frame_rate: u32,
    pub max_colors: u16,
    pub color_space: ColorSpace,
    #[serde(rename = "loop")]
    pub loop_animation: bool,
    pub transparency: bool,
    pub utils: AnimationUtils,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            max_colors: 256,
            color_space: ColorSpace::Rgb565,
            loop_animation: true,
            transparency: true,
            utils: AnimationUtils::default(),
        }
    }
}

impl AnimationOptions {
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_max_colors(mut self, max_colors: u16) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn with_loop(mut self, enabled: bool) -> Self {
        self.loop_animation = enabled;
        self
    }

    pub fn with_transparency(mut self, enabled: bool) -> Self {
        self.transparency = enabled;
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.utils.clear = clear;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.utils.buffer.size = size;
        self
    }

    /// Frame delay in hundredths of a second.
    pub fn delay_centiseconds(&self) -> u16 {
        let millis = 1000.0 / self.frame_rate.max(1) as f64;
        (millis / 10.0).round().clamp(1.0, u16::MAX as f64) as u16
    }
}

/// Accumulates frames and encodes them as a GIF.
pub struct AnimationEncoder {
    width: u16,
    height: u16,
    depth: usize,
    delay: u16,
    quantizer: Quantizer,
    history: VecDeque<RasterImage>,
    encoder: gif::Encoder<Vec<u8>>,
    frames: usize,
}

impl AnimationEncoder {
    pub fn new(width: u32, height: u32, options: &AnimationOptions, config: &RenderConfig) -> SceneResult<Self> {
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(SceneError::encoding(format!(
                    "{}x{} exceeds the GIF size limit",
                    width, height
                )))
            }
        };

        let mut encoder = gif::Encoder::new(Vec::new(), w, h, &[])
            .map_err(|e| SceneError::encoding(e.to_string()))?;
        if options.loop_animation {
            encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(|e| SceneError::encoding(e.to_string()))?;
        }

        let mut quantizer = Quantizer::new(options.max_colors, options.color_space);
        if options.transparency {
            quantizer = quantizer.with_transparency(config.alpha_threshold);
        }

        let depth = options.utils.buffer.size.max(1);
        tracing::debug!(width, height, depth, frame_rate = options.frame_rate, "animation started");

        Ok(Self {
            width: w,
            height: h,
            depth,
            delay: options.delay_centiseconds(),
            quantizer,
            history: VecDeque::with_capacity(depth),
            encoder,
            frames: 0,
        })
    }

    /// Snapshots composited into each frame.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Add a snapshot and write the frame composited from the history.
    pub fn push_frame(&mut self, snapshot: RasterImage) -> SceneResult<()> {
        if snapshot.width != self.width as u32 || snapshot.height != self.height as u32 {
            return Err(SceneError::encoding(format!(
                "frame {}x{} does not match animation {}x{}",
                snapshot.width, snapshot.height, self.width, self.height
            )));
        }
        if self.history.len() == self.depth {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);

        let merged = self.merged();
        let indexed = self.quantizer.quantize(&merged);
        let frame = gif::Frame {
            width: self.width,
            height: self.height,
            delay: self.delay,
            dispose: gif::DisposalMethod::Background,
            transparent: indexed.transparent,
            palette: Some(indexed.palette),
            buffer: Cow::Owned(indexed.indices),
            ..gif::Frame::default()
        };
        self.encoder
            .write_frame(&frame)
            .map_err(|e| SceneError::encoding(e.to_string()))?;
        self.frames += 1;
        tracing::trace!(frame = self.frames, history = self.history.len(), "frame written");
        Ok(())
    }

    /// The buffered snapshots composited oldest to newest.
    pub fn merged(&self) -> RasterImage {
        let mut out = RasterImage::new(self.width as u32, self.height as u32);
        for snapshot in &self.history {
            for (dst, src) in out.pixels.chunks_exact_mut(4).zip(snapshot.pixels.chunks_exact(4)) {
                let top = Color::rgba(src[0], src[1], src[2], src[3]);
                let below = Color::rgba(dst[0], dst[1], dst[2], dst[3]);
                let c = top.blend_over(below);
                dst.copy_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        out
    }

    /// Finish the stream and return the GIF bytes.
    pub fn finish(self) -> SceneResult<Vec<u8>> {
        let frames = self.frames;
        let bytes = self
            .encoder
            .into_inner()
            .map_err(|e| SceneError::encoding(e.to_string()))?;
        tracing::debug!(frames, bytes = bytes.len(), "animation finished");
        Ok(bytes)
    }
}

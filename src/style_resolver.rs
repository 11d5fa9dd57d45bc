/*!
 * Resolution-adaptive caption typography.
 *
 * Font size and margins scale with the canvas and are clamped to floors so
 * captions stay legible on small sources. Outline and shadow are fixed
 * presentation constants taken from the configuration.
 */

use log::debug;
use serde::Serialize;

use crate::app_config::StyleConfig;

/// Layout parameters derived once per job from the working resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutParams {
    pub font_size: u32,
    pub outline_width: f64,
    pub shadow: f64,
    pub margin_vertical: u32,
    pub margin_horizontal: u32,
    /// Font size used for the gap between wrapped lines
    pub spacer_size: u32,
    /// Character count above which captions are wrapped
    pub max_line_chars: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Derives [`LayoutParams`] from canvas dimensions
#[derive(Debug, Clone, Default)]
pub struct StyleResolver {
    config: StyleConfig,
}

impl StyleResolver {
    pub fn new(config: StyleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Compute layout for a `width` x `height` canvas
    pub fn resolve(&self, width: u32, height: u32) -> LayoutParams {
        let cfg = &self.config;

        let font_size = scaled(height, cfg.font_ratio).max(cfg.font_floor);
        let margin_vertical = scaled(height, cfg.margin_ratio).max(cfg.margin_floor);
        let margin_horizontal = scaled(width, cfg.margin_horizontal_ratio);
        let spacer_size = scaled(font_size, cfg.spacer_ratio).max(1);

        let layout = LayoutParams {
            font_size,
            outline_width: cfg.outline_width,
            shadow: cfg.shadow,
            margin_vertical,
            margin_horizontal,
            spacer_size,
            max_line_chars: cfg.max_line_chars,
            canvas_width: width,
            canvas_height: height,
        };

        debug!(
            "Resolved layout for {}x{}: font {} spacer {} margin_v {}",
            width, height, layout.font_size, layout.spacer_size, layout.margin_vertical
        );

        layout
    }
}

// @returns: round(value * ratio), saturating at u32 bounds
fn scaled(value: u32, ratio: f64) -> u32 {
    (value as f64 * ratio).round().clamp(0.0, u32::MAX as f64) as u32
}

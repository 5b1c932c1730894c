use serde::Deserialize;

use scene::OrbitConfig;
use telemetry::FeedConfig;

pub const DEFAULT_TEXTURE_URL: &str =
    "https://raw.githubusercontent.com/fruitbox12/workflowFunction/main/as.jpg";

/// Page integration settings, parsed from the JSON handed to `init_globe`.
///
/// Every field has a default, so `{}` (or an empty string) is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub container_selector: String,
    pub canvas_id: String,
    pub overlay_canvas_id: String,
    pub popup_selector: String,
    pub texture_url: String,
    /// Texel luminance (0..=1) at or above which a globe dot is drawn.
    pub land_threshold: f32,
    pub storage_key: String,
    /// Set to `false` to skip the telemetry feed entirely.
    pub feed_enabled: bool,
    pub feed: FeedConfig,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f64,
    pub pixel_ratio: f64,
    /// Share of the smaller viewport side taken by the globe.
    pub surface_fraction: f64,
    /// Dot size uniform as a share of the globe side.
    pub dot_size_fraction: f64,
    pub dot_color: [f32; 4],
    pub marker_color: [f32; 4],
    pub pointer_color: [f32; 3],
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            container_selector: ".globe-wrapper".to_string(),
            canvas_id: "globe-3d".to_string(),
            overlay_canvas_id: "globe-2d-overlay".to_string(),
            popup_selector: ".globe-popup".to_string(),
            texture_url: DEFAULT_TEXTURE_URL.to_string(),
            land_threshold: 0.5,
            storage_key: markers::DEFAULT_MARKERS_KEY.to_string(),
            feed_enabled: true,
            feed: FeedConfig::default(),
            auto_rotate: true,
            auto_rotate_speed: 2.0,
            pixel_ratio: 2.0,
            surface_fraction: 0.65,
            dot_size_fraction: 0.04,
            dot_color: [0.62, 0.72, 0.85, 1.0],
            marker_color: [1.0, 0.0, 0.0, 1.0],
            pointer_color: [0.0, 0.0, 0.0],
        }
    }
}

impl GlobeConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    pub fn orbit(&self) -> OrbitConfig {
        OrbitConfig {
            auto_rotate: self.auto_rotate,
            auto_rotate_speed: self.auto_rotate_speed,
            ..OrbitConfig::default()
        }
    }

    pub fn layout(&self, viewport_width: f64, viewport_height: f64) -> SurfaceLayout {
        SurfaceLayout::fit(
            viewport_width,
            viewport_height,
            self.surface_fraction,
            self.dot_size_fraction,
            self.pixel_ratio,
        )
    }
}

/// Sizes derived from the browser viewport on every resize.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceLayout {
    /// CSS side of the square container, WebGL canvas and overlay canvas.
    pub side_css: f64,
    /// Backing store side of the WebGL canvas.
    pub side_px: u32,
    /// Dot size uniform, CSS pixels.
    pub dot_size: f64,
    pub pixel_ratio: f64,
}

impl SurfaceLayout {
    pub fn fit(
        viewport_width: f64,
        viewport_height: f64,
        surface_fraction: f64,
        dot_size_fraction: f64,
        pixel_ratio: f64,
    ) -> Self {
        let side_css = (surface_fraction * viewport_width.min(viewport_height)).max(1.0);
        let pixel_ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        Self {
            side_css,
            side_px: (side_css * pixel_ratio).round().max(1.0) as u32,
            dot_size: dot_size_fraction * side_css,
            pixel_ratio,
        }
    }

    /// Dot size in backing store pixels, as the dot shader consumes it.
    pub fn dot_size_px(&self) -> f32 {
        (self.dot_size * self.pixel_ratio) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::{GlobeConfig, SurfaceLayout};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_is_the_default_config() {
        assert_eq!(GlobeConfig::from_json("").expect("parse"), GlobeConfig::default());
        assert_eq!(GlobeConfig::from_json("{}").expect("parse"), GlobeConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let cfg = GlobeConfig::from_json(
            r#"{"canvas_id":"other","feed":{"genesis_hash":"0xabc"},"auto_rotate":false}"#,
        )
        .expect("parse");
        assert_eq!(cfg.canvas_id, "other");
        assert_eq!(cfg.feed.genesis_hash, "0xabc");
        assert_eq!(cfg.feed.endpoint, telemetry::DEFAULT_FEED_ENDPOINT);
        assert_eq!(cfg.popup_selector, ".globe-popup");
        assert!(!cfg.orbit().auto_rotate);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(GlobeConfig::from_json("{\"pixel_ratio\": \"two\"}").is_err());
    }

    #[test]
    fn layout_uses_the_smaller_viewport_side() {
        let layout = GlobeConfig::default().layout(1000.0, 800.0);
        assert!((layout.side_css - 520.0).abs() < 1e-9);
        assert_eq!(layout.side_px, 1040);
        assert!((layout.dot_size - 20.8).abs() < 1e-9);
        assert!((layout.dot_size_px() - 41.6).abs() < 1e-4);
    }

    #[test]
    fn layout_never_collapses() {
        let layout = SurfaceLayout::fit(0.0, 0.0, 0.65, 0.04, 0.0);
        assert_eq!(layout.side_px, 1);
        assert_eq!(layout.pixel_ratio, 1.0);
    }
}

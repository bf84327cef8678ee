//! Explicit configuration values passed into the compositor and the region
//! pipeline on every call.
//!
//! All settings types deserialize from JSON with missing fields taking the
//! editor defaults.

use crate::encode::ExportFormat;
use crate::error::{WaterlogoError, WaterlogoResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lossy encoder quality used by the compositor and the default export.
pub const DEFAULT_QUALITY: f32 = 0.92;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkSettings {
    pub overlay: OverlayKind,
    /// Overlay opacity in [0, 1].
    pub opacity: f32,
    /// Rotation in degrees, applied around each placement point.
    pub angle: f32,
    pub tile: bool,
    pub spacing: Spacing,
    /// Anchor name, ignored when tiling.
    pub position: String,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            overlay: OverlayKind::default(),
            opacity: 0.25,
            angle: 0.0,
            tile: false,
            spacing: Spacing::default(),
            position: "center".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub x: f32,
    pub y: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self { x: 200.0, y: 200.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    Text(TextOverlay),
    Image(ImageOverlay),
}

impl Default for OverlayKind {
    fn default() -> Self {
        OverlayKind::Text(TextOverlay::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOverlay {
    pub text: String,
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    pub font_weight: String,
    pub color: String,
    pub shadow: Option<TextShadow>,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: "TMT Waterlogo".to_string(),
            font_family: "Segoe UI, Arial, sans-serif".to_string(),
            font_size: 48.0,
            font_weight: "600".to_string(),
            color: "#ffffff".to_string(),
            shadow: None,
        }
    }
}

impl TextOverlay {
    /// CSS font shorthand for the canvas.
    pub fn font(&self) -> String {
        format!("{} {}px {}", self.font_weight, self.font_size, self.font_family)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextShadow {
    pub color: String,
    pub blur: f32,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            blur: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOverlay {
    /// `None` draws no overlay at all.
    pub source: Option<ImageSource>,
    /// Multiplier on the overlay's natural size.
    pub scale: f32,
    pub grayscale: bool,
}

impl Default for ImageOverlay {
    fn default() -> Self {
        Self {
            source: None,
            scale: 0.4,
            grayscale: false,
        }
    }
}

/// Where the overlay image comes from. Uploaded bytes are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    File {
        name: String,
        #[serde(skip)]
        bytes: Arc<Vec<u8>>,
    },
    Url(String),
}

impl ImageSource {
    pub fn file(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageSource::File {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Name used in logs and decode errors.
    pub fn label(&self) -> &str {
        match self {
            ImageSource::File { name, .. } => name,
            ImageSource::Url(url) => url,
        }
    }
}

impl WatermarkSettings {
    pub fn from_json(json: &str) -> WaterlogoResult<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| WaterlogoError::InvalidConfiguration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges. An image overlay without a source is valid here
    /// and simply draws nothing.
    pub fn validate(&self) -> WaterlogoResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return invalid(format!("opacity {} is outside [0, 1]", self.opacity));
        }
        if !self.angle.is_finite() {
            return invalid("angle must be finite");
        }
        let spacing_ok = |v: f32| v.is_finite() && v >= 0.0;
        if !spacing_ok(self.spacing.x) || !spacing_ok(self.spacing.y) {
            return invalid("tile spacing must be a non-negative number");
        }
        match &self.overlay {
            OverlayKind::Text(text) => {
                if !(text.font_size.is_finite() && text.font_size > 0.0) {
                    return invalid(format!("font size {} must be positive", text.font_size));
                }
            }
            OverlayKind::Image(image) => {
                if !(image.scale.is_finite() && image.scale > 0.0) {
                    return invalid(format!("overlay scale {} must be positive", image.scale));
                }
            }
        }
        Ok(())
    }

    /// Validation run before a batch. An image overlay must have a source.
    pub fn validate_for_batch(&self) -> WaterlogoResult<()> {
        self.validate()?;
        if let OverlayKind::Image(ImageOverlay { source: None, .. }) = &self.overlay {
            return invalid("choose a watermark image (preset or upload) first");
        }
        Ok(())
    }
}

/// Region export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Selected preset edge lengths.
    pub sizes: Vec<u32>,
    /// Comma separated manual edge lengths, merged with `sizes`.
    pub custom_sizes: String,
    pub formats: Vec<ExportFormat>,
    /// Lossy quality in [0, 1].
    pub quality: f32,
    pub remove_background: bool,
    pub dpi: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sizes: vec![512, 1024],
            custom_sizes: String::new(),
            formats: vec![ExportFormat::Png],
            quality: DEFAULT_QUALITY,
            remove_background: false,
            dpi: 300.0,
        }
    }
}

impl ExportSettings {
    pub fn from_json(json: &str) -> WaterlogoResult<Self> {
        serde_json::from_str(json).map_err(|e| WaterlogoError::InvalidConfiguration(e.to_string()))
    }

    /// Unique ascending edge lengths from the presets and the manual list.
    pub fn edge_lengths(&self) -> Vec<u32> {
        crate::region::parse_sizes(&self.sizes, &self.custom_sizes)
    }
}

fn invalid<T>(message: impl Into<String>) -> WaterlogoResult<T> {
    Err(WaterlogoError::InvalidConfiguration(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor() {
        let settings = WatermarkSettings::default();
        assert_eq!(settings.opacity, 0.25);
        assert_eq!(settings.spacing, Spacing { x: 200.0, y: 200.0 });
        assert_eq!(settings.position, "center");
        let OverlayKind::Text(text) = &settings.overlay else {
            panic!("default overlay should be text");
        };
        assert_eq!(text.font(), "600 48px Segoe UI, Arial, sans-serif");
        assert_eq!(text.color, "#ffffff");
        assert!(text.shadow.is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let settings = WatermarkSettings::from_json(
            r#"{"overlay": {"type": "image", "source": {"url": "presets/logo.png"}, "grayscale": true}, "tile": true}"#,
        )
        .unwrap();
        assert!(settings.tile);
        assert_eq!(settings.opacity, 0.25);
        let OverlayKind::Image(image) = &settings.overlay else {
            panic!("expected image overlay");
        };
        assert_eq!(image.scale, 0.4);
        assert!(image.grayscale);
        assert_eq!(
            image.source,
            Some(ImageSource::Url("presets/logo.png".to_string()))
        );
    }

    #[test]
    fn test_from_json_text_shadow() {
        let settings = WatermarkSettings::from_json(
            r#"{"overlay": {"type": "text", "text": "DRAFT", "shadow": {}}, "opacity": 1}"#,
        )
        .unwrap();
        let OverlayKind::Text(text) = &settings.overlay else {
            panic!("expected text overlay");
        };
        assert_eq!(text.text, "DRAFT");
        assert_eq!(text.font_size, 48.0);
        assert_eq!(text.shadow, Some(TextShadow::default()));
    }

    #[test]
    fn test_validate_ranges() {
        let mut settings = WatermarkSettings {
            opacity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(WaterlogoError::InvalidConfiguration(_))
        ));

        settings.opacity = 1.0;
        settings.spacing.x = -1.0;
        assert!(settings.validate().is_err());

        settings.spacing.x = 0.0;
        assert!(settings.validate().is_ok());

        assert!(WatermarkSettings::from_json("{not json").is_err());
    }

    #[test]
    fn test_batch_requires_image_source() {
        let mut settings = WatermarkSettings {
            overlay: OverlayKind::Image(ImageOverlay::default()),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
        assert!(matches!(
            settings.validate_for_batch(),
            Err(WaterlogoError::InvalidConfiguration(_))
        ));

        settings.overlay = OverlayKind::Image(ImageOverlay {
            source: Some(ImageSource::file("logo.png", vec![1, 2, 3])),
            ..Default::default()
        });
        assert!(settings.validate_for_batch().is_ok());
    }

    #[test]
    fn test_export_settings_json() {
        let settings =
            ExportSettings::from_json(r#"{"formats": ["png", "svg"], "customSizes": "64, 2048"}"#)
                .unwrap();
        assert_eq!(settings.formats, vec![ExportFormat::Png, ExportFormat::Svg]);
        assert_eq!(settings.quality, DEFAULT_QUALITY);
        assert_eq!(settings.edge_lengths(), vec![64, 512, 1024, 2048]);
    }
}

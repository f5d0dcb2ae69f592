//! Caption styling: font, color, size, position, and named presets.
//!
//! Ids coming from the outside world are parsed leniently. Anything
//! outside the known domain renders with the default for that field
//! instead of failing.

use serde::{Deserialize, Serialize};

/// Caption typeface family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFont {
    #[default]
    Impact,
    /// Default sans-serif.
    Arial,
    Comic,
}

impl CaptionFont {
    pub const ALL: [CaptionFont; 3] = [CaptionFont::Impact, CaptionFont::Arial, CaptionFont::Comic];

    /// Parse a font id. Unrecognized ids map to the sans-serif face.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "impact" => Self::Impact,
            "comic" | "comic sans" | "comic sans ms" => Self::Comic,
            _ => Self::Arial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Impact => "impact",
            Self::Arial => "arial",
            Self::Comic => "comic",
        }
    }

    /// Whether the face renders text in capitals.
    pub fn uppercase(&self) -> bool {
        matches!(self, Self::Impact)
    }

    /// Whether the face is drawn emboldened.
    pub fn bold(&self) -> bool {
        matches!(self, Self::Impact)
    }
}

/// Caption fill color from the fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionColor {
    #[default]
    White,
    Yellow,
    Neon,
    Pink,
    Purple,
}

impl CaptionColor {
    pub const ALL: [CaptionColor; 5] = [
        CaptionColor::White,
        CaptionColor::Yellow,
        CaptionColor::Neon,
        CaptionColor::Pink,
        CaptionColor::Purple,
    ];

    /// Parse a color id. Unrecognized ids map to white.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "yellow" => Self::Yellow,
            "neon" | "neon blue" => Self::Neon,
            "pink" => Self::Pink,
            "purple" => Self::Purple,
            _ => Self::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Yellow => "yellow",
            Self::Neon => "neon",
            Self::Pink => "pink",
            Self::Purple => "purple",
        }
    }

    /// Opaque RGB value.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Self::White => [0xFF, 0xFF, 0xFF],
            Self::Yellow => [0xFB, 0xBF, 0x24],
            Self::Neon => [0x00, 0xC6, 0xFF],
            Self::Pink => [0xEC, 0x48, 0x99],
            Self::Purple => [0xA8, 0x55, 0xF7],
        }
    }
}

/// Vertical anchor of the caption band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Top,
    Center,
    #[default]
    Bottom,
}

impl CaptionPosition {
    pub const ALL: [CaptionPosition; 3] = [
        CaptionPosition::Top,
        CaptionPosition::Center,
        CaptionPosition::Bottom,
    ];

    /// Parse a position id. Unrecognized ids map to bottom.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "top" => Self::Top,
            "center" | "middle" => Self::Center,
            _ => Self::Bottom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// The four independent caption style fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub font: CaptionFont,
    pub color: CaptionColor,
    /// Font size in pixels.
    pub size: u32,
    pub position: CaptionPosition,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: CaptionFont::Impact,
            color: CaptionColor::White,
            size: 32,
            position: CaptionPosition::Bottom,
        }
    }
}

impl CaptionStyle {
    pub fn with_font(self, font: CaptionFont) -> Self {
        Self { font, ..self }
    }

    pub fn with_color(self, color: CaptionColor) -> Self {
        Self { color, ..self }
    }

    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }

    pub fn with_position(self, position: CaptionPosition) -> Self {
        Self { position, ..self }
    }

    /// Replace all four fields with the preset's.
    pub fn apply_preset(self, preset: &StylePreset) -> Self {
        preset.style()
    }
}

/// A named, fixed bundle of style fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub name: &'static str,
    pub font: CaptionFont,
    pub color: CaptionColor,
    pub size: u32,
    pub position: CaptionPosition,
    pub description: &'static str,
}

impl StylePreset {
    /// The style this preset applies.
    pub fn style(&self) -> CaptionStyle {
        CaptionStyle {
            font: self.font,
            color: self.color,
            size: self.size,
            position: self.position,
        }
    }

    /// Lowercase, dash-separated name (`"Bold Statement"` -> `"bold-statement"`).
    pub fn slug(&self) -> String {
        self.name.to_ascii_lowercase().replace(' ', "-")
    }

    /// Find a preset by display name or slug, case-insensitively.
    pub fn find(name: &str) -> Option<&'static StylePreset> {
        let wanted = name.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        STYLE_PRESETS.iter().find(|p| p.slug() == wanted)
    }
}

/// Built-in preset catalogue.
pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        name: "Classic Meme",
        font: CaptionFont::Impact,
        color: CaptionColor::White,
        size: 28,
        position: CaptionPosition::Bottom,
        description: "The classic meme style with Impact font and white text",
    },
    StylePreset {
        name: "Minimal",
        font: CaptionFont::Arial,
        color: CaptionColor::White,
        size: 18,
        position: CaptionPosition::Center,
        description: "Clean, minimal style with smaller text",
    },
    StylePreset {
        name: "Bold Statement",
        font: CaptionFont::Impact,
        color: CaptionColor::Yellow,
        size: 32,
        position: CaptionPosition::Top,
        description: "Eye-catching yellow text at the top",
    },
    StylePreset {
        name: "Tech Vibe",
        font: CaptionFont::Arial,
        color: CaptionColor::Neon,
        size: 24,
        position: CaptionPosition::Bottom,
        description: "Tech-inspired with neon blue text",
    },
    StylePreset {
        name: "Comic Style",
        font: CaptionFont::Comic,
        color: CaptionColor::Pink,
        size: 24,
        position: CaptionPosition::Top,
        description: "Fun comic book style with pink text",
    },
    StylePreset {
        name: "Dramatic",
        font: CaptionFont::Impact,
        color: CaptionColor::Purple,
        size: 30,
        position: CaptionPosition::Center,
        description: "Dramatic center-positioned purple text",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ids_fall_back_to_defaults() {
        assert_eq!(CaptionFont::from_id("papyrus"), CaptionFont::Arial);
        assert_eq!(CaptionColor::from_id("#123456"), CaptionColor::White);
        assert_eq!(CaptionPosition::from_id("left"), CaptionPosition::Bottom);
    }

    #[test]
    fn test_ids_roundtrip_through_as_str() {
        for font in CaptionFont::ALL {
            assert_eq!(CaptionFont::from_id(font.as_str()), font);
        }
        for color in CaptionColor::ALL {
            assert_eq!(CaptionColor::from_id(color.as_str()), color);
        }
        for position in CaptionPosition::ALL {
            assert_eq!(CaptionPosition::from_id(position.as_str()), position);
        }
    }

    #[test]
    fn test_setters_replace_one_field() {
        let style = CaptionStyle::default().with_color(CaptionColor::Neon);
        assert_eq!(style.color, CaptionColor::Neon);
        assert_eq!(style.font, CaptionFont::Impact);
        assert_eq!(style.size, 32);
        assert_eq!(style.position, CaptionPosition::Bottom);

        let style = style.with_size(12).with_position(CaptionPosition::Top);
        assert_eq!(style.size, 12);
        assert_eq!(style.color, CaptionColor::Neon);
    }

    #[test]
    fn test_apply_preset_replaces_all_fields() {
        let preset = StylePreset::find("comic style").unwrap();
        let style = CaptionStyle::default()
            .with_size(99)
            .apply_preset(preset);
        assert_eq!(style.font, CaptionFont::Comic);
        assert_eq!(style.color, CaptionColor::Pink);
        assert_eq!(style.size, 24);
        assert_eq!(style.position, CaptionPosition::Top);
    }

    #[test]
    fn test_find_preset_by_slug_or_name() {
        assert_eq!(StylePreset::find("bold-statement").unwrap().name, "Bold Statement");
        assert_eq!(StylePreset::find("Tech Vibe").unwrap().name, "Tech Vibe");
        assert_eq!(StylePreset::find("tech_vibe").unwrap().name, "Tech Vibe");
        assert!(StylePreset::find("vaporwave").is_none());
    }

    #[test]
    fn test_style_serializes_with_lowercase_ids() {
        let json = serde_json::to_string(&CaptionStyle::default()).unwrap();
        assert_eq!(
            json,
            r#"{"font":"impact","color":"white","size":32,"position":"bottom"}"#
        );
    }
}

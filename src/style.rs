// @file style.rs
// @brief paint style applied to the drawing backend before each draw batch

use crate::color::Rgba;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

/// Per-point style fields that override the layer style.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    pub fill_style: Option<Rgba>,
    pub stroke_style: Option<Rgba>,
    pub line_width: Option<u32>,
    pub size: Option<f64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> FontSpec {
        FontSpec {
            family: "sans-serif".to_string(),
            size: 12.0,
        }
    }
}

/// The recognized style keys of a layer. Shadow settings are kept for
/// configuration compatibility; plotters has no shadow primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintStyle {
    pub fill_style: Option<Rgba>,
    pub stroke_style: Option<Rgba>,
    pub line_width: u32,
    pub shadow_color: Option<Rgba>,
    pub shadow_blur: Option<f64>,
    pub font: FontSpec,
    pub text_align: TextAlign,
    /// point radius in pixels
    pub size: f64,
}

impl Default for PaintStyle {
    fn default() -> PaintStyle {
        PaintStyle {
            fill_style: Some(Rgba::new(200, 50, 50, 204)),
            stroke_style: None,
            line_width: 1,
            shadow_color: None,
            shadow_blur: None,
            font: FontSpec::default(),
            text_align: TextAlign::Center,
            size: 5.0,
        }
    }
}

impl PaintStyle {
    pub fn resolve(&self, overrides: &StyleOverrides) -> PaintStyle {
        PaintStyle {
            fill_style: overrides.fill_style.or(self.fill_style),
            stroke_style: overrides.stroke_style.or(self.stroke_style),
            line_width: overrides.line_width.unwrap_or(self.line_width),
            size: overrides.size.unwrap_or(self.size),
            ..self.clone()
        }
    }

    pub fn fill(&self) -> Option<ShapeStyle> {
        self.fill_style.map(|c| c.to_plotters().filled())
    }

    /// Stroke is applied only when both a color and a positive width are set.
    pub fn stroke(&self) -> Option<ShapeStyle> {
        match self.stroke_style {
            Some(c) if self.line_width > 0 => Some(c.to_plotters().stroke_width(self.line_width)),
            _ => None,
        }
    }

    pub fn text_style(&self, color: Rgba) -> TextStyle<'_> {
        let h_pos = match self.text_align {
            TextAlign::Left => HPos::Left,
            TextAlign::Center => HPos::Center,
            TextAlign::Right => HPos::Right,
        };
        TextStyle {
            font: (self.font.family.as_str(), self.font.size).into_font(),
            color: color.to_plotters().to_backend_color(),
            pos: Pos::new(h_pos, VPos::Center),
        }
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow_color.is_some() && self.shadow_blur.is_some_and(|b| b > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let base = PaintStyle {
            stroke_style: Some(Rgba::BLACK),
            line_width: 2,
            ..Default::default()
        };
        let o = StyleOverrides {
            fill_style: Some(Rgba::WHITE),
            size: Some(9.0),
            ..Default::default()
        };
        let s = base.resolve(&o);
        assert_eq!(s.fill_style, Some(Rgba::WHITE));
        assert_eq!(s.stroke_style, Some(Rgba::BLACK));
        assert_eq!(s.line_width, 2);
        assert_eq!(s.size, 9.0);
    }

    #[test]
    fn stroke_needs_color_and_width() {
        let mut s = PaintStyle::default();
        assert!(s.stroke().is_none());
        s.stroke_style = Some(Rgba::BLACK);
        assert_eq!(s.stroke().unwrap().stroke_width, 1);
        s.line_width = 0;
        assert!(s.stroke().is_none());
    }

    #[test]
    fn style_from_yaml() {
        let s: PaintStyle = serde_yaml::from_str("fill_style: '#ff000080'\ntext_align: left\nfont: {family: serif, size: 20}\n").unwrap();
        assert_eq!(s.fill_style, Some(Rgba::new(255, 0, 0, 128)));
        assert_eq!(s.text_align, TextAlign::Left);
        assert_eq!(s.font.size, 20.0);
        assert_eq!(s.size, 5.0);
        assert!(!s.has_shadow());
    }
}

// @file color.rs
// @brief color values, gradient stops and the 256-step lookup ramp

use anyhow::{Result, anyhow};
use plotters::prelude::RGBAColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RAMP_SIZE: usize = 256;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Palette shared by the category and choropleth generators.
pub const DEFAULT_PALETTE: [Rgba; 7] = [
    Rgba::new(255, 255, 0, 204),
    Rgba::new(253, 98, 104, 204),
    Rgba::new(255, 146, 149, 204),
    Rgba::new(255, 241, 193, 204),
    Rgba::new(110, 176, 253, 204),
    Rgba::new(52, 139, 251, 204),
    Rgba::new(17, 102, 252, 204),
];

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Rgba {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Rgba {
        Rgba { r, g, b, a: 255 }
    }

    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn to_plotters(&self) -> RGBAColor {
        RGBAColor(self.r, self.g, self.b, self.alpha())
    }

    fn lerp(&self, other: &Rgba, f: f64) -> Rgba {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round().clamp(0.0, 255.0) as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    fn parse_hex(digits: &str) -> Result<Rgba> {
        if !digits.is_ascii() {
            return Err(anyhow!("malformed hex color: #{digits}"));
        }
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|x| x * 17);
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let color = match digits.len() {
            3 => Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?),
            6 => Rgba::opaque(byte(0)?, byte(2)?, byte(4)?),
            8 => Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return Err(anyhow!("malformed hex color: #{digits}")),
        };
        Ok(color)
    }

    fn parse_function(name: &str, args: &str) -> Result<Rgba> {
        let cols = args.split(',').map(|x| x.trim()).collect::<Vec<_>>();
        let expected = if name == "rgba" { 4 } else { 3 };
        if cols.len() != expected {
            return Err(anyhow!("{name}() takes {expected} components: {args:?}"));
        }
        let channel = |s: &str| -> Result<u8> { Ok(s.parse::<f64>()?.round().clamp(0.0, 255.0) as u8) };
        let a = if let Some(a) = cols.get(3) {
            (a.parse::<f64>()?.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Ok(Rgba::new(channel(cols[0])?, channel(cols[1])?, channel(cols[2])?, a))
    }

    fn parse_name(name: &str) -> Option<Rgba> {
        let color = match name {
            "transparent" => Rgba::TRANSPARENT,
            "black" => Rgba::BLACK,
            "white" => Rgba::WHITE,
            "red" => Rgba::opaque(255, 0, 0),
            "lime" => Rgba::opaque(0, 255, 0),
            "green" => Rgba::opaque(0, 128, 0),
            "blue" => Rgba::opaque(0, 0, 255),
            "yellow" => Rgba::opaque(255, 255, 0),
            "orange" => Rgba::opaque(255, 165, 0),
            "gray" | "grey" => Rgba::opaque(128, 128, 128),
            _ => return None,
        };
        Some(color)
    }
}

impl FromStr for Rgba {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Rgba> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix('#') {
            return Rgba::parse_hex(digits);
        }
        if let Some((name, rest)) = s.split_once('(') {
            let args = rest
                .strip_suffix(')')
                .ok_or_else(|| anyhow!("unterminated color function: {s:?}"))?;
            let name = name.trim().to_ascii_lowercase();
            if name == "rgb" || name == "rgba" {
                return Rgba::parse_function(&name, args);
            }
            return Err(anyhow!("unsupported color function: {name}()"));
        }
        Rgba::parse_name(&s.to_ascii_lowercase()).ok_or_else(|| anyhow!("unknown color: {s:?}"))
    }
}

impl TryFrom<String> for Rgba {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Rgba> {
        s.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> String {
        c.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Color stops at fractional positions in [0, 1], kept sorted ascending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, Rgba)>", into = "Vec<(f64, Rgba)>")]
pub struct Gradient {
    stops: Vec<(f64, Rgba)>,
}

impl Default for Gradient {
    fn default() -> Gradient {
        Gradient {
            stops: vec![
                (0.25, Rgba::opaque(0, 0, 255)),
                (0.55, Rgba::opaque(0, 255, 0)),
                (0.85, Rgba::opaque(255, 255, 0)),
                (1.0, Rgba::opaque(255, 0, 0)),
            ],
        }
    }
}

impl Gradient {
    pub fn new(stops: Vec<(f64, Rgba)>) -> Result<Gradient> {
        if let Some((pos, _)) = stops.iter().find(|(pos, _)| !(0.0..=1.0).contains(pos)) {
            return Err(anyhow!("gradient stop out of [0, 1]: {pos}"));
        }
        let mut stops = stops;
        // stable, so stops sharing a position keep their given order
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Gradient { stops })
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    pub fn color_at(&self, t: f64) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Rgba::TRANSPARENT,
        };
        if t < first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        let k = self.stops.partition_point(|(pos, _)| *pos <= t);
        let (p0, c0) = self.stops[k - 1];
        let (p1, c1) = self.stops[k];
        if p1 <= p0 {
            return c1;
        }
        c0.lerp(&c1, (t - p0) / (p1 - p0))
    }

    /// Samples the gradient at the centers of 256 equal slots over [0, 1].
    pub fn to_ramp(&self) -> GradientRamp {
        let lut = (0..RAMP_SIZE)
            .map(|i| self.color_at((i as f64 + 0.5) / RAMP_SIZE as f64))
            .collect::<Vec<_>>();
        GradientRamp { lut }
    }
}

impl TryFrom<Vec<(f64, Rgba)>> for Gradient {
    type Error = anyhow::Error;

    fn try_from(stops: Vec<(f64, Rgba)>) -> Result<Gradient> {
        Gradient::new(stops)
    }
}

impl From<Gradient> for Vec<(f64, Rgba)> {
    fn from(g: Gradient) -> Vec<(f64, Rgba)> {
        g.stops
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GradientRamp {
    lut: Vec<Rgba>,
}

impl GradientRamp {
    pub fn sample(&self, index: usize) -> Rgba {
        self.lut[index.min(RAMP_SIZE - 1)]
    }

    pub fn as_slice(&self) -> &[Rgba] {
        &self.lut
    }
}

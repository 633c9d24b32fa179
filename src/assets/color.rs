use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{KasuError, KasuResult};

/// A color as written in scene documents; serializes back as `"#rrggbbaa"`.
///
/// Accepted forms: `"#RGB"`, `"#RRGGBB"`, `"#RRGGBBAA"`, `{"r","g","b"[,"a"]}` with channels in
/// `0..=1`, `[r, g, b]` / `[r, g, b, a]` in `0..=1`, and `{"h","s","l"[,"a"]}` with `h` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDef(Rgba8);

impl ColorDef {
    /// The quantized color.
    pub fn to_rgba8(self) -> Rgba8 {
        self.0
    }

    fn from_unit(r: f64, g: f64, b: f64, a: f64) -> Self {
        let q = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self(Rgba8::new(q(r), q(g), q(b), q(a)))
    }

    fn from_hsl(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = h.rem_euclid(360.0) / 60.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        Self::from_unit(r + m, g + m, b + m, a)
    }
}

impl From<Rgba8> for ColorDef {
    fn from(c: Rgba8) -> Self {
        Self(c)
    }
}

impl Serialize for ColorDef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Rgba8 { r, g, b, a } = self.0;
        serializer.serialize_str(&format!("#{r:02x}{g:02x}{b:02x}{a:02x}"))
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        fn opaque() -> f64 {
            1.0
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Written {
            Hex(String),
            Rgb {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "opaque")]
                a: f64,
            },
            Hsl {
                h: f64,
                s: f64,
                l: f64,
                #[serde(default = "opaque")]
                a: f64,
            },
            Channels(Vec<f64>),
        }

        match Written::deserialize(deserializer)? {
            Written::Hex(s) => parse_color(&s).map(Self).map_err(serde::de::Error::custom),
            Written::Rgb { r, g, b, a } => Ok(Self::from_unit(r, g, b, a)),
            Written::Hsl { h, s, l, a } => Ok(Self::from_hsl(h, s, l, a)),
            Written::Channels(v) => match v[..] {
                [r, g, b] => Ok(Self::from_unit(r, g, b, 1.0)),
                [r, g, b, a] => Ok(Self::from_unit(r, g, b, a)),
                _ => Err(serde::de::Error::invalid_length(
                    v.len(),
                    &"3 or 4 color channels",
                )),
            },
        }
    }
}

/// Parse a CSS-style hex color (`#RGB`, `#RRGGBB`, `#RRGGBBAA`; the `#` is optional).
pub fn parse_color(s: &str) -> KasuResult<Rgba8> {
    let digits = s.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    let nibbles = digits
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| KasuError::validation(format!("invalid hex color \"{s}\"")))?;

    let channels: Vec<u8> = match nibbles.len() {
        3 => nibbles.iter().map(|n| n * 17).collect(),
        6 | 8 => nibbles.chunks_exact(2).map(|p| p[0] * 16 + p[1]).collect(),
        _ => {
            return Err(KasuError::validation(format!(
                "hex color must be #RGB, #RRGGBB or #RRGGBBAA, got \"{s}\""
            )));
        }
    };
    Ok(Rgba8::new(
        channels[0],
        channels[1],
        channels[2],
        channels.get(3).copied().unwrap_or(255),
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;

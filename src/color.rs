//! RGBA colors and CSS-style color parsing for gradient stops

use crate::error::HeatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Straight (non-premultiplied) 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// CSS named colors that show up in heatmap gradients
const NAMED: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0, 0, 0)),
    ("white", Rgba::rgb(255, 255, 255)),
    ("red", Rgba::rgb(255, 0, 0)),
    ("lime", Rgba::rgb(0, 255, 0)),
    ("green", Rgba::rgb(0, 128, 0)),
    ("blue", Rgba::rgb(0, 0, 255)),
    ("yellow", Rgba::rgb(255, 255, 0)),
    ("cyan", Rgba::rgb(0, 255, 255)),
    ("aqua", Rgba::rgb(0, 255, 255)),
    ("magenta", Rgba::rgb(255, 0, 255)),
    ("fuchsia", Rgba::rgb(255, 0, 255)),
    ("orange", Rgba::rgb(255, 165, 0)),
    ("purple", Rgba::rgb(128, 0, 128)),
    ("gray", Rgba::rgb(128, 128, 128)),
    ("grey", Rgba::rgb(128, 128, 128)),
    ("navy", Rgba::rgb(0, 0, 128)),
    ("teal", Rgba::rgb(0, 128, 128)),
    ("maroon", Rgba::rgb(128, 0, 0)),
    ("olive", Rgba::rgb(128, 128, 0)),
    ("silver", Rgba::rgb(192, 192, 192)),
    ("transparent", Rgba::TRANSPARENT),
];

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let bytes = hex.as_bytes();
    let digits: Option<Vec<u8>> = bytes.iter().map(|&c| hex_digit(c)).collect();
    let d = digits?;
    match d.len() {
        // #rgb / #rgba: each digit doubled
        3 | 4 => {
            let a = if d.len() == 4 { d[3] * 17 } else { 255 };
            Some(Rgba::new(d[0] * 17, d[1] * 17, d[2] * 17, a))
        },
        6 | 8 => {
            let pair = |i: usize| d[i] * 16 + d[i + 1];
            let a = if d.len() == 8 { pair(6) } else { 255 };
            Some(Rgba::new(pair(0), pair(2), pair(4), a))
        },
        _ => None,
    }
}

/// `rgb(r, g, b)` or `rgba(r, g, b, a)` with `a` in [0, 1]
fn parse_functional(s: &str) -> Option<Rgba> {
    let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else {
        (s.strip_prefix("rgb(")?.strip_suffix(')')?, false)
    };
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != if has_alpha { 4 } else { 3 } {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v: f64 = p.parse().ok()?;
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };
    let a = if has_alpha {
        let v: f64 = parts[3].parse().ok()?;
        if !v.is_finite() {
            return None;
        }
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };
    Some(Rgba::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
}

impl FromStr for Rgba {
    type Err = HeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix('#') {
            parse_hex(hex)
        } else if lower.starts_with("rgb") {
            parse_functional(&lower)
        } else {
            NAMED.iter().find(|(name, _)| *name == lower).map(|(_, c)| *c)
        };
        parsed.ok_or_else(|| HeatError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Rgba {
    type Error = HeatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!("blue".parse::<Rgba>().unwrap(), Rgba::rgb(0, 0, 255));
        assert_eq!(" Lime ".parse::<Rgba>().unwrap(), Rgba::rgb(0, 255, 0));
        assert_eq!("transparent".parse::<Rgba>().unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!("#f00".parse::<Rgba>().unwrap(), Rgba::rgb(255, 0, 0));
        assert_eq!("#00ff0080".parse::<Rgba>().unwrap(), Rgba::new(0, 255, 0, 128));
        assert_eq!("#1a2B3c".parse::<Rgba>().unwrap(), Rgba::rgb(0x1a, 0x2b, 0x3c));
        assert!("#12345".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_functional_colors() {
        assert_eq!("rgb(10, 20, 30)".parse::<Rgba>().unwrap(), Rgba::rgb(10, 20, 30));
        assert_eq!(
            "rgba(255,0,0,0.5)".parse::<Rgba>().unwrap(),
            Rgba::new(255, 0, 0, 128)
        );
        assert!("rgb(1,2)".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_unknown_color_is_error() {
        match "blurple".parse::<Rgba>() {
            Err(HeatError::InvalidColor(s)) => assert_eq!(s, "blurple"),
            other => panic!("expected InvalidColor, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_as_string() {
        let c: Rgba = serde_json::from_str("\"cyan\"").unwrap();
        assert_eq!(c, Rgba::rgb(0, 255, 255));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#00ffff\"");
        assert!(serde_json::from_str::<Rgba>("\"nope\"").is_err());
    }
}

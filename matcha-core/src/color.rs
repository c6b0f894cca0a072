//! Terminal color representation
//!
//! Supports:
//! - The canonical 16-color VGA palette
//! - The 256-color indexed palette (16 + 6x6x6 cube + grayscale ramp)
//! - 24-bit true color with alpha
//! - OSC 4/10/11 palette overrides

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 24-bit RGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// Build an opaque color from wide components, clamping each to 0-255.
    /// SGR truecolor parameters arrive as u16 and may be out of range.
    pub fn from_rgb(r: u16, g: u16, b: u16) -> Self {
        Rgba::opaque(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8)
    }
}

/// The canonical 16-color palette: standard 8 plus bright 8.
pub const PALETTE_16: [Rgba; 16] = [
    Rgba::opaque(0x00, 0x00, 0x00), // Black
    Rgba::opaque(0xCD, 0x00, 0x00), // Red
    Rgba::opaque(0x00, 0xCD, 0x00), // Green
    Rgba::opaque(0xCD, 0xCD, 0x00), // Yellow
    Rgba::opaque(0x00, 0x00, 0xEE), // Blue
    Rgba::opaque(0xCD, 0x00, 0xCD), // Magenta
    Rgba::opaque(0x00, 0xCD, 0xCD), // Cyan
    Rgba::opaque(0xE5, 0xE5, 0xE5), // White
    Rgba::opaque(0x7F, 0x7F, 0x7F), // Bright Black
    Rgba::opaque(0xFF, 0x00, 0x00), // Bright Red
    Rgba::opaque(0x00, 0xFF, 0x00), // Bright Green
    Rgba::opaque(0xFF, 0xFF, 0x00), // Bright Yellow
    Rgba::opaque(0x5C, 0x5C, 0xFF), // Bright Blue
    Rgba::opaque(0xFF, 0x00, 0xFF), // Bright Magenta
    Rgba::opaque(0x00, 0xFF, 0xFF), // Bright Cyan
    Rgba::opaque(0xFF, 0xFF, 0xFF), // Bright White
];

/// Look up one entry of the built-in 256-color table.
///
/// Indices 0-15 are [`PALETTE_16`], 16-231 a 6x6x6 color cube with levels
/// {0, 95, 135, 175, 215, 255}, and 232-255 a 24-step grayscale ramp.
pub fn lookup_256(index: u8) -> Rgba {
    const CUBE: [u8; 6] = [0, 95, 135, 175, 215, 255];
    match index {
        0..=15 => PALETTE_16[index as usize],
        16..=231 => {
            let offset = index as usize - 16;
            let r = offset / 36;
            let g = (offset / 6) % 6;
            let b = offset % 6;
            Rgba::opaque(CUBE[r], CUBE[g], CUBE[b])
        }
        232..=255 => {
            let gray = (index as usize - 232) as u8 * 10 + 8;
            Rgba::opaque(gray, gray, gray)
        }
    }
}

/// Materialize the full 256-color table.
pub fn palette_256() -> [Rgba; 256] {
    let mut palette = [Rgba::opaque(0, 0, 0); 256];
    for (index, slot) in palette.iter_mut().enumerate() {
        *slot = lookup_256(index as u8);
    }
    palette
}

/// Foreground color for an SGR code: 30-37 standard, 90-97 bright.
pub fn fg_from_sgr(code: u16) -> Option<Rgba> {
    match code {
        30..=37 => Some(PALETTE_16[code as usize - 30]),
        90..=97 => Some(PALETTE_16[code as usize - 90 + 8]),
        _ => None,
    }
}

/// Background color for an SGR code: 40-47 standard, 100-107 bright.
pub fn bg_from_sgr(code: u16) -> Option<Rgba> {
    match code {
        40..=47 => Some(PALETTE_16[code as usize - 40]),
        100..=107 => Some(PALETTE_16[code as usize - 100 + 8]),
        _ => None,
    }
}

/// Parse an X11-style color specification as used by OSC 4/10/11.
///
/// Accepted forms: `rgb:RR/GG/BB` with 2- or 4-hex-digit components
/// (4-digit components keep the high byte) and `#RRGGBB`. Anything
/// malformed yields `None`.
pub fn parse_color_spec(spec: &str) -> Option<Rgba> {
    if let Some(rest) = spec.strip_prefix("rgb:") {
        let mut parts = rest.split('/');
        let r = parse_component(parts.next()?)?;
        let g = parse_component(parts.next()?)?;
        let b = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Rgba::opaque(r, g, b))
    } else if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgba::opaque(r, g, b))
    } else {
        None
    }
}

fn parse_component(s: &str) -> Option<u8> {
    match s.len() {
        2 => u8::from_str_radix(s, 16).ok(),
        // 16-bit component; keep the high byte
        4 => u8::from_str_radix(&s[..2], 16).ok(),
        _ => None,
    }
}

/// OSC-driven overrides layered over the built-in 256-color table.
///
/// OSC 4 installs per-index overrides, OSC 10/11 override the default
/// foreground/background reported to renderers.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    overrides: HashMap<u8, Rgba>,
    foreground: Option<Rgba>,
    background: Option<Rgba>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a palette index, consulting overrides first.
    pub fn resolve(&self, index: u8) -> Rgba {
        self.overrides
            .get(&index)
            .copied()
            .unwrap_or_else(|| lookup_256(index))
    }

    /// Install an indexed override (OSC 4).
    pub fn set_indexed(&mut self, index: u8, color: Rgba) {
        self.overrides.insert(index, color);
    }

    /// Override the default foreground (OSC 10).
    pub fn set_foreground(&mut self, color: Rgba) {
        self.foreground = Some(color);
    }

    /// Override the default background (OSC 11).
    pub fn set_background(&mut self, color: Rgba) {
        self.background = Some(color);
    }

    pub fn foreground(&self) -> Option<Rgba> {
        self.foreground
    }

    pub fn background(&self) -> Option<Rgba> {
        self.background
    }

    /// Drop all overrides.
    pub fn reset(&mut self) {
        self.overrides.clear();
        self.foreground = None;
        self.background = None;
    }
}

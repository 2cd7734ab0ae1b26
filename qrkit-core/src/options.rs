//! Render options passed through to the rasterizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default symbol edge length in pixels.
pub const DEFAULT_SIZE: u32 = 400;

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    #[default]
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

impl ErrorCorrection {
    /// Single-letter name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCorrection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(CoreError::InvalidValue {
                field: "error correction level",
                value: s.to_string(),
            }),
        }
    }
}

/// How the encoded content should be drawn. Opaque to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Edge length in pixels.
    pub size: u32,
    /// Color of dark modules.
    pub foreground_color: String,
    /// Color of light modules and the quiet zone.
    pub background_color: String,
    /// Error correction level.
    pub error_correction: ErrorCorrection,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            foreground_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
            error_correction: ErrorCorrection::M,
        }
    }
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` into RGBA bytes.
#[must_use]
pub fn parse_hex_color(input: &str) -> Option<[u8; 4]> {
    let hex = input.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    let alpha = if expanded.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

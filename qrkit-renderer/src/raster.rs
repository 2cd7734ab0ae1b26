//! QR symbol rasterization.
//!
//! Builds the module matrix with `qrcode`, lays it out as SVG with a quiet
//! zone, and rasterizes that SVG to PNG through the resvg/tiny-skia pipeline.

use std::fmt::Write;

use base64::Engine;
use qrcode::{Color, EcLevel, QrCode};
use qrkit_core::options::parse_hex_color;
use qrkit_core::{ErrorCorrection, RenderOptions};

use crate::error::{RenderError, RenderResult};

/// Quiet zone width in modules.
pub const DEFAULT_MARGIN: u32 = 2;

/// Largest accepted edge length in pixels.
pub const MAX_SIZE: u32 = 8192;

/// Pixels per module when the requested width is too small for the symbol.
const FALLBACK_SCALE: u32 = 4;

/// Parameters handed to a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterParams {
    /// Requested edge length in pixels.
    pub width: u32,
    /// Quiet zone in modules.
    pub margin: u32,
    /// RGBA of dark modules.
    pub dark: [u8; 4],
    /// RGBA of light modules and the quiet zone.
    pub light: [u8; 4],
    /// Error correction level.
    pub error_correction: ErrorCorrection,
}

impl RasterParams {
    /// Translate render options, parsing both colors.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if the size exceeds [`MAX_SIZE`],
    /// or [`RenderError::InvalidColor`] if a color is not a hex color.
    pub fn from_options(options: &RenderOptions, margin: u32) -> RenderResult<Self> {
        if options.size > MAX_SIZE {
            return Err(RenderError::InvalidSize(options.size));
        }
        let color = |value: &str| {
            parse_hex_color(value).ok_or_else(|| RenderError::InvalidColor(value.to_string()))
        };
        Ok(Self {
            width: options.size,
            margin,
            dark: color(&options.foreground_color)?,
            light: color(&options.background_color)?,
            error_correction: options.error_correction,
        })
    }
}

/// Turns encoded content into a scannable symbol.
pub trait Rasterizer: Send + Sync {
    /// Draw `content` as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be encoded or drawn.
    fn rasterize(&self, content: &str, params: &RasterParams) -> RenderResult<Vec<u8>>;

    /// Draw `content` as SVG markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be encoded.
    fn vectorize(&self, content: &str, params: &RasterParams) -> RenderResult<String>;
}

/// Default rasterizer backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrRasterizer;

impl QrRasterizer {
    /// Create a rasterizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn symbol(content: &str, level: ErrorCorrection) -> RenderResult<QrCode> {
        let ec = match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        };
        QrCode::with_error_correction_level(content.as_bytes(), ec)
            .map_err(|e| RenderError::Encoding(e.to_string()))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Encoding(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width() as u32;
        let px_h = tree.size().height() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Encoding("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl Rasterizer for QrRasterizer {
    fn rasterize(&self, content: &str, params: &RasterParams) -> RenderResult<Vec<u8>> {
        let svg = self.vectorize(content, params)?;
        let pixmap = Self::rasterize_svg(&svg)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encoding(format!("PNG encoding failed: {e}")))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn vectorize(&self, content: &str, params: &RasterParams) -> RenderResult<String> {
        let code = Self::symbol(content, params.error_correction)?;
        let modules = code.width() as u32;
        let total = modules + params.margin * 2;
        let edge = symbol_edge(params.width, total);

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{edge}\" height=\"{edge}\" viewBox=\"0 0 {total} {total}\" shape-rendering=\"crispEdges\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"{total}\" height=\"{total}\" {}/>",
            paint(params.light),
        );

        let _ = write!(svg, "<path {} d=\"", paint(params.dark));
        let colors = code.to_colors();
        for (y, row) in colors.chunks(modules as usize).enumerate() {
            let mut x = 0;
            while x < row.len() {
                if row[x] != Color::Dark {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < row.len() && row[x] == Color::Dark {
                    x += 1;
                }
                let run = x - start;
                let _ = write!(
                    svg,
                    "M{} {}h{run}v1h-{run}z",
                    start as u32 + params.margin,
                    y as u32 + params.margin,
                );
            }
        }
        svg.push_str("\"/></svg>");

        tracing::debug!(
            modules,
            edge,
            level = %params.error_correction,
            "Laid out QR symbol"
        );
        Ok(svg)
    }
}

/// Output edge length: the requested width when the symbol fits, otherwise
/// a fixed number of pixels per module.
fn symbol_edge(width: u32, total_modules: u32) -> u32 {
    if width >= total_modules {
        width
    } else {
        total_modules * FALLBACK_SCALE
    }
}

/// SVG fill attributes for an RGBA color.
fn paint(rgba: [u8; 4]) -> String {
    let [r, g, b, a] = rgba;
    if a == u8::MAX {
        format!("fill=\"#{r:02x}{g:02x}{b:02x}\"")
    } else {
        let opacity = f32::from(a) / 255.0;
        format!("fill=\"#{r:02x}{g:02x}{b:02x}\" fill-opacity=\"{opacity:.3}\"")
    }
}

/// A rendered raster symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrAsset {
    png: Vec<u8>,
}

impl QrAsset {
    const DATA_URL_PREFIX: &'static str = "data:image/png;base64,";

    /// Wrap PNG bytes.
    #[must_use]
    pub fn from_png(png: Vec<u8>) -> Self {
        Self { png }
    }

    /// Parse a `data:image/png;base64,...` URL.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the URL is not a base64 PNG data URL.
    pub fn from_data_url(url: &str) -> RenderResult<Self> {
        let encoded = url
            .strip_prefix(Self::DATA_URL_PREFIX)
            .ok_or_else(|| RenderError::Export("Not a PNG data URL".to_string()))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RenderError::Export(format!("Invalid data URL: {e}")))?;
        Ok(Self { png })
    }

    /// PNG bytes.
    #[must_use]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// The asset as a data URL for display.
    #[must_use]
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        format!("{}{encoded}", Self::DATA_URL_PREFIX)
    }
}

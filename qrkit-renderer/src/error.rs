//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The encoded content is blank; there is nothing to draw.
    #[error("Nothing to encode")]
    EmptyContent,

    /// The rasterizer rejected the content (too long for the level, etc.).
    #[error("QR encoding failed: {0}")]
    Encoding(String),

    /// A color option could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The requested edge length exceeds the supported maximum.
    #[error("Invalid size: {0}px (maximum {}px)", crate::raster::MAX_SIZE)]
    InvalidSize(u32),

    /// Writing an export format failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// File I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A newer render request replaced this one.
    #[error("Render superseded by a newer request")]
    Superseded,
}

impl RenderError {
    /// Whether this error means the rasterizer could not produce a symbol.
    ///
    /// Empty content and superseded renders are signals, not failures.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::EmptyContent | Self::Superseded)
    }
}

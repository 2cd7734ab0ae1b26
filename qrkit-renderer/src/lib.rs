//! # QRKit Renderer
//!
//! Turns canonical payloads into QR symbols and exports them.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │ Canonical    │──▶│ encode() │──▶│ Rasterizer │──▶│ QrAsset      │
//! │ payload      │   │ (core)   │   │ (blocking) │   │ PNG/data URL │
//! └──────────────┘   └──────────┘   └────────────┘   └──────┬───────┘
//!                                                           ▼
//!                                                ┌────────────────────┐
//!                                                │ QrExporter         │
//!                                                │ PNG / SVG / PDF    │
//!                                                └────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod raster;
pub mod session;

use std::sync::Arc;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, ExportRequest, QrExporter};
pub use raster::{QrAsset, QrRasterizer, RasterParams, Rasterizer};
pub use session::{RenderOutcome, RenderSession, RenderStatus, RenderTicket};

use qrkit_core::{encode, is_blank, CanonicalPayload, RenderOptions};

/// Configuration for the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Quiet zone width in modules.
    pub margin: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            margin: raster::DEFAULT_MARGIN,
        }
    }
}

/// Encodes payloads and drives the rasterizer.
#[derive(Clone)]
pub struct QrRenderer {
    config: RendererConfig,
    rasterizer: Arc<dyn Rasterizer>,
}

impl std::fmt::Debug for QrRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl QrRenderer {
    /// Create a renderer with the given configuration and rasterizer.
    #[must_use]
    pub fn new(config: RendererConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { config, rasterizer }
    }

    /// Create a renderer using [`QrRasterizer`] and default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RendererConfig::default(), Arc::new(QrRasterizer::new()))
    }

    /// Encode a payload, rejecting blank content.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyContent`] if the content trims to nothing.
    pub fn content(payload: &CanonicalPayload) -> RenderResult<String> {
        let content = encode(payload);
        if is_blank(&content) {
            return Err(RenderError::EmptyContent);
        }
        Ok(content)
    }

    /// Encode and rasterize a payload.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyContent`] for blank content, or the
    /// rasterizer's error.
    pub async fn render(
        &self,
        payload: &CanonicalPayload,
        options: &RenderOptions,
    ) -> RenderResult<QrAsset> {
        let content = Self::content(payload)?;
        self.render_content(content, options).await
    }

    /// Rasterize already-encoded content on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the rasterizer's error, or [`RenderError::Encoding`] if the
    /// rasterizer task panicked.
    pub async fn render_content(
        &self,
        content: String,
        options: &RenderOptions,
    ) -> RenderResult<QrAsset> {
        let params = RasterParams::from_options(options, self.config.margin)
            .inspect_err(|e| tracing::error!("QR code generation error: {e}"))?;
        let rasterizer = Arc::clone(&self.rasterizer);

        let png = tokio::task::spawn_blocking(move || rasterizer.rasterize(&content, &params))
            .await
            .map_err(|e| RenderError::Encoding(format!("Rasterizer task failed: {e}")))
            .and_then(|result| result)
            .inspect_err(|e| tracing::error!("QR code generation error: {e}"))?;

        Ok(QrAsset::from_png(png))
    }

    /// Produce SVG markup for encoded content.
    ///
    /// # Errors
    ///
    /// Returns the rasterizer's error.
    pub async fn vectorize(&self, content: &str, options: &RenderOptions) -> RenderResult<String> {
        let params = RasterParams::from_options(options, self.config.margin)
            .inspect_err(|e| tracing::error!("QR code generation error: {e}"))?;
        let rasterizer = Arc::clone(&self.rasterizer);
        let content = content.to_string();

        tokio::task::spawn_blocking(move || rasterizer.vectorize(&content, &params))
            .await
            .map_err(|e| RenderError::Encoding(format!("Rasterizer task failed: {e}")))
            .and_then(|result| result)
            .inspect_err(|e| tracing::error!("QR code generation error: {e}"))
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

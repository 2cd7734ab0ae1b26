//! Symbol export to image/document formats.
//!
//! PNG export writes the rendered asset as is. SVG export asks the rasterizer
//! for fresh vector markup from the original content, since a raster asset
//! cannot be traced back into vectors. PDF export embeds the PNG asset on an
//! A4 page.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use qrkit_core::{FormKind, RenderOptions};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::raster::QrAsset;
use crate::QrRenderer;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// SVG vector graphics (returns the SVG XML string as UTF-8 bytes).
    Svg,
    /// PDF document with embedded raster image.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type of the exported bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(RenderError::Export(format!("Unsupported format: {other}"))),
        }
    }
}

/// Page layout for PDF export, in millimetres.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Page width (default: A4, 210).
    pub page_width_mm: f32,
    /// Page height (default: A4, 297).
    pub page_height_mm: f32,
    /// Edge length of the placed symbol (default: 100).
    pub image_size_mm: f32,
    /// Distance from the top edge of the page (default: 30).
    pub top_offset_mm: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            image_size_mm: 100.0,
            top_offset_mm: 30.0,
        }
    }
}

/// Everything an export needs: the rendered asset plus the inputs that
/// produced it.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Form kind, used for default file names.
    pub kind: FormKind,
    /// Encoded content.
    pub content: String,
    /// Options the asset was rendered with.
    pub options: RenderOptions,
    /// The rendered raster asset.
    pub asset: QrAsset,
}

/// Exports rendered symbols to files.
#[derive(Debug, Clone)]
pub struct QrExporter {
    renderer: QrRenderer,
    config: ExportConfig,
}

impl QrExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(renderer: QrRenderer, config: ExportConfig) -> Self {
        Self { renderer, config }
    }

    /// Create an exporter with the default renderer and layout.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(QrRenderer::with_defaults(), ExportConfig::default())
    }

    /// Default file name for a kind and format.
    #[must_use]
    pub fn default_filename(kind: FormKind, format: ExportFormat) -> String {
        match format {
            ExportFormat::Pdf => "qr-code.pdf".to_string(),
            ExportFormat::Png | ExportFormat::Svg => {
                format!("qr-code-{kind}.{}", format.extension())
            }
        }
    }

    /// Export to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol cannot be re-rendered or encoded.
    pub async fn export(&self, request: &ExportRequest, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => Ok(request.asset.png().to_vec()),
            ExportFormat::Svg => {
                let svg = self
                    .renderer
                    .vectorize(&request.content, &request.options)
                    .await?;
                Ok(svg.into_bytes())
            }
            ExportFormat::Pdf => self.render_to_pdf(request.asset.png()),
        }
    }

    /// Export and write the result to `dir`.
    ///
    /// Uses [`QrExporter::default_filename`] unless `filename` is given.
    ///
    /// # Errors
    ///
    /// Returns an error if exporting or writing the file fails.
    pub async fn export_as_file(
        &self,
        request: &ExportRequest,
        format: ExportFormat,
        dir: &Path,
        filename: Option<&str>,
    ) -> RenderResult<PathBuf> {
        let bytes = self.export(request, format).await?;
        let name = filename.map_or_else(
            || Self::default_filename(request.kind, format),
            ToString::to_string,
        );
        let path = dir.join(name);

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            "Exported {} ({} bytes) to {}",
            format.mime_type(),
            bytes.len(),
            path.display()
        );
        Ok(path)
    }

    /// Embed PNG bytes in a PDF page.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG cannot be decoded or the PDF cannot be written.
    #[cfg(feature = "pdf")]
    #[allow(clippy::cast_precision_loss)]
    pub fn render_to_pdf(&self, png: &[u8]) -> RenderResult<Vec<u8>> {
        use printpdf::image_crate::GenericImageView;

        let cfg = &self.config;
        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            "QR Code",
            printpdf::Mm(cfg.page_width_mm),
            printpdf::Mm(cfg.page_height_mm),
            "Layer 1",
        );

        let current_layer = doc.get_page(page1).get_layer(layer1);

        // Decode PNG using printpdf's bundled image crate for compatibility
        let dynamic_image = printpdf::image_crate::load_from_memory(png)
            .map_err(|e| RenderError::Export(format!("Failed to decode PNG for PDF: {e}")))?;
        let px_width = dynamic_image.width().max(1) as f32;

        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

        // PDF origin is bottom-left; size the image through its DPI.
        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm((cfg.page_width_mm - cfg.image_size_mm) / 2.0)),
            translate_y: Some(printpdf::Mm(
                cfg.page_height_mm - cfg.top_offset_mm - cfg.image_size_mm,
            )),
            dpi: Some(px_width * 25.4 / cfg.image_size_mm),
            ..Default::default()
        };

        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))
    }

    /// PDF export is unavailable without the `pdf` feature.
    ///
    /// # Errors
    ///
    /// Always returns [`RenderError::Export`].
    #[cfg(not(feature = "pdf"))]
    pub fn render_to_pdf(&self, _png: &[u8]) -> RenderResult<Vec<u8>> {
        Err(RenderError::Export(
            "PDF export requires the `pdf` feature".to_string(),
        ))
    }

    /// The page layout.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }
}

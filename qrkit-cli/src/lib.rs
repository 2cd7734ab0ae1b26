//! # QRKit CLI
//!
//! Command-line front end for QRKit.
//!
//! ## Usage
//!
//! ```bash
//! qrkit --type wifi --field ssid=home --field password=secret --format png --format pdf
//! qrkit --payload contact.json --print
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved payload source, render options and export targets
//! - `build_request` - Turns the payload source into a render request

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::PathBuf;

use clap::Parser;
use qrkit_core::{
    CanonicalPayload, CoreResult, ErrorCorrection, FieldMap, FormKind, GeneratorState,
    RenderOptions, RenderRequest,
};
use qrkit_renderer::ExportFormat;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "qrkit")]
#[command(about = "Encode structured data as QR codes and export them")]
#[command(version)]
pub struct CliArgs {
    /// Form type to fill (url, contact, text, sms, email, wifi, phone, location)
    #[arg(long = "type", default_value = "url")]
    pub kind: FormKind,

    /// Form field as key=value; may be repeated
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Canonical payload JSON file ({"type": ..., "data": {...}})
    #[arg(long, conflicts_with = "fields")]
    pub payload: Option<PathBuf>,

    /// Edge length in pixels
    #[arg(long, env = "QRKIT_SIZE", default_value_t = qrkit_core::options::DEFAULT_SIZE)]
    pub size: u32,

    /// Color of dark modules
    #[arg(long, env = "QRKIT_FOREGROUND", default_value = "#000000")]
    pub foreground: String,

    /// Color of light modules
    #[arg(long, env = "QRKIT_BACKGROUND", default_value = "#ffffff")]
    pub background: String,

    /// Error correction level (L, M, Q, H)
    #[arg(long, env = "QRKIT_ERROR_CORRECTION", default_value = "M")]
    pub error_correction: ErrorCorrection,

    /// Export format (png, svg, pdf); may be repeated
    #[arg(long = "format", value_name = "FORMAT", default_value = "png")]
    pub formats: Vec<ExportFormat>,

    /// Directory exported files are written to
    #[arg(long, env = "QRKIT_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Print the encoded content and exit without rendering
    #[arg(long)]
    pub print: bool,
}

/// Parse a `key=value` pair.
///
/// # Errors
///
/// Returns a message if there is no `=` or the key is empty.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Where the payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Raw form edits for one form kind.
    Form {
        /// Selected form kind.
        kind: FormKind,
        /// Flat form fields.
        fields: FieldMap,
    },
    /// A canonical payload JSON file.
    File(PathBuf),
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Payload source.
    pub source: PayloadSource,
    /// Render options.
    pub options: RenderOptions,
    /// Formats to export, in order, without duplicates.
    pub formats: Vec<ExportFormat>,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Only print the encoded content.
    pub print_only: bool,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        let source = match args.payload {
            Some(path) => PayloadSource::File(path),
            None => PayloadSource::Form {
                kind: args.kind,
                fields: args.fields.into_iter().collect(),
            },
        };

        let mut formats = Vec::with_capacity(args.formats.len());
        for format in args.formats {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }

        Self {
            source,
            options: RenderOptions {
                size: args.size,
                foreground_color: args.foreground,
                background_color: args.background,
                error_correction: args.error_correction,
            },
            formats,
            output_dir: args.output_dir,
            print_only: args.print,
        }
    }
}

/// Build the render request described by the configuration.
///
/// Form input goes through the same session state the UI uses, so sub-record
/// defaults (such as WPA for WiFi) apply.
///
/// # Errors
///
/// Returns an error if the payload file cannot be read or parsed.
pub async fn build_request(config: &CliConfig) -> CoreResult<RenderRequest> {
    match &config.source {
        PayloadSource::Form { kind, fields } => {
            let mut state = GeneratorState::new();
            state.change_type(*kind);
            state.edit(fields);
            Ok(RenderRequest {
                kind: *kind,
                payload: state.canonical(),
                options: config.options.clone(),
            })
        }
        PayloadSource::File(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            let payload: CanonicalPayload = serde_json::from_str(&raw)?;
            tracing::debug!("Loaded {} payload from {}", payload.kind(), path.display());
            Ok(RenderRequest {
                kind: payload.kind().form_kind(),
                payload,
                options: config.options.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrkit_core::encode;

    fn parse(args: &[&str]) -> CliConfig {
        let argv = std::iter::once("qrkit").chain(args.iter().copied());
        CliConfig::from(CliArgs::try_parse_from(argv).expect("valid args"))
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("ssid=home=net").unwrap(),
            ("ssid".to_string(), "home=net".to_string())
        );
        assert_eq!(
            parse_field("message=").unwrap(),
            ("message".to_string(), String::new())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(
            config.source,
            PayloadSource::Form {
                kind: FormKind::Url,
                fields: FieldMap::new(),
            }
        );
        assert_eq!(config.options.size, 400);
        assert_eq!(config.options.error_correction, ErrorCorrection::M);
        assert_eq!(config.formats, vec![ExportFormat::Png]);
        assert!(!config.print_only);
    }

    #[test]
    fn test_formats_are_deduplicated() {
        let config = parse(&["--format", "pdf", "--format", "png", "--format", "PDF"]);
        assert_eq!(config.formats, vec![ExportFormat::Pdf, ExportFormat::Png]);
    }

    #[test]
    fn test_payload_conflicts_with_fields() {
        let result = CliArgs::try_parse_from(["qrkit", "--payload", "p.json", "--field", "url=x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(CliArgs::try_parse_from(["qrkit", "--type", "fax"]).is_err());
    }

    #[tokio::test]
    async fn test_form_request_applies_wifi_default() {
        let config = parse(&["--type", "wifi", "--field", "ssid=home", "--field", "password=pw"]);
        let request = build_request(&config).await.expect("request");
        assert_eq!(request.kind, FormKind::Wifi);
        assert_eq!(encode(&request.payload), "WIFI:T:WPA;S:home;P:pw;H:false;;");
    }

    #[tokio::test]
    async fn test_file_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("payload.json");
        std::fs::write(
            &path,
            r#"{"type":"vcard","data":{"name":"Jane Doe","phone":"555"}}"#,
        )
        .expect("write");

        let config = parse(&["--payload", path.to_str().expect("utf8 path"), "--size", "256"]);
        let request = build_request(&config).await.expect("request");
        assert_eq!(request.kind, FormKind::Contact);
        assert_eq!(request.options.size, 256);
        assert!(encode(&request.payload).contains("N:Doe;Jane;;;"));
    }

    #[tokio::test]
    async fn test_missing_payload_file() {
        let config = parse(&["--payload", "/nonexistent/qrkit/payload.json"]);
        assert!(build_request(&config).await.is_err());
    }
}

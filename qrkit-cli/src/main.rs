//! # QRKit
//!
//! Encode, render and export QR codes from the command line.

use clap::Parser;
use qrkit_cli::{build_request, CliArgs, CliConfig};
use qrkit_core::encode;
use qrkit_renderer::{
    ExportRequest, QrExporter, QrRenderer, RenderError, RenderOutcome, RenderSession,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with optional JSON output.
///
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,qrkit_renderer=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = CliConfig::from(CliArgs::parse());
    let request = build_request(&config).await?;
    let content = encode(&request.payload);

    if config.print_only {
        println!("{content}");
        return Ok(());
    }

    tracing::info!(
        "Rendering {} code at {}px ({})",
        request.kind.label(),
        request.options.size,
        request.options.error_correction
    );

    let renderer = QrRenderer::with_defaults();
    let session = RenderSession::new(renderer.clone());
    let asset = match session
        .request_render(request.payload, request.options.clone())
        .outcome()
        .await
    {
        RenderOutcome::Ready(asset) => asset,
        RenderOutcome::Empty => return Err(RenderError::EmptyContent.into()),
        RenderOutcome::Failed(cause) => {
            anyhow::bail!("{}: {cause}", qrkit_renderer::session::FAILURE_MESSAGE)
        }
        RenderOutcome::Superseded => anyhow::bail!("render was superseded"),
    };

    let export = ExportRequest {
        kind: request.kind,
        content,
        options: request.options,
        asset,
    };
    let exporter = QrExporter::new(renderer, qrkit_renderer::ExportConfig::default());
    for format in &config.formats {
        let path = exporter
            .export_as_file(&export, *format, &config.output_dir, None)
            .await?;
        println!("{}", path.display());
    }

    Ok(())
}

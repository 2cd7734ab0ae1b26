//! Integration tests for the render session (qrkit-renderer).
//!
//! Covers the render cycle state machine, blank content handling, failure
//! reporting and superseding of stale in-flight renders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use qrkit_core::{CanonicalPayload, PayloadKind, RenderOptions, RenderPhase};
use qrkit_renderer::session::FAILURE_MESSAGE;
use qrkit_renderer::{
    QrRenderer, RasterParams, Rasterizer, RenderError, RenderOutcome, RenderResult,
    RenderSession, RenderTicket, RendererConfig,
};
use tracing_subscriber::fmt::MakeWriter;

/// Rasterizer that records calls, sleeps on content containing "slow" and
/// fails on content containing "fail".
#[derive(Default)]
struct ScriptedRasterizer {
    calls: AtomicUsize,
}

impl Rasterizer for ScriptedRasterizer {
    fn rasterize(&self, content: &str, _params: &RasterParams) -> RenderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.contains("slow") {
            std::thread::sleep(Duration::from_millis(300));
        }
        if content.contains("fail") {
            return Err(RenderError::Encoding("data too long".to_string()));
        }
        Ok(content.as_bytes().to_vec())
    }

    fn vectorize(&self, content: &str, _params: &RasterParams) -> RenderResult<String> {
        Ok(format!("<svg>{content}</svg>"))
    }
}

fn scripted_session() -> (RenderSession, Arc<ScriptedRasterizer>) {
    let rasterizer = Arc::new(ScriptedRasterizer::default());
    let renderer = QrRenderer::new(RendererConfig::default(), rasterizer.clone());
    (RenderSession::new(renderer), rasterizer)
}

fn url(value: &str) -> CanonicalPayload {
    CanonicalPayload::new(PayloadKind::Url).with_field("url", value)
}

// ==========================================================================
// Render cycle
// ==========================================================================

#[tokio::test]
async fn test_render_reaches_ready() {
    let (session, _) = scripted_session();
    let ticket = session.request_render(url("https://a.test"), RenderOptions::default());

    let RenderOutcome::Ready(asset) = ticket.outcome().await else {
        panic!("expected ready outcome");
    };
    assert_eq!(asset.png(), b"https://a.test");

    let status = session.status();
    assert_eq!(status.phase, RenderPhase::Ready);
    assert_eq!(status.asset, Some(asset));
    assert_eq!(status.error, None);
    assert!(!status.is_generating());
}

#[tokio::test]
async fn test_blank_content_skips_rasterizer() {
    let (session, rasterizer) = scripted_session();
    let outcome = session
        .request_render(url("  \n "), RenderOptions::default())
        .outcome()
        .await;

    assert_eq!(outcome, RenderOutcome::Empty);
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);

    let status = session.status();
    assert_eq!(status.phase, RenderPhase::Idle);
    assert_eq!(status.asset, None);
}

#[tokio::test]
async fn test_blank_content_clears_previous_asset() {
    let (session, _) = scripted_session();
    session
        .request_render(url("https://a.test"), RenderOptions::default())
        .outcome()
        .await;
    assert!(session.status().asset.is_some());

    session
        .request_render(url(""), RenderOptions::default())
        .outcome()
        .await;
    assert_eq!(session.status().asset, None);
}

#[tokio::test]
async fn test_failure_sets_generic_message() {
    let (session, _) = scripted_session();
    let outcome = session
        .request_render(url("please fail"), RenderOptions::default())
        .outcome()
        .await;

    assert!(matches!(outcome, RenderOutcome::Failed(cause) if cause.contains("data too long")));
    let status = session.status();
    assert_eq!(status.phase, RenderPhase::Failed);
    assert_eq!(status.error.as_deref(), Some(FAILURE_MESSAGE));
    assert_eq!(status.asset, None);
}

#[tokio::test]
async fn test_failed_session_recovers_on_next_request() {
    let (session, _) = scripted_session();
    session
        .request_render(url("fail"), RenderOptions::default())
        .outcome()
        .await;

    let outcome = session
        .request_render(url("https://ok.test"), RenderOptions::default())
        .outcome()
        .await;
    assert!(matches!(outcome, RenderOutcome::Ready(_)));
    assert_eq!(session.status().error, None);
}

#[tokio::test]
async fn test_invalid_color_is_a_failure() {
    let (session, rasterizer) = scripted_session();
    let options = RenderOptions {
        background_color: "not-a-color".to_string(),
        ..RenderOptions::default()
    };
    let outcome = session.request_render(url("https://a.test"), options).outcome().await;

    assert!(matches!(outcome, RenderOutcome::Failed(_)));
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.status().phase, RenderPhase::Failed);
}

#[tokio::test]
async fn test_oversized_image_is_a_failure() {
    let (session, rasterizer) = scripted_session();
    let options = RenderOptions {
        size: 60_000,
        ..RenderOptions::default()
    };
    let outcome = session.request_render(url("https://a.test"), options).outcome().await;

    assert!(matches!(outcome, RenderOutcome::Failed(cause) if cause.contains("60000")));
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.status().error.as_deref(), Some(FAILURE_MESSAGE));
}

// ==========================================================================
// Superseding
// ==========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_newer_request_supersedes_in_flight_render() {
    let (session, _) = scripted_session();
    let stale = session.request_render(url("slow first"), RenderOptions::default());
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = session.request_render(url("second"), RenderOptions::default());

    assert!(fresh.generation() > stale.generation());
    assert_eq!(stale.outcome().await, RenderOutcome::Superseded);
    assert!(matches!(fresh.outcome().await, RenderOutcome::Ready(_)));

    // Let the abandoned blocking rasterization finish; it must not publish.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let status = session.status();
    assert_eq!(status.phase, RenderPhase::Ready);
    assert_eq!(status.asset.map(|a| a.png().to_vec()), Some(b"second".to_vec()));
}

#[tokio::test]
async fn test_stale_blank_request_is_superseded() {
    let (session, _) = scripted_session();
    let stale = session.request_render(url("   "), RenderOptions::default());
    let fresh = session.request_render(url("https://a.test"), RenderOptions::default());

    assert_eq!(stale.outcome().await, RenderOutcome::Superseded);
    assert!(matches!(fresh.outcome().await, RenderOutcome::Ready(_)));
    assert_eq!(session.status().phase, RenderPhase::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_keep_newest_render_alive() {
    const CALLERS: usize = 4;
    let runtime = tokio::runtime::Handle::current();

    for round in 0..20 {
        let (session, _) = scripted_session();
        let barrier = Arc::new(Barrier::new(CALLERS));
        let callers: Vec<_> = (0..CALLERS)
            .map(|i| {
                let session = session.clone();
                let barrier = Arc::clone(&barrier);
                let runtime = runtime.clone();
                std::thread::spawn(move || {
                    let _guard = runtime.enter();
                    barrier.wait();
                    session.request_render(
                        url(&format!("https://a.test/{round}/{i}")),
                        RenderOptions::default(),
                    )
                })
            })
            .collect();

        let tickets: Vec<RenderTicket> = callers
            .into_iter()
            .map(|caller| caller.join().expect("caller thread"))
            .collect();
        let newest = tickets
            .into_iter()
            .max_by_key(RenderTicket::generation)
            .expect("tickets");
        let generation = newest.generation();

        assert!(
            matches!(newest.outcome().await, RenderOutcome::Ready(_)),
            "round {round}: newest render did not complete"
        );
        let status = session.status();
        assert_eq!(status.generation, generation, "round {round}");
        assert_eq!(status.phase, RenderPhase::Ready, "round {round}");
    }
}

#[tokio::test]
async fn test_subscriber_sees_final_status() {
    let (session, _) = scripted_session();
    let mut rx = session.subscribe();
    let ticket = session.request_render(url("https://a.test"), RenderOptions::default());
    let generation = ticket.generation();
    ticket.outcome().await;

    rx.changed().await.expect("status change");
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.generation, generation);
    assert_eq!(status.phase, RenderPhase::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_returns_to_idle() {
    let (session, _) = scripted_session();
    let ticket = session.request_render(url("slow"), RenderOptions::default());
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.reset();

    assert_eq!(ticket.outcome().await, RenderOutcome::Superseded);
    let status = session.status();
    assert_eq!(status.phase, RenderPhase::Idle);
    assert_eq!(status.asset, None);
}

// ==========================================================================
// Default rasterizer
// ==========================================================================

#[tokio::test]
async fn test_default_renderer_produces_png() {
    let renderer = QrRenderer::with_defaults();
    let payload = CanonicalPayload::new(PayloadKind::Wifi)
        .with_field("ssid", "home")
        .with_field("password", "secret");

    let asset = renderer
        .render(&payload, &RenderOptions::default())
        .await
        .expect("render");
    assert_eq!(&asset.png()[0..4], &[137, 80, 78, 71]);
    assert!(asset.data_url().starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_default_renderer_rejects_blank_content() {
    let renderer = QrRenderer::with_defaults();
    let err = renderer
        .render(&url("   "), &RenderOptions::default())
        .await
        .expect_err("blank");
    assert!(matches!(err, RenderError::EmptyContent));
    assert!(!err.is_failure());
}

#[tokio::test]
async fn test_default_renderer_rejects_oversized_content() {
    let renderer = QrRenderer::with_defaults();
    let options = RenderOptions {
        error_correction: qrkit_core::ErrorCorrection::H,
        ..RenderOptions::default()
    };
    let text = CanonicalPayload::new(PayloadKind::Text).with_field("text", "x".repeat(3000));

    let err = renderer.render(&text, &options).await.expect_err("too long");
    assert!(matches!(err, RenderError::Encoding(_)));
    assert!(err.is_failure());
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_vector_failure_logs_cause() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let renderer = QrRenderer::with_defaults();
    let options = RenderOptions {
        error_correction: qrkit_core::ErrorCorrection::H,
        ..RenderOptions::default()
    };
    let err = renderer
        .vectorize(&"x".repeat(3000), &options)
        .await
        .expect_err("too long");

    assert!(matches!(err, RenderError::Encoding(_)));
    assert!(logs.contents().contains("QR code generation error"));
}

//! # Render Session
//!
//! Runs render cycles requested by the UI, at most one at a time.
//!
//! ## Usage
//!
//! ```text
//! 1. UI debounces an edit and calls request_render()
//! 2. Any in-flight render is aborted; its result is never published
//! 3. Status moves Encoding -> Rasterizing -> Ready | Failed on a watch channel
//! 4. Blank content goes straight back to Idle with the asset cleared
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use qrkit_core::{encode, is_blank, CanonicalPayload, RenderOptions, RenderPhase};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::raster::QrAsset;
use crate::QrRenderer;

/// Message shown to the user when rendering fails.
pub const FAILURE_MESSAGE: &str = "Failed to generate QR code. Please check your input.";

/// Signals exposed to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStatus {
    /// Current phase.
    pub phase: RenderPhase,
    /// Most recent asset; kept while a new render is in flight.
    pub asset: Option<QrAsset>,
    /// User-facing error message.
    pub error: Option<String>,
    /// Request that produced this status.
    pub generation: u64,
}

impl RenderStatus {
    /// Whether a render is in flight.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.phase.is_generating()
    }
}

/// How a single render request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A symbol was produced.
    Ready(QrAsset),
    /// The content was blank; nothing was drawn.
    Empty,
    /// The rasterizer failed; holds the logged cause.
    Failed(String),
    /// A newer request replaced this one.
    Superseded,
}

/// Handle to a requested render.
#[derive(Debug)]
pub struct RenderTicket {
    generation: u64,
    handle: JoinHandle<RenderOutcome>,
}

impl RenderTicket {
    /// Generation number of the request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the request to finish.
    pub async fn outcome(self) -> RenderOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => RenderOutcome::Superseded,
            Err(e) => {
                tracing::error!("Render task failed: {e}");
                RenderOutcome::Failed(e.to_string())
            }
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    generation: AtomicU64,
    status: watch::Sender<RenderStatus>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl SessionInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `update` if `generation` is still the latest request.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut RenderStatus)) -> bool {
        self.status.send_if_modified(|status| {
            if !self.is_current(generation) {
                return false;
            }
            update(status);
            status.generation = generation;
            true
        })
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(
        &self,
        generation: u64,
        renderer: QrRenderer,
        payload: CanonicalPayload,
        options: RenderOptions,
    ) -> RenderOutcome {
        if !self.publish(generation, |s| {
            s.phase = RenderPhase::Encoding;
            s.error = None;
        }) {
            return RenderOutcome::Superseded;
        }

        let content = encode(&payload);
        if is_blank(&content) {
            let published = self.publish(generation, |s| {
                s.phase = RenderPhase::Idle;
                s.asset = None;
                s.error = None;
            });
            return if published {
                RenderOutcome::Empty
            } else {
                RenderOutcome::Superseded
            };
        }

        if !self.publish(generation, |s| s.phase = RenderPhase::Rasterizing) {
            return RenderOutcome::Superseded;
        }

        match renderer.render_content(content, &options).await {
            Ok(asset) => {
                let published = self.publish(generation, |s| {
                    s.phase = RenderPhase::Ready;
                    s.asset = Some(asset.clone());
                    s.error = None;
                });
                if published {
                    RenderOutcome::Ready(asset)
                } else {
                    RenderOutcome::Superseded
                }
            }
            Err(e) => {
                let published = self.publish(generation, |s| {
                    s.phase = RenderPhase::Failed;
                    s.asset = None;
                    s.error = Some(FAILURE_MESSAGE.to_string());
                });
                if published {
                    RenderOutcome::Failed(e.to_string())
                } else {
                    RenderOutcome::Superseded
                }
            }
        }
    }
}

/// Owns the render cycle for one editing session.
#[derive(Debug, Clone)]
pub struct RenderSession {
    renderer: QrRenderer,
    inner: Arc<SessionInner>,
}

impl RenderSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(renderer: QrRenderer) -> Self {
        let (status, _) = watch::channel(RenderStatus::default());
        Self {
            renderer,
            inner: Arc::new(SessionInner {
                generation: AtomicU64::new(0),
                status,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Start a render, superseding any render still in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn request_render(&self, payload: CanonicalPayload, options: RenderOptions) -> RenderTicket {
        // Bump, spawn and swap under one lock so the stored handle always
        // belongs to the newest generation.
        let mut in_flight = self.inner.lock_in_flight();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, kind = %payload.kind(), "Render requested");

        let inner = Arc::clone(&self.inner);
        let renderer = self.renderer.clone();
        let handle = tokio::spawn(async move {
            inner.run(generation, renderer, payload, options).await
        });

        if let Some(previous) = in_flight.replace(handle.abort_handle()) {
            previous.abort();
        }
        RenderTicket { generation, handle }
    }

    /// Abort any in-flight render and return to `Idle` with nothing shown.
    pub fn reset(&self) {
        let mut in_flight = self.inner.lock_in_flight();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        self.inner.publish(generation, |s| {
            *s = RenderStatus::default();
        });
    }

    /// Snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> RenderStatus {
        self.inner.status.borrow().clone()
    }

    /// Subscribe to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RenderStatus> {
        self.inner.status.subscribe()
    }

    /// The renderer driving this session.
    #[must_use]
    pub fn renderer(&self) -> &QrRenderer {
        &self.renderer
    }
}

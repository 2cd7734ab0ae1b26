//! Generator session state management.

use serde::{Deserialize, Serialize};

use crate::adapter::to_canonical;
use crate::form::{FieldMap, FormState};
use crate::options::RenderOptions;
use crate::payload::{CanonicalPayload, FormKind};

/// Phase of a single render cycle.
///
/// ```text
/// Idle ─▶ Encoding ─▶ Rasterizing ─▶ Ready
///                          └───────▶ Failed
/// ```
///
/// `Ready` and `Failed` return to `Idle` on the next user change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    /// Nothing in flight and nothing rendered.
    #[default]
    Idle,
    /// Building the payload content.
    Encoding,
    /// Waiting on the rasterizer.
    Rasterizing,
    /// An asset is available.
    Ready,
    /// The rasterizer rejected the content.
    Failed,
}

impl RenderPhase {
    /// Whether a render is in flight.
    #[must_use]
    pub const fn is_generating(self) -> bool {
        matches!(self, Self::Encoding | Self::Rasterizing)
    }
}

/// Everything needed to start one render cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Form kind that produced the payload.
    pub kind: FormKind,
    /// Snapshot of the canonical payload.
    pub payload: CanonicalPayload,
    /// Render options at request time.
    pub options: RenderOptions,
}

/// Editing session state owned by the UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorState {
    /// Currently selected form kind.
    selected: FormKind,
    /// Drafts for every kind.
    form: FormState,
    /// Current render options.
    options: RenderOptions,
    /// Whether the user has edited anything since the last type change.
    user_interacted: bool,
}

impl GeneratorState {
    /// Create a session with the URL form selected and default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a raw edit from the selected form component.
    pub fn edit(&mut self, fields: &FieldMap) {
        self.form.apply_edits(self.selected, fields);
        self.user_interacted = true;
    }

    /// Replace the render options.
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
        self.user_interacted = true;
    }

    /// Select another form kind.
    ///
    /// Every draft is reset, including those of other kinds, and the
    /// interaction flag is cleared.
    pub fn change_type(&mut self, kind: FormKind) {
        tracing::debug!("Switching form from {} to {kind}", self.selected);
        self.selected = kind;
        self.form = FormState::new();
        self.user_interacted = false;
    }

    /// Build a render request, or `None` before the first user interaction.
    #[must_use]
    pub fn render_request(&self) -> Option<RenderRequest> {
        if !self.user_interacted {
            return None;
        }
        Some(RenderRequest {
            kind: self.selected,
            payload: self.canonical(),
            options: self.options.clone(),
        })
    }

    /// A fresh canonical snapshot of the selected draft.
    #[must_use]
    pub fn canonical(&self) -> CanonicalPayload {
        to_canonical(self.selected, &self.form)
    }

    /// Fields shown by the selected form component.
    #[must_use]
    pub fn component_fields(&self) -> FieldMap {
        self.form.component_fields(self.selected)
    }

    /// The selected form kind.
    #[must_use]
    pub fn selected(&self) -> FormKind {
        self.selected
    }

    /// All drafts.
    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Current render options.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Whether the user has interacted since the last type change.
    #[must_use]
    pub fn has_user_interacted(&self) -> bool {
        self.user_interacted
    }
}

//! # QRKit Core
//!
//! Turns structured intent (a URL, a contact, a WiFi network, ...) into the
//! exact text a QR symbol must carry to be understood by scanner apps.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 qrkit-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Form State      │  Adapter                 │
//! │  - Sub-records   │  - to_canonical          │
//! │  - Raw edits     │  - to_form_state         │
//! ├─────────────────────────────────────────────┤
//! │  Canonical Model │  Encoder                 │
//! │  - PayloadKind   │  - vCard / WIFI          │
//! │  - Field map     │  - tel/sms/mailto/geo    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and free of shared mutable state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod encoder;
pub mod error;
pub mod form;
pub mod options;
pub mod payload;
pub mod state;
pub mod theme;

pub use adapter::{to_canonical, to_form_state, FormSelection};
pub use encoder::{encode, is_blank};
pub use error::{CoreError, CoreResult};
pub use form::{FieldMap, FormState, SubRecord};
pub use options::{ErrorCorrection, RenderOptions};
pub use payload::{CanonicalPayload, FormKind, PayloadKind};
pub use state::{GeneratorState, RenderPhase, RenderRequest};
pub use theme::{ResolvedTheme, ThemeMode, ThemeService};

/// QRKit core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

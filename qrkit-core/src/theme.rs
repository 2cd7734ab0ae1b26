//! # Theme Service
//!
//! Color-scheme selection with explicit lifecycle:
//!
//! ```text
//! 1. init(initial)      - pick explicit mode, else stored mode, else system
//! 2. set(mode)          - persist light/dark, forget the key for system
//! 3. on_system_change() - re-resolve when the OS preference flips
//! 4. teardown()         - stop; later calls fail with ThemeInactive
//! ```
//!
//! Persistence and the OS preference are injected through [`ThemeStore`]
//! and [`SystemPreference`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Storage key for the persisted theme.
pub const THEME_KEY: &str = "color-theme";

/// User-selected theme mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

impl ThemeMode {
    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(CoreError::InvalidValue {
                field: "theme mode",
                value: other.to_string(),
            }),
        }
    }
}

/// The concrete scheme to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    /// Light scheme.
    Light,
    /// Dark scheme.
    Dark,
}

/// Persistence for the selected theme mode.
pub trait ThemeStore {
    /// Load the stored mode, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> CoreResult<Option<ThemeMode>>;

    /// Store a mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&mut self, mode: ThemeMode) -> CoreResult<()>;

    /// Forget the stored mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&mut self) -> CoreResult<()>;
}

/// Source of the operating system's color-scheme preference.
pub trait SystemPreference {
    /// Whether the system currently prefers a dark scheme.
    fn prefers_dark(&self) -> bool;
}

impl<F: Fn() -> bool> SystemPreference for F {
    fn prefers_dark(&self) -> bool {
        self()
    }
}

/// A system preference that never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPreference(pub bool);

impl SystemPreference for FixedPreference {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}

/// In-memory theme store.
#[derive(Debug, Clone, Default)]
pub struct MemoryThemeStore {
    value: Option<ThemeMode>,
}

impl MemoryThemeStore {
    /// Create a store holding `value`.
    #[must_use]
    pub fn with_value(value: Option<ThemeMode>) -> Self {
        Self { value }
    }

    /// The raw stored value.
    #[must_use]
    pub fn value(&self) -> Option<ThemeMode> {
        self.value
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> CoreResult<Option<ThemeMode>> {
        Ok(self.value)
    }

    fn save(&mut self, mode: ThemeMode) -> CoreResult<()> {
        self.value = Some(mode);
        Ok(())
    }

    fn clear(&mut self) -> CoreResult<()> {
        self.value = None;
        Ok(())
    }
}

/// Theme store backed by a small JSON object on disk.
///
/// The file holds `{ "color-theme": "<mode>" }`. A missing file or an
/// unrecognized value loads as no stored mode.
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    /// Create a store at `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> CoreResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> CoreResult<Option<ThemeMode>> {
        let entries = self.read_entries()?;
        let Some(raw) = entries.get(THEME_KEY) else {
            return Ok(None);
        };
        match raw.parse::<ThemeMode>() {
            Ok(mode) => Ok(Some(mode)),
            Err(_) => {
                tracing::warn!("Ignoring unrecognized stored theme {raw:?}");
                Ok(None)
            }
        }
    }

    fn save(&mut self, mode: ThemeMode) -> CoreResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(THEME_KEY.to_string(), mode.to_string());
        self.write_entries(&entries)
    }

    fn clear(&mut self) -> CoreResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(THEME_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Theme selection service.
#[derive(Debug)]
pub struct ThemeService<S, P> {
    store: S,
    system: P,
    /// `None` while inactive.
    mode: Option<ThemeMode>,
}

impl<S: ThemeStore, P: SystemPreference> ThemeService<S, P> {
    /// Create an inactive service. Call [`ThemeService::init`] before use.
    #[must_use]
    pub fn new(store: S, system: P) -> Self {
        Self {
            store,
            system,
            mode: None,
        }
    }

    /// Activate the service.
    ///
    /// Uses `initial` when given, else the stored mode, else
    /// [`ThemeMode::System`]. The chosen mode is persisted like a
    /// [`ThemeService::set`] call.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn init(&mut self, initial: Option<ThemeMode>) -> CoreResult<ResolvedTheme> {
        let mode = match initial {
            Some(mode) => mode,
            None => self.store.load()?.unwrap_or_default(),
        };
        tracing::debug!("Theme service initialized in {mode} mode");
        self.mode = Some(mode);
        self.persist(mode)?;
        self.resolved()
    }

    /// Select a mode.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ThemeInactive`] if not initialized, or a store error.
    pub fn set(&mut self, mode: ThemeMode) -> CoreResult<ResolvedTheme> {
        self.mode()?;
        self.mode = Some(mode);
        self.persist(mode)?;
        self.resolved()
    }

    /// The selected mode.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ThemeInactive`] if not initialized.
    pub fn mode(&self) -> CoreResult<ThemeMode> {
        self.mode.ok_or(CoreError::ThemeInactive)
    }

    /// The scheme to display right now.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ThemeInactive`] if not initialized.
    pub fn resolved(&self) -> CoreResult<ResolvedTheme> {
        Ok(match self.mode()? {
            ThemeMode::Light => ResolvedTheme::Light,
            ThemeMode::Dark => ResolvedTheme::Dark,
            ThemeMode::System if self.system.prefers_dark() => ResolvedTheme::Dark,
            ThemeMode::System => ResolvedTheme::Light,
        })
    }

    /// Re-resolve after the system preference changed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ThemeInactive`] if not initialized.
    pub fn on_system_change(&self) -> CoreResult<ResolvedTheme> {
        let resolved = self.resolved()?;
        if self.mode == Some(ThemeMode::System) {
            tracing::debug!("System color scheme changed, now {resolved:?}");
        }
        Ok(resolved)
    }

    /// Deactivate the service.
    pub fn teardown(&mut self) {
        self.mode = None;
    }

    /// Whether [`ThemeService::init`] has run without a later teardown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    /// The injected store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self, mode: ThemeMode) -> CoreResult<()> {
        match mode {
            ThemeMode::System => self.store.clear(),
            mode => self.store.save(mode),
        }
    }
}

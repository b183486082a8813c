//! Runtime configuration.
//!
//! Resolved once at startup and passed into the wizard. Lookups go through an
//! injected function so tests never read the process environment.

use crate::catalog::InMemoryCatalog;
use crate::error::{BookingError, BookingResult};
use crate::models::{BookingKind, TimeGrid};
use std::path::{Path, PathBuf};

pub const TIME_SLOTS_VAR: &str = "EASYBOOK_TIME_SLOTS";
pub const CATALOG_VAR: &str = "EASYBOOK_CATALOG";
pub const DEFAULT_KIND_VAR: &str = "EASYBOOK_DEFAULT_KIND";

#[derive(Clone, Debug)]
pub struct AppConfig {
    time_grid: TimeGrid,
    catalog_path: Option<PathBuf>,
    default_kind: BookingKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            time_grid: TimeGrid::default(),
            catalog_path: None,
            default_kind: BookingKind::Hospital,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> BookingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup. Unset or blank
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> BookingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(raw) = get(TIME_SLOTS_VAR) {
            config.time_grid = TimeGrid::from_labels(raw.split(',')).map_err(|e| {
                BookingError::InvalidConfig(format!("{}: {}", TIME_SLOTS_VAR, e))
            })?;
        }

        if let Some(path) = get(CATALOG_VAR) {
            config.catalog_path = Some(PathBuf::from(path));
        }

        if let Some(kind) = get(DEFAULT_KIND_VAR) {
            config.default_kind = kind.parse::<BookingKind>().map_err(|e| {
                BookingError::InvalidConfig(format!("{}: {}", DEFAULT_KIND_VAR, e))
            })?;
        }

        Ok(config)
    }

    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }

    pub fn default_kind(&self) -> BookingKind {
        self.default_kind
    }

    /// Load the configured catalog, or the built-in demo catalog.
    pub fn load_catalog(&self) -> BookingResult<InMemoryCatalog> {
        match &self.catalog_path {
            Some(path) => InMemoryCatalog::load(path),
            None => Ok(InMemoryCatalog::demo()),
        }
    }
}

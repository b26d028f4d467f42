//! User settings for the budget ledger
//!
//! Persisted preferences: the default currency for new budgets, whether the
//! audit trail is written, and diagnostic verbosity.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::fieldmask::{Field, FieldMask, Schema};
use crate::models::money::CurrencyCode;

/// Fields a settings update may touch
pub const SETTINGS_UPDATE_SCHEMA: Schema = Schema::new(
    "settings",
    &[
        Field::optional("default_currency", "Currency for budgets created without one"),
        Field::optional("audit_enabled", "Write the audit trail"),
        Field::optional("verbose_logging", "Enable debug diagnostics"),
    ],
);

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency adopted by budgets created without one
    #[serde(default = "CurrencyCode::base")]
    pub default_currency: CurrencyCode,

    /// Whether create/update/delete operations are written to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,

    #[serde(default)]
    pub verbose_logging: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: CurrencyCode::base(),
            audit_enabled: default_audit_enabled(),
            verbose_logging: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> LedgerResult<()> {
        self.default_currency.validate()?;
        Ok(())
    }

    /// Copy the masked fields of `other` into these settings
    ///
    /// An empty mask copies every field. Nothing changes on error.
    pub fn update(&mut self, other: &Settings, mask: &FieldMask) -> LedgerResult<()> {
        SETTINGS_UPDATE_SCHEMA.validate(mask)?;

        let mut updated = self.clone();
        if mask.contains("default_currency") {
            updated.default_currency = other.default_currency.clone();
        }
        if mask.contains("audit_enabled") {
            updated.audit_enabled = other.audit_enabled;
        }
        if mask.contains("verbose_logging") {
            updated.verbose_logging = other.verbose_logging;
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> LedgerResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;
            settings.validate()?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> LedgerResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::recurrence::{BILL_INFERENCE_WINDOW_MONTHS, RECURRING_WINDOW_MONTHS};
use crate::{ClientError, ClientResult};

/// Tunables for the projection engine, read from `settings.json` in the
/// ledger home. Every field is optional in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Lookback used when surfacing recurring transactions.
    pub recurring_window_months: u32,
    /// Lookback used when inferring bills from real transactions.
    pub bill_inference_window_months: u32,
    /// Default length of a projection summary.
    pub projection_months: u32,
    pub cache_ttl_seconds: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            recurring_window_months: RECURRING_WINDOW_MONTHS,
            bill_inference_window_months: BILL_INFERENCE_WINDOW_MONTHS,
            projection_months: 12,
            cache_ttl_seconds: 300,
        }
    }
}

impl EngineSettings {
    fn validate(self, path: &Path) -> ClientResult<Self> {
        for (name, value) in [
            ("recurring_window_months", self.recurring_window_months),
            (
                "bill_inference_window_months",
                self.bill_inference_window_months,
            ),
            ("projection_months", self.projection_months),
        ] {
            if value == 0 || value > 120 {
                return Err(ClientError::invalid_settings(
                    path,
                    &format!("`{name}` must be between 1 and 120."),
                ));
            }
        }
        Ok(self)
    }
}

pub const SETTINGS_FILE: &str = "settings.json";

/// Settings for the ledger home at `home`; a missing file means defaults.
pub fn load_home_settings(home: &Path) -> ClientResult<EngineSettings> {
    load_settings(&home.join(SETTINGS_FILE))
}

pub fn load_settings(path: &Path) -> ClientResult<EngineSettings> {
    if !path.exists() {
        return Ok(EngineSettings::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|error| ClientError::invalid_settings(path, &error.to_string()))?;
    if content.trim().is_empty() {
        return Ok(EngineSettings::default());
    }

    let settings: EngineSettings = serde_json::from_str(&content)
        .map_err(|error| ClientError::invalid_settings(path, &error.to_string()))?;
    settings.validate(path)
}

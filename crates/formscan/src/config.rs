use formscan_barcode::BarcodeParams;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating a [`ScanConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid `{field}`: {reason}")]
    InvalidParams { field: &'static str, reason: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Largest accepted fill window side, in pixels.
pub const MAX_FILL_SIZE: usize = u16::MAX as usize;

/// Mark detection parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillParams {
    /// Side of the square sampling window, in pixels.
    pub size: usize,
    /// A pixel is dark when its value is below this.
    pub threshold: u8,
    /// Minimal percentage of dark pixels for a filled mark (0..=100).
    pub density: u8,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            size: 5,
            threshold: 127,
            density: 40,
        }
    }
}

impl FillParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidParams {
                field: "fill.size",
                reason: "sampling window must be at least one pixel".into(),
            });
        }
        if self.size > MAX_FILL_SIZE {
            return Err(ConfigError::InvalidParams {
                field: "fill.size",
                reason: format!("{} exceeds the {MAX_FILL_SIZE} pixel limit", self.size),
            });
        }
        if self.density > 100 {
            return Err(ConfigError::InvalidParams {
                field: "fill.density",
                reason: format!("{} is not a percentage", self.density),
            });
        }
        Ok(())
    }
}

/// Configuration of the per-image scanning pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub fill: FillParams,
    pub barcode: BarcodeParams,
}

impl ScanConfig {
    /// Parse and validate a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fill.validate()
    }
}

//! Runtime configuration loaded from the environment or a JSON document.

use std::env;

use serde::{Deserialize, Serialize};

use crate::common::error::{ConcatError, ConcatResult};
use crate::concat::Mode;

/// Default number of slices the accumulation buffer is sized for.
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Snapshot of configuration values consumed by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatCfg {
    pub max_size: usize,
    pub mode: i64,
    pub log_level: String,
}

impl Default for ConcatCfg {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            mode: Mode::Stack2D.code(),
            log_level: "info".to_string(),
        }
    }
}

impl ConcatCfg {
    /// Create a configuration snapshot from the process environment.
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are errors.
    pub fn load() -> ConcatResult<Self> {
        let mut cfg = Self::default();
        if let Ok(raw) = env::var("MATCAT_MAX_SIZE") {
            cfg.max_size = raw
                .trim()
                .parse()
                .map_err(|_| ConcatError::invalid_config(format!("MATCAT_MAX_SIZE={raw}")))?;
        }
        if let Ok(raw) = env::var("MATCAT_MODE") {
            cfg.mode = raw
                .trim()
                .parse()
                .map_err(|_| ConcatError::invalid_config(format!("MATCAT_MODE={raw}")))?;
        }
        if let Ok(level) = env::var("MATCAT_LOG") {
            cfg.log_level = level;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON document such as `{"max_size": 64, "mode": 2}`.
    pub fn from_json(source: &str) -> ConcatResult<Self> {
        let cfg: Self = serde_json::from_str(source)
            .map_err(|err| ConcatError::invalid_config(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ConcatResult<()> {
        if self.max_size == 0 {
            return Err(ConcatError::invalid_config("max_size must be positive"));
        }
        self.mode()?;
        Ok(())
    }

    pub fn mode(&self) -> ConcatResult<Mode> {
        Mode::try_from(self.mode)
    }
}

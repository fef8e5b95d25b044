// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::RgbColor;

/// Tunables shared by every engine call.
///
/// Missing fields in a JSON config fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// PDF header version written on output.
    pub pdf_version: String,
    /// Flate-compress content streams on output.
    pub compress_output: bool,
    /// Fixed per-file cost (header, catalog, xref, trailer) assumed by
    /// size-budget splitting.
    pub size_overhead_bytes: u64,
    /// Default font size for text watermarks, in points.
    pub watermark_font_size: f32,
    /// Distance from the page edge for corner-anchored watermarks, in points.
    pub watermark_margin_pt: f32,
    /// Colour painted over redacted spans.
    pub redaction_fill: RgbColor,
    /// Persist redaction audit trails to the audit database.
    pub audit_enabled: bool,
    /// Inputs larger than this are rejected before parsing.
    pub max_input_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pdf_version: "1.7".to_string(),
            compress_output: true,
            size_overhead_bytes: 1024,
            watermark_font_size: 48.0,
            watermark_margin_pt: 36.0,
            redaction_fill: RgbColor::BLACK,
            audit_enabled: true,
            max_input_bytes: 256 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "compress_output": false }"#).unwrap();
        assert!(!config.compress_output);
        assert_eq!(config.pdf_version, "1.7");
        assert_eq!(config.size_overhead_bytes, 1024);
    }

    #[test]
    fn json_round_trip() {
        let mut config = EngineConfig::default();
        config.watermark_font_size = 72.0;
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::PagewerkError::Serialization(_)));
    }
}

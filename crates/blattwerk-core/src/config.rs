// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::PaperSize;

/// Persistent editor settings. Every field has a default, so a partial JSON
/// file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of inserted blank pages.
    pub blank_page_size: PaperSize,
    /// Zoom factor thumbnails are rendered at.
    pub thumbnail_scale: f64,
    /// Font size (pt) for stamped page numbers.
    pub number_font_size: f64,
    /// Distance (pt) between stamped page numbers and the page edge.
    pub number_margin: f64,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            blank_page_size: PaperSize::A4,
            thumbnail_scale: 0.5,
            number_font_size: 12.0,
            number_margin: 30.0,
            log_filter: "info".into(),
        }
    }
}

impl EditorConfig {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error, so typos are not silently ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config = serde_json::from_str(&data)?;
        info!(path = %path.display(), "loaded editor config");
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

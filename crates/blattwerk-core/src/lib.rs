// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — Core types, errors, and the pure page arithmetic shared by every
// tool: page-range expressions and rendering/page-space coordinate mapping.

pub mod config;
pub mod coords;
pub mod error;
pub mod human_errors;
pub mod range;
pub mod types;

pub use config::EditorConfig;
pub use error::{BlattwerkError, ReconstructionError};
pub use types::*;

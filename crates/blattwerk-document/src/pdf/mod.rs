// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the lopdf-backed document store and page-number stamping.

mod copy;
pub mod numbering;
pub(crate) mod page_tree;
pub mod store;

pub use store::{LopdfStore, PdfOutput, PdfSource};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Turning page batches into PDF bytes.
//
// Provides the document-store contract the page model is reconstructed
// through, its lopdf implementation, the reconstructor itself, page-number
// stamping, and zip packaging for multi-file results.

pub mod archive;
pub mod pdf;
pub mod reconstruct;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

// Re-export the primary items so callers can use `blattwerk_document::LopdfStore` etc.
pub use archive::bundle_zip;
pub use pdf::numbering::{NumberPosition, NumberingOptions, stamp_page_numbers};
pub use pdf::store::LopdfStore;
pub use reconstruct::{Reconstructor, SourceSet};
pub use store::{DocStore, describe_document};

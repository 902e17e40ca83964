// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use thiserror::Error;

use crate::types::DocumentId;

/// Top-level error type for all Blattwerk operations.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    // -- Document collaborator errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("document is encrypted")]
    EncryptedDocument,

    #[error("archive creation failed: {0}")]
    Archive(String),

    // -- Reconstruction --
    #[error("reconstruction failed: {0}")]
    Reconstruction(#[from] ReconstructionError),

    // -- Validation --
    #[error("nothing to build for {mode} mode")]
    EmptyPlan { mode: &'static str },

    #[error("crop area is empty")]
    EmptyCropArea,

    // -- Session --
    #[error("build from generation {started} discarded (session is at {current})")]
    StaleBuild { started: u64, current: u64 },

    #[error("background task failed: {0}")]
    TaskFailed(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A batch referenced something the supplied sources do not contain.
///
/// These are contract violations by the caller, never user mistakes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconstructionError {
    #[error("source document {0} was not supplied")]
    MissingDocument(DocumentId),

    #[error("page index {index} out of range for document {document} ({page_count} pages)")]
    MissingPage {
        document: DocumentId,
        index: usize,
        page_count: usize,
    },
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;

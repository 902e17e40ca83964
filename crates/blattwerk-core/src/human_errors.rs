// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives presentation: validation problems ask the user to change
// their input, broken files are permanent, everything else may be retried.

use crate::error::BlattwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may work (I/O hiccup, superseded build).
    Transient,
    /// The user must change something (pick pages, draw a crop area).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged or locked file, internal fault.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same action may succeed.
    pub retriable: bool,
    /// Severity level (drives presentation).
    pub severity: Severity,
}

/// Convert a `BlattwerkError` into a `HumanError`.
pub fn humanize_error(err: &BlattwerkError) -> HumanError {
    match err {
        BlattwerkError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer to check it works, or choose a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BlattwerkError::EncryptedDocument => HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Remove the password in a PDF viewer, save a copy, and open that copy instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BlattwerkError::Archive(_) => HumanError {
            message: "The files couldn't be packed into a zip archive.".into(),
            suggestion: "Check there is enough free disk space, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BlattwerkError::Reconstruction(_) => HumanError {
            message: "Building the document failed.".into(),
            suggestion: "Your pages are unchanged. Reload the document and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BlattwerkError::EmptyPlan { mode } => HumanError {
            message: "There are no pages to save.".into(),
            suggestion: match *mode {
                "extract" => "Select at least one page, then try again.".into(),
                "remove" => "Select the pages to remove, leaving at least one page unselected.".into(),
                "fixed" => "Enter a whole number of pages per file, such as 2.".into(),
                "range" => "Enter page ranges such as 1-3, 5 that lie inside the document.".into(),
                _ => "Add some pages, then try again.".into(),
            },
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlattwerkError::EmptyCropArea => HumanError {
            message: "No crop area selected.".into(),
            suggestion: "Drag a rectangle over the page to choose the area to keep.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlattwerkError::StaleBuild { .. } => HumanError {
            message: "That result belongs to a document you've since closed.".into(),
            suggestion: "Start the build again for the current document.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BlattwerkError::TaskFailed(_) => HumanError {
            message: "Something went wrong while building your file.".into(),
            suggestion: "Try again. If it keeps happening, try fewer pages at once.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BlattwerkError::Io(io_err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check the file exists and you have permission to use it. ({io_err})"),
            retriable: true,
            severity: Severity::Transient,
        },

        BlattwerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Fix or delete the settings file to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconstructionError;
    use crate::types::DocumentId;

    #[test]
    fn empty_plan_is_action_required() {
        let human = humanize_error(&BlattwerkError::EmptyPlan { mode: "extract" });
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
        assert!(human.suggestion.contains("Select"));
    }

    #[test]
    fn reconstruction_is_permanent() {
        let err: BlattwerkError = ReconstructionError::MissingDocument(DocumentId::new()).into();
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn encrypted_is_permanent() {
        let human = humanize_error(&BlattwerkError::EncryptedDocument);
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn stale_build_is_transient() {
        let human = humanize_error(&BlattwerkError::StaleBuild {
            started: 1,
            current: 2,
        });
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }
}

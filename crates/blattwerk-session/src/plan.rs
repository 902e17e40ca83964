// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch planning: grouping the page list into one batch per output file.
//
// Empty batches never leave this module. A plan with no batches at all is an
// `EmptyPlan` error, raised before any document is touched.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::range::parse_page_ranges;
use blattwerk_core::types::{OutputBatch, PageEntry};

use crate::selection::Selection;

/// How a tool turns the page list into output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanMode {
    /// Every page in order, one file.
    All,
    /// Selected pages in document order, one file.
    Extract,
    /// Unselected pages in document order, one file.
    Remove,
    /// Consecutive chunks of `chunk_size` pages, one file each.
    Fixed { chunk_size: usize },
    /// One file per range expression.
    Ranges { expressions: Vec<String> },
}

impl PlanMode {
    /// Fixed mode from user-typed text. Anything that is not a positive whole
    /// number gives a chunk size of 0, which plans nothing.
    pub fn fixed_from_text(text: &str) -> Self {
        let chunk_size = text.trim().parse().unwrap_or(0);
        Self::Fixed { chunk_size }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Extract => "extract",
            Self::Remove => "remove",
            Self::Fixed { .. } => "fixed",
            Self::Ranges { .. } => "range",
        }
    }

    /// File name stem for this mode's output.
    pub fn base_name(&self) -> String {
        match self {
            Self::All => "organized".into(),
            Self::Extract => "extracted_pages".into(),
            Self::Remove => "removed_pages".into(),
            Self::Fixed { chunk_size } => format!("fixed_split_{chunk_size}_pages"),
            Self::Ranges { .. } => "range_split".into(),
        }
    }
}

/// Group `entries` into output batches for `mode`.
pub fn plan(mode: &PlanMode, entries: &[PageEntry], selection: &Selection) -> Result<Vec<OutputBatch>> {
    let batches: Vec<OutputBatch> = match mode {
        PlanMode::All => vec![OutputBatch::new(entries.to_vec())],
        PlanMode::Extract => vec![OutputBatch::new(
            entries
                .iter()
                .filter(|e| selection.contains(e.id))
                .cloned()
                .collect(),
        )],
        PlanMode::Remove if selection.is_empty() => Vec::new(),
        PlanMode::Remove => vec![OutputBatch::new(
            entries
                .iter()
                .filter(|e| !selection.contains(e.id))
                .cloned()
                .collect(),
        )],
        PlanMode::Fixed { chunk_size: 0 } => Vec::new(),
        PlanMode::Fixed { chunk_size } => entries
            .chunks(*chunk_size)
            .map(|chunk| OutputBatch::new(chunk.to_vec()))
            .collect(),
        PlanMode::Ranges { expressions } => expressions
            .iter()
            .map(|expr| {
                OutputBatch::new(
                    parse_page_ranges(expr, entries.len())
                        .into_iter()
                        .map(|number| entries[number - 1].clone())
                        .collect(),
                )
            })
            .collect(),
    };

    let batches: Vec<OutputBatch> = batches.into_iter().filter(|b| !b.is_empty()).collect();
    if batches.is_empty() {
        return Err(BlattwerkError::EmptyPlan { mode: mode.name() });
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::types::{DocumentId, PageId, PageKind};

    fn entries(n: usize) -> Vec<PageEntry> {
        let doc = DocumentId::new();
        (0..n)
            .map(|i| PageEntry::source(PageId(i as u64 + 1), doc, i))
            .collect()
    }

    fn page_numbers(batch: &OutputBatch) -> Vec<usize> {
        batch
            .entries
            .iter()
            .map(|e| match e.kind {
                PageKind::Source { page_index, .. } => page_index + 1,
                PageKind::Blank { .. } => 0,
            })
            .collect()
    }

    fn select(numbers: &[u64], entries: &[PageEntry]) -> Selection {
        let order: Vec<PageId> = entries.iter().map(|e| e.id).collect();
        let mut sel = Selection::new();
        for &n in numbers {
            sel.toggle(PageId(n), false, &order);
        }
        sel
    }

    #[test]
    fn fixed_mode_chunks_with_short_tail() {
        let pages = entries(7);
        let batches = plan(&PlanMode::Fixed { chunk_size: 3 }, &pages, &Selection::new())
            .expect("plan");
        let sizes: Vec<usize> = batches.iter().map(OutputBatch::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(page_numbers(&batches[2]), vec![7]);
    }

    #[test]
    fn fixed_mode_rejects_bad_text() {
        let pages = entries(4);
        for text in ["", "abc", "0", "-2", "1.5"] {
            let err = plan(&PlanMode::fixed_from_text(text), &pages, &Selection::new())
                .expect_err(text);
            assert!(matches!(err, BlattwerkError::EmptyPlan { mode: "fixed" }));
        }
        assert_eq!(PlanMode::fixed_from_text(" 2 "), PlanMode::Fixed { chunk_size: 2 });
    }

    #[test]
    fn range_mode_duplicates_across_batches_are_allowed() {
        let pages = entries(5);
        let mode = PlanMode::Ranges {
            expressions: vec!["1-2".into(), "1-2".into()],
        };
        let batches = plan(&mode, &pages, &Selection::new()).expect("plan");
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], batches[1]);
        assert_eq!(page_numbers(&batches[0]), vec![1, 2]);
    }

    #[test]
    fn range_mode_sorts_pages_and_drops_empty_expressions() {
        let pages = entries(6);
        let mode = PlanMode::Ranges {
            expressions: vec!["5,1-2".into(), "9-12".into(), "oops".into(), "6".into()],
        };
        let batches = plan(&mode, &pages, &Selection::new()).expect("plan");
        assert_eq!(batches.len(), 2);
        assert_eq!(page_numbers(&batches[0]), vec![1, 2, 5]);
        assert_eq!(page_numbers(&batches[1]), vec![6]);
    }

    #[test]
    fn range_mode_uses_current_positions() {
        let mut pages = entries(3);
        pages.swap(0, 2);
        let mode = PlanMode::Ranges {
            expressions: vec!["1".into()],
        };
        let batches = plan(&mode, &pages, &Selection::new()).expect("plan");
        assert_eq!(page_numbers(&batches[0]), vec![3]);
    }

    #[test]
    fn extract_keeps_document_order_not_click_order() {
        let pages = entries(6);
        let sel = select(&[5, 2, 4], &pages);
        let batches = plan(&PlanMode::Extract, &pages, &sel).expect("plan");
        assert_eq!(batches.len(), 1);
        assert_eq!(page_numbers(&batches[0]), vec![2, 4, 5]);
    }

    #[test]
    fn extract_with_nothing_selected_is_empty_plan() {
        let err = plan(&PlanMode::Extract, &entries(3), &Selection::new()).expect_err("empty");
        assert!(matches!(err, BlattwerkError::EmptyPlan { mode: "extract" }));
    }

    #[test]
    fn remove_keeps_unselected_pages() {
        let pages = entries(5);
        let sel = select(&[2, 4], &pages);
        let batches = plan(&PlanMode::Remove, &pages, &sel).expect("plan");
        assert_eq!(page_numbers(&batches[0]), vec![1, 3, 5]);
    }

    #[test]
    fn remove_needs_something_selected_and_something_left() {
        let pages = entries(2);
        let nothing = plan(&PlanMode::Remove, &pages, &Selection::new());
        assert!(matches!(nothing, Err(BlattwerkError::EmptyPlan { mode: "remove" })));

        let everything = plan(&PlanMode::Remove, &pages, &select(&[1, 2], &pages));
        assert!(matches!(everything, Err(BlattwerkError::EmptyPlan { mode: "remove" })));
    }

    #[test]
    fn all_mode_on_empty_list_is_empty_plan() {
        let err = plan(&PlanMode::All, &[], &Selection::new()).expect_err("empty");
        assert!(matches!(err, BlattwerkError::EmptyPlan { mode: "all" }));
    }

    #[test]
    fn base_names_follow_the_tool() {
        assert_eq!(PlanMode::Fixed { chunk_size: 4 }.base_name(), "fixed_split_4_pages");
        assert_eq!(PlanMode::Extract.base_name(), "extracted_pages");
        assert_eq!(
            PlanMode::Ranges { expressions: vec![] }.base_name(),
            "range_split"
        );
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selection: click, shift-click and select-all.
//
// Spans are measured in current document order, i.e. positions in the page
// list at the time of the click, not original page numbers. A page that was
// dragged elsewhere is therefore spanned where it now sits.

use std::collections::HashSet;

use blattwerk_core::range::parse_page_ranges;
use blattwerk_core::types::PageId;

/// Selected pages plus the anchor for range gestures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: HashSet<PageId>,
    /// Last page clicked, the fixed end of the next shift-click span.
    anchor: Option<PageId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<PageId> {
        self.anchor
    }

    /// Selected ids in the given document order.
    pub fn selected_in_order(&self, order: &[PageId]) -> Vec<PageId> {
        order
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Click on `id`, optionally with the range modifier held.
    ///
    /// With the modifier and an anchor still in `order`, every page between
    /// the anchor and `id` gets the same treatment: deselected if `id` was
    /// selected before the click, selected otherwise. Clicks on pages not in
    /// `order` are ignored.
    pub fn toggle(&mut self, id: PageId, with_range_modifier: bool, order: &[PageId]) {
        let Some(target) = order.iter().position(|&p| p == id) else {
            return;
        };

        let anchor = if with_range_modifier {
            self.anchor
                .and_then(|anchor| order.iter().position(|&p| p == anchor))
        } else {
            None
        };

        match anchor {
            Some(anchor) => {
                let select = !self.selected.contains(&id);
                let (lo, hi) = (anchor.min(target), anchor.max(target));
                for &page in &order[lo..=hi] {
                    if select {
                        self.selected.insert(page);
                    } else {
                        self.selected.remove(&page);
                    }
                }
            }
            None => {
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
            }
        }
        self.anchor = Some(id);
    }

    /// Select every page, or deselect everything when every page already is.
    pub fn select_all(&mut self, order: &[PageId]) {
        if self.selected.len() == order.len() {
            self.selected.clear();
        } else {
            self.selected = order.iter().copied().collect();
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Forget everything, anchor included.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Replace the selection with the pages a range expression names.
    pub fn set_from_expression(&mut self, expr: &str, order: &[PageId]) {
        self.selected = parse_page_ranges(expr, order.len())
            .into_iter()
            .map(|number| order[number - 1])
            .collect();
        self.anchor = None;
    }

    /// Drop a page that no longer exists.
    pub fn prune(&mut self, id: PageId) {
        self.selected.remove(&id);
        if self.anchor == Some(id) {
            self.anchor = None;
        }
    }
}

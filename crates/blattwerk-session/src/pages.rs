// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The ordered page list of an editing session.
//
// Operations addressed by id silently do nothing when the id is gone: an
// edit can arrive after the page it targets was deleted.

use tracing::debug;

use blattwerk_core::types::{DocumentId, PageEntry, PageId, PageSize, Rect};

/// Ordered sequence of page entries with session-unique ids.
#[derive(Debug, Clone, Default)]
pub struct PageList {
    entries: Vec<PageEntry>,
    /// Next id to hand out. Never rewinds, so ids are not reused.
    next_id: u64,
}

impl PageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Page ids in current document order.
    pub fn ids(&self) -> Vec<PageId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn get(&self, id: PageId) -> Option<&PageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position_of(&self, id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn get_mut(&mut self, id: PageId) -> Option<&mut PageEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn allocate_id(&mut self) -> PageId {
        let id = PageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append one source entry per page of a loaded document.
    pub fn append_document(&mut self, document: DocumentId, page_count: usize) -> Vec<PageId> {
        let mut ids = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            let id = self.allocate_id();
            self.entries.push(PageEntry::source(id, document, page_index));
            ids.push(id);
        }
        ids
    }

    /// Drop every entry. Ids already handed out stay retired.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move the entry at `from` to `to`. Out-of-range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from == to || from >= self.entries.len() || to >= self.entries.len() {
            return;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
    }

    /// Insert a blank page before position `at` (clamped to the end).
    pub fn insert_blank(&mut self, at: usize, size: PageSize) -> PageId {
        let id = self.allocate_id();
        let at = at.min(self.entries.len());
        self.entries.insert(at, PageEntry::blank(id, size));
        id
    }

    pub fn remove(&mut self, id: PageId) -> Option<PageEntry> {
        let position = self.position_of(id)?;
        Some(self.entries.remove(position))
    }

    /// Add `delta` degrees to the entry's rotation.
    pub fn rotate(&mut self, id: PageId, delta: i64) {
        match self.get_mut(id) {
            Some(entry) => entry.rotation = entry.rotation.rotated_by(delta),
            None => debug!(page = %id, "rotate on missing page ignored"),
        }
    }

    /// Replace the entry's crop; `None` clears it.
    pub fn set_crop(&mut self, id: PageId, crop: Option<Rect>) {
        match self.get_mut(id) {
            Some(entry) => entry.crop = crop,
            None => debug!(page = %id, "crop on missing page ignored"),
        }
    }

    /// Insert a copy of the entry directly after it, under a fresh id.
    pub fn duplicate(&mut self, id: PageId) -> Option<PageId> {
        let position = self.position_of(id)?;
        let new_id = self.allocate_id();
        let copy = PageEntry {
            id: new_id,
            ..self.entries[position].clone()
        };
        self.entries.insert(position + 1, copy);
        Some(new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::types::{PageKind, Rotation};

    fn list(pages: usize) -> (PageList, Vec<PageId>) {
        let mut list = PageList::new();
        let ids = list.append_document(DocumentId::new(), pages);
        (list, ids)
    }

    fn indices(list: &PageList) -> Vec<Option<usize>> {
        list.entries()
            .iter()
            .map(|e| match e.kind {
                PageKind::Source { page_index, .. } => Some(page_index),
                PageKind::Blank { .. } => None,
            })
            .collect()
    }

    #[test]
    fn reorder_moves_one_entry() {
        let (mut list, _) = list(4);
        list.reorder(0, 2);
        assert_eq!(indices(&list), vec![Some(1), Some(2), Some(0), Some(3)]);
        list.reorder(3, 0);
        assert_eq!(indices(&list), vec![Some(3), Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn reorder_same_or_invalid_index_is_noop() {
        let (mut list, _) = list(3);
        list.reorder(1, 1);
        list.reorder(0, 9);
        assert_eq!(indices(&list), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn insert_blank_shifts_followers_and_keeps_ids() {
        let (mut list, ids) = list(2);
        let blank = list.insert_blank(1, PageSize::new(100.0, 200.0));
        assert_eq!(indices(&list), vec![Some(0), None, Some(1)]);
        assert_eq!(list.ids(), vec![ids[0], blank, ids[1]]);

        let tail = list.insert_blank(99, PageSize::new(1.0, 1.0));
        assert_eq!(list.position_of(tail), Some(3));
    }

    #[test]
    fn ids_are_never_reused() {
        let (mut list, ids) = list(2);
        list.remove(ids[1]);
        let blank = list.insert_blank(0, PageSize::new(1.0, 1.0));
        assert!(!ids.contains(&blank));
        list.clear();
        let again = list.append_document(DocumentId::new(), 1);
        assert!(again[0] > blank);
    }

    #[test]
    fn rotation_composition_returns_to_zero() {
        let (mut list, ids) = list(1);
        list.rotate(ids[0], 90);
        list.rotate(ids[0], 90);
        assert_eq!(list.get(ids[0]).unwrap().rotation, Rotation::from_degrees(180));
        list.rotate(ids[0], 180);
        assert_eq!(list.get(ids[0]).unwrap().rotation, Rotation::NONE);
        list.rotate(ids[0], -90);
        assert_eq!(list.get(ids[0]).unwrap().rotation.degrees(), 270);
    }

    #[test]
    fn edits_on_missing_ids_are_absorbed() {
        let (mut list, ids) = list(2);
        let removed = list.remove(ids[0]).expect("present");
        assert_eq!(removed.id, ids[0]);

        list.rotate(ids[0], 90);
        list.set_crop(ids[0], Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert!(list.remove(ids[0]).is_none());
        assert!(list.duplicate(ids[0]).is_none());
        assert_eq!(list.len(), 1);
        assert_eq!(list.entries()[0].rotation, Rotation::NONE);
    }

    #[test]
    fn set_crop_replaces_and_clears() {
        let (mut list, ids) = list(1);
        let crop = Rect::new(1.0, 2.0, 3.0, 4.0);
        list.set_crop(ids[0], Some(crop));
        assert_eq!(list.get(ids[0]).unwrap().crop, Some(crop));
        list.set_crop(ids[0], None);
        assert_eq!(list.get(ids[0]).unwrap().crop, None);
    }

    #[test]
    fn duplicate_copies_edits_under_fresh_id() {
        let (mut list, ids) = list(2);
        list.rotate(ids[0], 90);
        let copy = list.duplicate(ids[0]).expect("duplicated");

        assert_eq!(list.ids(), vec![ids[0], copy, ids[1]]);
        let original = list.get(ids[0]).unwrap();
        let duplicate = list.get(copy).unwrap();
        assert_eq!(duplicate.kind, original.kind);
        assert_eq!(duplicate.rotation, original.rotation);
        assert_ne!(duplicate.id, original.id);
    }
}

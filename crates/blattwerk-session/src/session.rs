// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The editing session: one page list, one selection, the loaded sources.
//
// Every mutation of editor state goes through this type. Builds and
// thumbnail workers only ever see snapshots; their results come back tagged
// with the session generation they started in and are dropped when the
// session has since been restarted.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use blattwerk_core::EditorConfig;
use blattwerk_core::coords;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::range::{format_page_ranges, parse_page_ranges};
use blattwerk_core::types::{
    DocumentId, DocumentInfo, PageEntry, PageId, PageKind, PageSize, Rect, Rotation,
};
use blattwerk_document::{DocStore, describe_document};

use crate::build::{BuildOutput, BuildRequest, BuildResult};
use crate::pages::PageList;
use crate::plan::{PlanMode, plan};
use crate::selection::Selection;
use crate::thumbnails::{Renderer, Thumbnail, ThumbnailEvent, ThumbnailJob, spawn_thumbnails};

/// Which pages a drawn crop rectangle applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropTarget {
    All,
    Page(PageId),
    /// A range expression over current page positions.
    Range(String),
}

struct LoadedDocument {
    info: DocumentInfo,
    bytes: Arc<Vec<u8>>,
}

pub struct EditingSession {
    config: EditorConfig,
    /// Bumped on every restart; stale async results are recognised by it.
    generation: u64,
    pages: PageList,
    selection: Selection,
    documents: HashMap<DocumentId, LoadedDocument>,
    thumbnails: HashMap<PageId, Thumbnail>,
}

impl EditingSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            generation: 0,
            pages: PageList::new(),
            selection: Selection::new(),
            documents: HashMap::new(),
            thumbnails: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pages(&self) -> &[PageEntry] {
        self.pages.entries()
    }

    pub fn page_ids(&self) -> Vec<PageId> {
        self.pages.ids()
    }

    pub fn page(&self, id: PageId) -> Option<&PageEntry> {
        self.pages.get(id)
    }

    pub fn position_of(&self, id: PageId) -> Option<usize> {
        self.pages.position_of(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn document(&self, id: DocumentId) -> Option<&DocumentInfo> {
        self.documents.get(&id).map(|doc| &doc.info)
    }

    pub fn thumbnail(&self, id: PageId) -> Option<&Thumbnail> {
        self.thumbnails.get(&id)
    }

    // -- Documents --

    /// Start over with a single document.
    pub fn open_document<S: DocStore>(
        &mut self,
        store: &S,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DocumentId> {
        // Describe first so an unreadable file leaves the session intact.
        let info = describe_document(store, name, &bytes)?;
        self.restart();
        Ok(self.insert_document(info, bytes))
    }

    /// Append a further document's pages to the end of the page list.
    pub fn add_document<S: DocStore>(
        &mut self,
        store: &S,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DocumentId> {
        let info = describe_document(store, name, &bytes)?;
        Ok(self.insert_document(info, bytes))
    }

    fn insert_document(&mut self, info: DocumentInfo, bytes: Vec<u8>) -> DocumentId {
        let id = DocumentId::new();
        let page_count = info.page_count();
        self.pages.append_document(id, page_count);
        info!(document = %id, name = %info.name, pages = page_count, "Document loaded");
        self.documents.insert(
            id,
            LoadedDocument {
                info,
                bytes: Arc::new(bytes),
            },
        );
        id
    }

    /// Discard every page, the selection, thumbnails and loaded documents.
    /// Results of work started before the restart are rejected on arrival.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.selection.reset();
        self.documents.clear();
        self.thumbnails.clear();
        debug!(generation = self.generation, "session restarted");
    }

    // -- Selection --

    pub fn toggle(&mut self, id: PageId, with_range_modifier: bool) {
        let order = self.pages.ids();
        self.selection.toggle(id, with_range_modifier, &order);
    }

    pub fn select_all(&mut self) {
        let order = self.pages.ids();
        self.selection.select_all(&order);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_pages(&mut self, expr: &str) {
        let order = self.pages.ids();
        self.selection.set_from_expression(expr, &order);
    }

    /// The selection as a canonical range expression over current positions,
    /// e.g. `"1-3,5"`.
    pub fn selected_ranges(&self) -> String {
        let order = self.pages.ids();
        let positions: BTreeSet<usize> = order
            .iter()
            .enumerate()
            .filter(|(_, id)| self.selection.contains(**id))
            .map(|(i, _)| i + 1)
            .collect();
        format_page_ranges(&positions)
    }

    // -- Page edits --

    pub fn reorder(&mut self, from: usize, to: usize) {
        self.pages.reorder(from, to);
    }

    /// Insert a blank page; `None` uses the configured blank page size.
    pub fn insert_blank(&mut self, at: usize, size: Option<PageSize>) -> PageId {
        let size = size.unwrap_or_else(|| self.config.blank_page_size.page_size());
        self.pages.insert_blank(at, size)
    }

    pub fn remove(&mut self, id: PageId) {
        if self.pages.remove(id).is_some() {
            self.selection.prune(id);
            self.thumbnails.remove(&id);
        }
    }

    pub fn rotate(&mut self, id: PageId, delta: i64) {
        self.pages.rotate(id, delta);
    }

    pub fn set_crop(&mut self, id: PageId, crop: Option<Rect>) {
        self.pages.set_crop(id, crop);
    }

    pub fn duplicate(&mut self, id: PageId) -> Option<PageId> {
        let copy = self.pages.duplicate(id)?;
        if let Some(thumbnail) = self.thumbnails.get(&id).cloned() {
            self.thumbnails.insert(copy, thumbnail);
        }
        Some(copy)
    }

    /// Unrotated size of the page and the rotation it is displayed with
    /// (the source page's own rotation plus the entry's delta).
    pub fn page_geometry(&self, id: PageId) -> Option<(PageSize, Rotation)> {
        let entry = self.pages.get(id)?;
        match entry.kind {
            PageKind::Blank { width, height } => Some((PageSize::new(width, height), entry.rotation)),
            PageKind::Source {
                document,
                page_index,
            } => {
                let info = &self.documents.get(&document)?.info;
                let size = *info.page_sizes.get(page_index)?;
                let own = info.rotations.get(page_index).copied().unwrap_or_default();
                Some((size, own.compose(entry.rotation)))
            }
        }
    }

    /// Store a crop drawn on the rendering surface at `scale` on every
    /// targeted page, converted into each page's own content space. Returns
    /// the number of pages cropped.
    pub fn apply_crop_drawing(&mut self, target: &CropTarget, rect: Rect, scale: f64) -> Result<usize> {
        if rect.is_empty() {
            return Err(BlattwerkError::EmptyCropArea);
        }

        let order = self.pages.ids();
        let targets: Vec<PageId> = match target {
            CropTarget::All => order,
            CropTarget::Page(id) => order.into_iter().filter(|p| p == id).collect(),
            CropTarget::Range(expr) => parse_page_ranges(expr, order.len())
                .into_iter()
                .map(|number| order[number - 1])
                .collect(),
        };

        let mut cropped = 0;
        for id in targets {
            let Some((size, rotation)) = self.page_geometry(id) else {
                warn!(page = %id, "page geometry unknown, crop skipped");
                continue;
            };
            let crop = coords::to_page_space(rect, size, scale, rotation);
            self.pages.set_crop(id, Some(crop));
            cropped += 1;
        }
        debug!(cropped, "crop applied");
        Ok(cropped)
    }

    // -- Builds --

    /// Plan `mode` against the current pages and selection and snapshot
    /// everything the build will read.
    #[instrument(skip_all, fields(mode = mode.name(), generation = self.generation))]
    pub fn prepare_build(&self, mode: &PlanMode) -> Result<BuildRequest> {
        let batches = plan(mode, self.pages.entries(), &self.selection)?;
        let sources = self
            .documents
            .iter()
            .map(|(id, doc)| (*id, Arc::clone(&doc.bytes)))
            .collect();
        Ok(BuildRequest {
            generation: self.generation,
            batches,
            sources,
            base_name: mode.base_name(),
            numbering: None,
        })
    }

    /// Take delivery of a finished build. Results started before the last
    /// restart are rejected with `StaleBuild`.
    pub fn accept_build(&self, result: BuildResult) -> Result<BuildOutput> {
        if result.generation != self.generation {
            warn!(
                started = result.generation,
                current = self.generation,
                "discarding stale build result"
            );
            return Err(BlattwerkError::StaleBuild {
                started: result.generation,
                current: self.generation,
            });
        }
        result.output
    }

    // -- Thumbnails --

    /// Work for the thumbnail workers: every source page, grouped by document.
    pub fn thumbnail_jobs(&self) -> Vec<ThumbnailJob> {
        let mut jobs: Vec<ThumbnailJob> = Vec::new();
        for entry in self.pages.entries() {
            let PageKind::Source {
                document,
                page_index,
            } = entry.kind
            else {
                continue;
            };
            match jobs.iter_mut().find(|job| job.document == document) {
                Some(job) => job.pages.push((entry.id, page_index)),
                None => {
                    let Some(doc) = self.documents.get(&document) else {
                        continue;
                    };
                    jobs.push(ThumbnailJob {
                        document,
                        bytes: Arc::clone(&doc.bytes),
                        pages: vec![(entry.id, page_index)],
                    });
                }
            }
        }
        jobs
    }

    /// Render every source page at the configured thumbnail scale. Results
    /// arrive on `events` and go back through [`Self::apply_thumbnail`].
    pub fn spawn_thumbnail_workers<R: Renderer>(
        &self,
        renderer: Arc<R>,
        events: mpsc::Sender<ThumbnailEvent>,
    ) -> Vec<JoinHandle<()>> {
        spawn_thumbnails(
            renderer,
            self.generation,
            self.thumbnail_jobs(),
            self.config.thumbnail_scale,
            events,
        )
    }

    /// Apply one worker event. Returns whether a thumbnail was stored.
    pub fn apply_thumbnail(&mut self, event: ThumbnailEvent) -> bool {
        if event.generation != self.generation {
            debug!(page = %event.page, "thumbnail from earlier session dropped");
            return false;
        }
        if self.pages.get(event.page).is_none() {
            debug!(page = %event.page, "thumbnail for removed page dropped");
            return false;
        }
        match event.result {
            Ok(thumbnail) => {
                self.thumbnails.insert(event.page, thumbnail);
                true
            }
            Err(err) => {
                warn!(page = %event.page, %err, "thumbnail rendering failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::types::PaperSize;
    use blattwerk_document::LopdfStore;
    use blattwerk_document::fixtures::{self, RecordingStore};

    use crate::build::{execute_build, spawn_build};

    fn session_with(pages: usize) -> (EditingSession, DocumentId) {
        let mut session = EditingSession::new(EditorConfig::default());
        let doc = session
            .open_document(&LopdfStore, "sample.pdf", fixtures::sample_pdf(pages))
            .expect("open");
        (session, doc)
    }

    fn thumb() -> Thumbnail {
        Thumbnail {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        }
    }

    #[test]
    fn opening_creates_one_entry_per_page() {
        let (session, doc) = session_with(4);
        assert_eq!(session.pages().len(), 4);
        assert_eq!(session.document(doc).expect("info").page_count(), 4);
    }

    #[test]
    fn unreadable_document_leaves_session_untouched() {
        let (mut session, _) = session_with(2);
        let generation = session.generation();
        let err = session
            .open_document(&LopdfStore, "broken.pdf", b"garbage".to_vec())
            .expect_err("fail");
        assert!(matches!(err, BlattwerkError::PdfError(_)));
        assert_eq!(session.pages().len(), 2);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn add_document_appends_pages() {
        let (mut session, first) = session_with(2);
        let second = session
            .add_document(&LopdfStore, "more.pdf", fixtures::sample_pdf(3))
            .expect("add");
        assert_ne!(first, second);
        assert_eq!(session.pages().len(), 5);
        assert!(matches!(
            session.pages()[4].kind,
            PageKind::Source { document, page_index: 2 } if document == second
        ));
    }

    #[test]
    fn removing_a_selected_page_prunes_it() {
        let (mut session, _) = session_with(3);
        let ids = session.page_ids();
        session.toggle(ids[1], false);
        session.remove(ids[1]);
        assert!(session.selection().is_empty());
        assert_eq!(session.selection().anchor(), None);
        assert_eq!(session.pages().len(), 2);
    }

    #[test]
    fn blank_pages_default_to_configured_size() {
        let config = EditorConfig {
            blank_page_size: PaperSize::Letter,
            ..Default::default()
        };
        let mut session = EditingSession::new(config);
        let id = session.insert_blank(0, None);
        assert_eq!(
            session.page_geometry(id),
            Some((PageSize::new(612.0, 792.0), Rotation::NONE))
        );
    }

    #[test]
    fn geometry_composes_source_and_entry_rotation() {
        let mut session = EditingSession::new(EditorConfig::default());
        session
            .open_document(&LopdfStore, "r.pdf", fixtures::sample_pdf_with_rotations(&[90]))
            .expect("open");
        let id = session.page_ids()[0];
        session.rotate(id, 90);
        let (size, rotation) = session.page_geometry(id).expect("geometry");
        assert_eq!(size, PageSize::new(601.0, 800.0));
        assert_eq!(rotation.degrees(), 180);
    }

    #[test]
    fn crop_drawing_is_converted_per_page() {
        let (mut session, _) = session_with(2);
        let ids = session.page_ids();
        // Page 1 is 601x800 and page 2 602x800; drawn at half scale.
        let drawn = Rect::new(10.0, 20.0, 100.0, 50.0);
        let count = session
            .apply_crop_drawing(&CropTarget::All, drawn, 0.5)
            .expect("crop");
        assert_eq!(count, 2);
        assert_eq!(
            session.page(ids[0]).unwrap().crop,
            Some(Rect::new(20.0, 800.0 - 40.0 - 100.0, 200.0, 100.0))
        );
        assert!(session.page(ids[1]).unwrap().crop.is_some());
    }

    #[test]
    fn crop_on_rotated_page_uses_effective_rotation() {
        let (mut session, _) = session_with(1);
        let id = session.page_ids()[0];
        session.rotate(id, 180);
        session
            .apply_crop_drawing(&CropTarget::Page(id), Rect::new(0.0, 0.0, 10.0, 10.0), 1.0)
            .expect("crop");
        // Top-left of a half-turned page is its bottom-right corner.
        assert_eq!(session.page(id).unwrap().crop, Some(Rect::new(591.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn crop_range_target_and_empty_area() {
        let (mut session, _) = session_with(4);
        let ids = session.page_ids();
        let count = session
            .apply_crop_drawing(&CropTarget::Range("2-3".into()), Rect::new(0.0, 0.0, 5.0, 5.0), 1.0)
            .expect("crop");
        assert_eq!(count, 2);
        assert!(session.page(ids[0]).unwrap().crop.is_none());
        assert!(session.page(ids[1]).unwrap().crop.is_some());

        let err = session
            .apply_crop_drawing(&CropTarget::All, Rect::new(5.0, 5.0, 0.0, 20.0), 1.0)
            .expect_err("empty");
        assert!(matches!(err, BlattwerkError::EmptyCropArea));
        assert!(session.page(ids[0]).unwrap().crop.is_none());
    }

    #[test]
    fn empty_plan_never_reaches_the_store() {
        let (session, _) = session_with(3);
        let store = RecordingStore::new(LopdfStore);
        let err = session
            .prepare_build(&PlanMode::Extract)
            .and_then(|request| execute_build(&store, &request))
            .expect_err("empty");
        assert!(matches!(err, BlattwerkError::EmptyPlan { mode: "extract" }));
        assert_eq!(store.loads(), 0);
        assert_eq!(store.creates(), 0);
        assert_eq!(store.copied_pages(), 0);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn reordered_pages_build_in_new_order() {
        let (mut session, _) = session_with(3);
        session.reorder(2, 0);
        let request = session.prepare_build(&PlanMode::All).expect("plan");
        let output = execute_build(&LopdfStore, &request).expect("build");
        assert_eq!(output.file_name, "organized.pdf");
        assert_eq!(fixtures::page_widths(&output.bytes), vec![603.0, 601.0, 602.0]);
    }

    #[test]
    fn duplicated_page_is_copied_once() {
        let (mut session, _) = session_with(2);
        let first = session.page_ids()[0];
        session.duplicate(first).expect("duplicate");
        let store = RecordingStore::new(LopdfStore);
        let request = session.prepare_build(&PlanMode::All).expect("plan");
        let output = execute_build(&store, &request).expect("build");
        assert_eq!(store.copied_pages(), 2);
        assert_eq!(fixtures::page_widths(&output.bytes), vec![601.0, 601.0, 602.0]);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_edits() {
        let (mut session, _) = session_with(3);
        let request = session.prepare_build(&PlanMode::All).expect("plan");
        let ids = session.page_ids();
        session.remove(ids[0]);
        session.rotate(ids[1], 90);
        assert_eq!(request.batches[0].len(), 3);
        assert_eq!(request.batches[0].entries[1].rotation, Rotation::NONE);
    }

    #[tokio::test]
    async fn build_finishing_after_restart_is_discarded() {
        let (mut session, _) = session_with(2);
        let request = session.prepare_build(&PlanMode::All).expect("plan");
        let handle = spawn_build(Arc::new(LopdfStore), request);

        session.restart();
        let result = handle.await.expect("join");
        assert!(result.output.is_ok());
        let err = session.accept_build(result).expect_err("stale");
        assert!(matches!(err, BlattwerkError::StaleBuild { started: 1, current: 2 }));
        assert!(session.pages().is_empty());
    }

    #[tokio::test]
    async fn build_in_current_generation_is_accepted() {
        let (session, _) = session_with(2);
        let request = session.prepare_build(&PlanMode::All).expect("plan");
        let result = spawn_build(Arc::new(LopdfStore), request).await.expect("join");
        let output = session.accept_build(result).expect("accepted");
        assert_eq!(output.documents, 1);
    }

    #[test]
    fn thumbnails_from_old_generation_or_removed_pages_are_dropped() {
        let (mut session, _) = session_with(2);
        let ids = session.page_ids();
        let generation = session.generation();

        assert!(session.apply_thumbnail(ThumbnailEvent {
            generation,
            page: ids[0],
            result: Ok(thumb()),
        }));
        assert!(session.thumbnail(ids[0]).is_some());

        session.remove(ids[1]);
        assert!(!session.apply_thumbnail(ThumbnailEvent {
            generation,
            page: ids[1],
            result: Ok(thumb()),
        }));

        assert!(!session.apply_thumbnail(ThumbnailEvent {
            generation: generation - 1,
            page: ids[0],
            result: Ok(thumb()),
        }));

        session.restart();
        assert!(session.thumbnail(ids[0]).is_none());
    }

    #[test]
    fn selection_echoes_as_canonical_ranges() {
        let (mut session, _) = session_with(6);
        session.select_pages("6,1-2, 3,5");
        assert_eq!(session.selected_ranges(), "1-3,5-6");
        session.reorder(0, 5);
        assert_eq!(session.selected_ranges(), "1-2,4-6");
    }

    struct SizeRenderer;

    impl Renderer for SizeRenderer {
        fn render_thumbnail(&self, _document: &[u8], page_index: usize, scale: f64) -> Result<Thumbnail> {
            Ok(Thumbnail {
                width: page_index as u32,
                height: (scale * 100.0) as u32,
                rgba: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn worker_thumbnails_land_through_the_session() {
        let (mut session, _) = session_with(3);
        let (tx, mut rx) = mpsc::channel(8);
        let handles = session.spawn_thumbnail_workers(Arc::new(SizeRenderer), tx);
        for handle in handles {
            handle.await.expect("worker");
        }
        let mut stored = 0;
        while let Some(event) = rx.recv().await {
            if session.apply_thumbnail(event) {
                stored += 1;
            }
        }
        assert_eq!(stored, 3);
        let last = session.page_ids()[2];
        let thumbnail = session.thumbnail(last).expect("thumbnail");
        assert_eq!((thumbnail.width, thumbnail.height), (2, 50));
    }

    #[test]
    fn thumbnail_jobs_group_pages_by_document() {
        let (mut session, first) = session_with(2);
        let second = session
            .add_document(&LopdfStore, "b.pdf", fixtures::sample_pdf(1))
            .expect("add");
        session.insert_blank(1, None);

        let jobs = session.thumbnail_jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].document, first);
        assert_eq!(jobs[0].pages.len(), 2);
        assert_eq!(jobs[1].document, second);
        assert_eq!(jobs[1].pages, vec![(session.page_ids()[3], 0)]);
    }
}

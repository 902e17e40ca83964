// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document reconstruction — turning one batch of page entries plus the
// source documents they reference into a new document.
//
// Output page order is exactly batch order. A source page placed more than
// once in a batch is imported once and every further placement reuses that
// import. Rotation edits are added to the rotation a page already carries.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use blattwerk_core::coords;
use blattwerk_core::error::{BlattwerkError, ReconstructionError, Result};
use blattwerk_core::types::{DocumentId, OutputBatch, PageEntry, PageKind, PageSize};

use crate::store::DocStore;

/// Loaded source documents keyed by the id the page model refers to them by.
pub struct SourceSet<S: DocStore> {
    documents: HashMap<DocumentId, S::Source>,
}

impl<S: DocStore> SourceSet<S> {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    /// Parse every supplied document.
    #[instrument(skip_all, fields(documents = sources.len()))]
    pub fn load<B: AsRef<[u8]>>(store: &S, sources: &HashMap<DocumentId, B>) -> Result<Self> {
        let mut set = Self::new();
        for (id, bytes) in sources {
            set.insert(*id, store.load(bytes.as_ref())?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, id: DocumentId, source: S::Source) {
        self.documents.insert(id, source);
    }

    pub fn get(&self, id: DocumentId) -> Option<&S::Source> {
        self.documents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<S: DocStore> Default for SourceSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds output documents through a [`DocStore`]. Holds no state between
/// builds.
pub struct Reconstructor<'s, S: DocStore> {
    store: &'s S,
}

impl<'s, S: DocStore> Reconstructor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Build one output document from one batch.
    ///
    /// Every reference in the batch is checked before the output is started,
    /// so a contract violation never produces a partial document.
    #[instrument(skip_all, fields(pages = batch.len()))]
    pub fn build(&self, sources: &SourceSet<S>, batch: &OutputBatch) -> Result<Vec<u8>> {
        self.validate(sources, batch)?;

        let store = self.store;
        let mut out = store.create();
        let mut imported: HashMap<(DocumentId, usize), S::Page> = HashMap::new();

        for entry in &batch.entries {
            let page = match entry.kind {
                PageKind::Blank { width, height } => {
                    store.add_blank_page(&mut out, PageSize::new(width, height))?
                }
                PageKind::Source {
                    document,
                    page_index,
                } => {
                    let key = (document, page_index);
                    let import = match imported.get(&key) {
                        Some(&import) => {
                            debug!(page = %entry.id, page_index, "reusing imported page");
                            import
                        }
                        None => {
                            let source = sources
                                .get(document)
                                .ok_or(ReconstructionError::MissingDocument(document))?;
                            let import = store
                                .copy_pages(&mut out, source, &[page_index])?
                                .into_iter()
                                .next()
                                .ok_or_else(|| {
                                    BlattwerkError::PdfError(format!(
                                        "document store returned no page for index {page_index}"
                                    ))
                                })?;
                            imported.insert(key, import);
                            import
                        }
                    };
                    store.add_page(&mut out, import)?
                }
            };

            self.apply_edits(&mut out, page, entry)?;
        }

        let bytes = store.save(out)?;
        info!(
            pages = batch.len(),
            imported = imported.len(),
            output_bytes = bytes.len(),
            "Batch reconstructed"
        );
        Ok(bytes)
    }

    /// Build every batch in order, one output per batch.
    pub fn build_all(&self, sources: &SourceSet<S>, batches: &[OutputBatch]) -> Result<Vec<Vec<u8>>> {
        batches
            .iter()
            .map(|batch| self.build(sources, batch))
            .collect()
    }

    fn apply_edits(&self, out: &mut S::Output, page: S::Page, entry: &PageEntry) -> Result<()> {
        let store = self.store;

        let current = store.rotation(out, page)?;
        let rotation = current.compose(entry.rotation);
        if rotation != current {
            store.set_rotation(out, page, rotation)?;
        }

        if let Some(crop) = entry.crop {
            let media = store.media_box(out, page)?;
            match coords::place_in_box(crop, media) {
                Some(crop_box) => store.set_crop_box(out, page, crop_box)?,
                None => warn!(page = %entry.id, ?crop, "crop lies outside the page, ignored"),
            }
        }
        Ok(())
    }

    fn validate(&self, sources: &SourceSet<S>, batch: &OutputBatch) -> Result<()> {
        for entry in &batch.entries {
            if let PageKind::Source {
                document,
                page_index,
            } = entry.kind
            {
                let source = sources
                    .get(document)
                    .ok_or(ReconstructionError::MissingDocument(document))?;
                let page_count = self.store.page_count(source);
                if page_index >= page_count {
                    return Err(ReconstructionError::MissingPage {
                        document,
                        index: page_index,
                        page_count,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The document-store contract.
//
// The reconstructor never touches a document format directly; everything it
// does to sources and outputs goes through this trait, so a recording or
// in-memory implementation can stand in for the real PDF codec.

use blattwerk_core::error::Result;
use blattwerk_core::types::{DocumentInfo, PageBox, PageSize, Rotation};

/// Load, inspect, assemble and save page-oriented documents.
pub trait DocStore {
    /// A loaded, read-only source document.
    type Source;
    /// An output document under construction.
    type Output;
    /// Handle to a page inside an output document.
    type Page: Copy + std::fmt::Debug;

    /// Parse source bytes.
    fn load(&self, bytes: &[u8]) -> Result<Self::Source>;

    fn page_count(&self, doc: &Self::Source) -> usize;

    /// Unrotated size of a source page (0-based index).
    fn page_size(&self, doc: &Self::Source, index: usize) -> Result<PageSize>;

    /// Rotation already stored on a source page.
    fn page_rotation(&self, doc: &Self::Source, index: usize) -> Result<Rotation>;

    /// Start an empty output document.
    fn create(&self) -> Self::Output;

    /// Import source pages into `out` without placing them in its page order.
    fn copy_pages(
        &self,
        out: &mut Self::Output,
        doc: &Self::Source,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>>;

    /// Append an imported page to the end of the page order.
    ///
    /// Adding the same imported page twice yields two output pages that share
    /// the imported content; the returned handle addresses the new placement.
    fn add_page(&self, out: &mut Self::Output, page: Self::Page) -> Result<Self::Page>;

    /// Append a new empty page.
    fn add_blank_page(&self, out: &mut Self::Output, size: PageSize) -> Result<Self::Page>;

    fn rotation(&self, out: &Self::Output, page: Self::Page) -> Result<Rotation>;

    fn set_rotation(&self, out: &mut Self::Output, page: Self::Page, rotation: Rotation)
    -> Result<()>;

    /// The page's media box in absolute page-content coordinates.
    fn media_box(&self, out: &Self::Output, page: Self::Page) -> Result<PageBox>;

    fn set_crop_box(&self, out: &mut Self::Output, page: Self::Page, crop: PageBox) -> Result<()>;

    /// Serialise the output document.
    fn save(&self, out: Self::Output) -> Result<Vec<u8>>;
}

/// Load `bytes` and report the geometry of every page.
pub fn describe_document<S: DocStore>(
    store: &S,
    name: impl Into<String>,
    bytes: &[u8],
) -> Result<DocumentInfo> {
    let doc = store.load(bytes)?;
    let count = store.page_count(&doc);
    let mut page_sizes = Vec::with_capacity(count);
    let mut rotations = Vec::with_capacity(count);
    for index in 0..count {
        page_sizes.push(store.page_size(&doc, index)?);
        rotations.push(store.page_rotation(&doc, index)?);
    }
    Ok(DocumentInfo {
        name: name.into(),
        page_sizes,
        rotations,
    })
}

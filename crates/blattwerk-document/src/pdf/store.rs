// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document store backed by the `lopdf` crate.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};
use uuid::Uuid;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{PageBox, PageSize, Rotation};

use super::copy::ObjectCopier;
use super::page_tree::{self, INHERITABLE};
use crate::store::DocStore;

/// Stateless `DocStore` over lopdf documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfStore;

/// A parsed source PDF.
pub struct PdfSource {
    /// Distinguishes sources inside an output's copy bookkeeping.
    token: Uuid,
    document: Document,
    /// Page object ids in document order.
    pages: Vec<ObjectId>,
}

impl PdfSource {
    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or_else(|| {
            BlattwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                self.pages.len()
            ))
        })
    }
}

/// A PDF being assembled page by page.
pub struct PdfOutput {
    document: Document,
    /// Reserved id of the root `/Pages` node, written on save.
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Imported pages already in the page order.
    placed: HashSet<ObjectId>,
    /// Imported page dictionaries as they were before any placement edits.
    pristine: HashMap<ObjectId, Dictionary>,
    /// Per-source map of copied object ids.
    copied: HashMap<Uuid, HashMap<ObjectId, ObjectId>>,
}

impl PdfOutput {
    fn page_mut(&mut self, page: ObjectId) -> Result<&mut Dictionary> {
        self.document.get_dictionary_mut(page).map_err(|err| {
            BlattwerkError::PdfError(format!("cannot access output page {page:?}: {err}"))
        })
    }

    fn attach(&mut self, page: ObjectId) -> Result<()> {
        let pages_id = self.pages_id;
        self.page_mut(page)?
            .set("Parent", Object::Reference(pages_id));
        self.kids.push(page);
        Ok(())
    }

    /// Copy one source page (and everything it references) into the output.
    fn import(&mut self, source: &PdfSource, page_id: ObjectId) -> Result<ObjectId> {
        let own = source.document.get_dictionary(page_id).map_err(|err| {
            BlattwerkError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
        })?;

        let copied = self.copied.entry(source.token).or_default();
        let mut copier = ObjectCopier::new(&source.document, &mut self.document, copied);
        let new_id = copier.copy_reference(page_id);

        // The /Parent link is not copied, so attributes the page inherits
        // from its ancestors are pinned on the copy itself.
        let mut pinned = Vec::new();
        for key in INHERITABLE {
            if own.has(key) {
                continue;
            }
            if let Some(value) = page_tree::inherited(&source.document, page_id, key) {
                pinned.push((key, copier.copy_object(value)));
            }
        }

        let page = self.page_mut(new_id)?;
        for (key, value) in pinned {
            page.set(key.to_vec(), value);
        }
        let snapshot = page.clone();
        self.pristine.insert(new_id, snapshot);
        Ok(new_id)
    }
}

impl DocStore for LopdfStore {
    type Source = PdfSource;
    type Output = PdfOutput;
    type Page = ObjectId;

    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn load(&self, bytes: &[u8]) -> Result<PdfSource> {
        let document = Document::load_mem(bytes).map_err(|err| {
            BlattwerkError::PdfError(format!("failed to load PDF from memory: {err}"))
        })?;
        if document.is_encrypted() {
            return Err(BlattwerkError::EncryptedDocument);
        }

        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        debug!(pages = pages.len(), "PDF loaded from bytes");

        Ok(PdfSource {
            token: Uuid::new_v4(),
            document,
            pages,
        })
    }

    fn page_count(&self, doc: &PdfSource) -> usize {
        doc.pages.len()
    }

    fn page_size(&self, doc: &PdfSource, index: usize) -> Result<PageSize> {
        let page_id = doc.page_id(index)?;
        Ok(page_tree::media_box(&doc.document, page_id).size())
    }

    fn page_rotation(&self, doc: &PdfSource, index: usize) -> Result<Rotation> {
        let page_id = doc.page_id(index)?;
        Ok(page_tree::rotation(&doc.document, page_id))
    }

    fn create(&self) -> PdfOutput {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", Object::Reference(catalog_id));

        PdfOutput {
            document,
            pages_id,
            kids: Vec::new(),
            placed: HashSet::new(),
            pristine: HashMap::new(),
            copied: HashMap::new(),
        }
    }

    fn copy_pages(
        &self,
        out: &mut PdfOutput,
        doc: &PdfSource,
        indices: &[usize],
    ) -> Result<Vec<ObjectId>> {
        let mut imported = Vec::with_capacity(indices.len());
        for &index in indices {
            let page_id = doc.page_id(index)?;
            imported.push(out.import(doc, page_id)?);
            debug!(index, "page copied into output");
        }
        Ok(imported)
    }

    fn add_page(&self, out: &mut PdfOutput, page: ObjectId) -> Result<ObjectId> {
        if out.placed.insert(page) {
            out.attach(page)?;
            return Ok(page);
        }

        // A second placement gets its own page dictionary sharing the
        // imported content streams and resources.
        let mut dict = out.pristine.get(&page).cloned().ok_or_else(|| {
            BlattwerkError::PdfError(format!("page {page:?} was not imported into this output"))
        })?;
        // Annotation dictionaries point back at a single page.
        dict.remove(b"Annots");
        let placement = out.document.add_object(dict);
        out.attach(placement)?;
        debug!(?page, ?placement, "placed imported page again");
        Ok(placement)
    }

    fn add_blank_page(&self, out: &mut PdfOutput, size: PageSize) -> Result<ObjectId> {
        let media = PageBox::from_corners(0.0, 0.0, size.width, size.height);
        let page = out.document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("MediaBox", page_tree::box_object(media)),
            ("Resources", Object::Dictionary(Dictionary::new())),
        ]));
        out.placed.insert(page);
        out.attach(page)?;
        Ok(page)
    }

    fn rotation(&self, out: &PdfOutput, page: ObjectId) -> Result<Rotation> {
        Ok(page_tree::rotation(&out.document, page))
    }

    fn set_rotation(&self, out: &mut PdfOutput, page: ObjectId, rotation: Rotation) -> Result<()> {
        out.page_mut(page)?
            .set("Rotate", Object::Integer(rotation.degrees() as i64));
        Ok(())
    }

    fn media_box(&self, out: &PdfOutput, page: ObjectId) -> Result<PageBox> {
        Ok(page_tree::media_box(&out.document, page))
    }

    fn set_crop_box(&self, out: &mut PdfOutput, page: ObjectId, crop: PageBox) -> Result<()> {
        out.page_mut(page)?
            .set("CropBox", page_tree::box_object(crop));
        Ok(())
    }

    #[instrument(skip_all, fields(pages = out.kids.len()))]
    fn save(&self, out: PdfOutput) -> Result<Vec<u8>> {
        let PdfOutput {
            mut document,
            pages_id,
            kids,
            ..
        } = out;

        let count = kids.len() as i64;
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(kids.into_iter().map(Object::Reference).collect()),
            ),
            ("Count", Object::Integer(count)),
        ]);
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut output = Vec::new();
        document.save_to(&mut output).map_err(|err| {
            BlattwerkError::PdfError(format!("failed to serialise PDF: {err}"))
        })?;

        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }
}

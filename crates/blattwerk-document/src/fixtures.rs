// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: small in-memory PDFs and a call-counting document store.
//
// Page `n` (1-based) of every fixture document has a media box 600 + n points
// wide, so page order in an output is visible from the widths alone.

use std::sync::atomic::{AtomicUsize, Ordering};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use blattwerk_core::error::Result;
use blattwerk_core::types::{PageBox, PageSize, Rotation};

use crate::pdf::page_tree;
use crate::store::DocStore;

/// A `page_count` page PDF with no rotations.
pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    sample_pdf_with_rotations(&vec![0; page_count])
}

/// One page per entry, each carrying the given `/Rotate`.
pub fn sample_pdf_with_rotations(rotations: &[i64]) -> Vec<u8> {
    build(rotations.len(), |dict, number| {
        dict.set("MediaBox", media_box(600.0 + number as f64, 800.0));
        if rotations[number - 1] != 0 {
            dict.set("Rotate", Object::Integer(rotations[number - 1]));
        }
    }, Dictionary::new())
}

/// Pages without their own media box or rotation; both live on the
/// `/Pages` root and must be inherited.
pub fn sample_pdf_inherited(page_count: usize, size: PageSize, rotate: i64) -> Vec<u8> {
    let mut root_attributes = Dictionary::new();
    root_attributes.set("MediaBox", media_box(size.width, size.height));
    root_attributes.set("Rotate", Object::Integer(rotate));
    build(page_count, |_, _| {}, root_attributes)
}

fn build(
    page_count: usize,
    decorate: impl Fn(&mut Dictionary, usize),
    root_attributes: Dictionary,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    // One font dictionary shared by every page.
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(page_count);
    for number in 1..=page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("encode fixture content");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]);
        decorate(&mut page, number);
        page_ids.push(doc.add_object(page));
    }

    let mut pages = root_attributes;
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_count as i64));
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save fixture");
    buffer
}

fn media_box(width: f64, height: f64) -> Object {
    page_tree::box_object(PageBox::from_corners(0.0, 0.0, width, height))
}

/// Observable attributes of one page of a saved PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAttributes {
    pub width: f64,
    pub height: f64,
    pub rotation: u16,
    pub crop: Option<PageBox>,
    /// Object id of the page's first content stream, if any.
    pub contents: Option<ObjectId>,
}

/// Read back the pages of a saved PDF, in order.
pub fn page_attributes(bytes: &[u8]) -> Vec<PageAttributes> {
    let doc = Document::load_mem(bytes).expect("load output");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let size = page_tree::media_box(&doc, page_id).size();
            let contents = doc
                .get_dictionary(page_id)
                .ok()
                .and_then(|dict| dict.get(b"Contents").ok())
                .and_then(|obj| match obj {
                    Object::Reference(id) => Some(*id),
                    Object::Array(items) => items.first().and_then(|o| o.as_reference().ok()),
                    _ => None,
                });
            PageAttributes {
                width: size.width,
                height: size.height,
                rotation: page_tree::rotation(&doc, page_id).degrees(),
                crop: page_tree::crop_box(&doc, page_id),
                contents,
            }
        })
        .collect()
}

/// Page widths of a saved PDF, in order.
pub fn page_widths(bytes: &[u8]) -> Vec<f64> {
    page_attributes(bytes).iter().map(|p| p.width).collect()
}

/// Wraps another store and counts the calls that matter to tests.
#[derive(Debug, Default)]
pub struct RecordingStore<S> {
    inner: S,
    loads: AtomicUsize,
    creates: AtomicUsize,
    copied_pages: AtomicUsize,
    saves: AtomicUsize,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            copied_pages: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Output documents started.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Total source pages imported across all `copy_pages` calls.
    pub fn copied_pages(&self) -> usize {
        self.copied_pages.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<S: DocStore> DocStore for RecordingStore<S> {
    type Source = S::Source;
    type Output = S::Output;
    type Page = S::Page;

    fn load(&self, bytes: &[u8]) -> Result<Self::Source> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(bytes)
    }

    fn page_count(&self, doc: &Self::Source) -> usize {
        self.inner.page_count(doc)
    }

    fn page_size(&self, doc: &Self::Source, index: usize) -> Result<PageSize> {
        self.inner.page_size(doc, index)
    }

    fn page_rotation(&self, doc: &Self::Source, index: usize) -> Result<Rotation> {
        self.inner.page_rotation(doc, index)
    }

    fn create(&self) -> Self::Output {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create()
    }

    fn copy_pages(
        &self,
        out: &mut Self::Output,
        doc: &Self::Source,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>> {
        self.copied_pages.fetch_add(indices.len(), Ordering::SeqCst);
        self.inner.copy_pages(out, doc, indices)
    }

    fn add_page(&self, out: &mut Self::Output, page: Self::Page) -> Result<Self::Page> {
        self.inner.add_page(out, page)
    }

    fn add_blank_page(&self, out: &mut Self::Output, size: PageSize) -> Result<Self::Page> {
        self.inner.add_blank_page(out, size)
    }

    fn rotation(&self, out: &Self::Output, page: Self::Page) -> Result<Rotation> {
        self.inner.rotation(out, page)
    }

    fn set_rotation(
        &self,
        out: &mut Self::Output,
        page: Self::Page,
        rotation: Rotation,
    ) -> Result<()> {
        self.inner.set_rotation(out, page, rotation)
    }

    fn media_box(&self, out: &Self::Output, page: Self::Page) -> Result<PageBox> {
        self.inner.media_box(out, page)
    }

    fn set_crop_box(&self, out: &mut Self::Output, page: Self::Page, crop: PageBox) -> Result<()> {
        self.inner.set_crop_box(out, page, crop)
    }

    fn save(&self, out: Self::Output) -> Result<Vec<u8>> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(out)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-tree helpers: reference resolution, inherited page attributes, and
// reading/writing page boxes.

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{PageBox, Rotation};

/// Page attributes a page may inherit from its `/Pages` ancestors.
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Bound on reference chains and parent walks; malformed files can loop.
const MAX_DEPTH: usize = 64;

/// US Letter, the conventional fallback for a page without a media box.
const DEFAULT_MEDIA_BOX: PageBox = PageBox {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_DEPTH {
        match current {
            Object::Reference(id) => {
                current = doc.get_object(*id).map_err(|err| {
                    BlattwerkError::PdfError(format!("cannot resolve {id:?}: {err}"))
                })?;
            }
            direct => return Ok(direct),
        }
    }
    Err(BlattwerkError::PdfError("reference chain too deep".into()))
}

/// Look up `key` on a page, falling back to its ancestors in the page tree.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = page_id;
    for _ in 0..MAX_DEPTH {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Read a PDF rectangle array.
pub(crate) fn read_box(doc: &Document, object: &Object) -> Option<PageBox> {
    let items = resolve(doc, object).ok()?.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0f64; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = resolve(doc, item).ok()?.as_float().ok()? as f64;
    }
    Some(PageBox::from_corners(values[0], values[1], values[2], values[3]))
}

/// A page's effective media box.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> PageBox {
    match inherited(doc, page_id, b"MediaBox").and_then(|obj| read_box(doc, obj)) {
        Some(media) => media,
        None => {
            debug!(?page_id, "page has no usable MediaBox, assuming Letter");
            DEFAULT_MEDIA_BOX
        }
    }
}

/// A page's effective crop box, if one is set.
pub(crate) fn crop_box(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    inherited(doc, page_id, b"CropBox").and_then(|obj| read_box(doc, obj))
}

/// A page's effective `/Rotate` value.
pub(crate) fn rotation(doc: &Document, page_id: ObjectId) -> Rotation {
    inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).ok())
        .and_then(|obj| obj.as_i64().ok())
        .map(Rotation::from_degrees)
        .unwrap_or_default()
}

/// Encode a page box as a PDF rectangle array.
pub(crate) fn box_object(page_box: PageBox) -> Object {
    Object::Array(vec![
        Object::Real(page_box.llx as f32),
        Object::Real(page_box.lly as f32),
        Object::Real(page_box.urx as f32),
        Object::Real(page_box.ury as f32),
    ])
}

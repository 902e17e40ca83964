// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep copy of object graphs from one lopdf document into another.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

/// Copies objects from `source` into `target`, following references.
///
/// `copied` maps source ids to target ids and persists across calls, so a
/// resource shared by several pages (fonts, images) is copied once and
/// reference cycles terminate. `/Parent` links are dropped; the caller
/// re-attaches pages to the target's page tree.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    copied: &'a mut HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub(crate) fn new(
        source: &'a Document,
        target: &'a mut Document,
        copied: &'a mut HashMap<ObjectId, ObjectId>,
    ) -> Self {
        Self {
            source,
            target,
            copied,
        }
    }

    /// Copy the object behind `id`, returning its id in the target.
    pub(crate) fn copy_reference(&mut self, id: ObjectId) -> ObjectId {
        if let Some(&existing) = self.copied.get(&id) {
            return existing;
        }

        // Register before recursing so back-references resolve to this copy.
        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => self.copy_object(object),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        self.target.objects.insert(new_id, object);
        new_id
    }

    /// Copy a direct object, rewriting any references it contains.
    pub(crate) fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Reference(id) => Object::Reference(self.copy_reference(*id)),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value));
        }
        copy
    }
}

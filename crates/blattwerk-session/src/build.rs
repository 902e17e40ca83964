// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Running a planned build off the interactive thread.
//
// A `BuildRequest` owns everything the build reads: the batches are cloned
// out of the session and the source bytes are shared read-only, so later
// edits cannot reach a build already under way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use blattwerk_core::error::Result;
use blattwerk_core::types::{DocumentId, OutputBatch, PageKind};
use blattwerk_document::{
    DocStore, NumberingOptions, Reconstructor, SourceSet, bundle_zip, stamp_page_numbers,
};

/// Immutable snapshot of one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Session generation the snapshot was taken in.
    pub generation: u64,
    pub batches: Vec<OutputBatch>,
    pub sources: HashMap<DocumentId, Arc<Vec<u8>>>,
    /// Output file name stem.
    pub base_name: String,
    /// Page numbers to stamp on every output document.
    pub numbering: Option<NumberingOptions>,
}

impl BuildRequest {
    pub fn with_numbering(mut self, options: NumberingOptions) -> Self {
        self.numbering = Some(options);
        self
    }

    fn referenced_documents(&self) -> HashSet<DocumentId> {
        self.batches
            .iter()
            .flat_map(|batch| &batch.entries)
            .filter_map(|entry| match entry.kind {
                PageKind::Source { document, .. } => Some(document),
                PageKind::Blank { .. } => None,
            })
            .collect()
    }
}

/// The file a build produced: a PDF, or a zip of PDFs when the plan had more
/// than one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Number of PDF documents inside `bytes`.
    pub documents: usize,
}

impl BuildOutput {
    pub fn is_archive(&self) -> bool {
        self.documents > 1
    }
}

/// A finished build, tagged with the generation it was started in.
#[derive(Debug)]
pub struct BuildResult {
    pub generation: u64,
    pub output: Result<BuildOutput>,
}

/// Reconstruct every batch, stamp numbers if requested, and package.
#[instrument(skip_all, fields(generation = request.generation, batches = request.batches.len()))]
pub fn execute_build<S: DocStore>(store: &S, request: &BuildRequest) -> Result<BuildOutput> {
    // Only documents the batches actually use are parsed; a reference to a
    // document that was never supplied surfaces from the reconstructor.
    let referenced = request.referenced_documents();
    let needed: HashMap<DocumentId, &[u8]> = request
        .sources
        .iter()
        .filter(|(id, _)| referenced.contains(*id))
        .map(|(id, bytes)| (*id, bytes.as_slice()))
        .collect();
    let sources = SourceSet::load(store, &needed)?;
    debug!(sources = sources.len(), "sources parsed");

    let mut documents = Reconstructor::new(store).build_all(&sources, &request.batches)?;
    if let Some(options) = &request.numbering {
        for bytes in &mut documents {
            *bytes = stamp_page_numbers(bytes, options)?;
        }
    }

    let output = package(&request.base_name, documents)?;
    info!(
        file = %output.file_name,
        documents = output.documents,
        output_bytes = output.bytes.len(),
        "Build finished"
    );
    Ok(output)
}

fn package(base_name: &str, mut documents: Vec<Vec<u8>>) -> Result<BuildOutput> {
    if documents.len() == 1 {
        let bytes = documents.remove(0);
        return Ok(BuildOutput {
            file_name: format!("{base_name}.pdf"),
            bytes,
            documents: 1,
        });
    }

    let count = documents.len();
    let files: Vec<(String, Vec<u8>)> = documents
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| (format!("{base_name}_{}.pdf", i + 1), bytes))
        .collect();
    Ok(BuildOutput {
        file_name: format!("{base_name}.zip"),
        bytes: bundle_zip(&files)?,
        documents: count,
    })
}

/// Run [`execute_build`] on tokio's blocking pool.
pub fn spawn_build<S>(store: Arc<S>, request: BuildRequest) -> JoinHandle<BuildResult>
where
    S: DocStore + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || BuildResult {
        generation: request.generation,
        output: execute_build(store.as_ref(), &request),
    })
}

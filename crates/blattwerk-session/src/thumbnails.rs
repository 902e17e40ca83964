// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thumbnail rendering workers.
//
// Each document renders on its own blocking task. Workers never see the
// session: they send `ThumbnailEvent`s down a channel and the session applies
// them one at a time through `EditingSession::apply_thumbnail`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use blattwerk_core::error::Result;
use blattwerk_core::types::{DocumentId, PageId};

/// A rendered page preview, RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Rasterises document pages. Implementations live outside this crate.
pub trait Renderer: Send + Sync + 'static {
    fn render_thumbnail(&self, document: &[u8], page_index: usize, scale: f64) -> Result<Thumbnail>;
}

/// The pages of one document that need a thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub document: DocumentId,
    pub bytes: Arc<Vec<u8>>,
    /// Page entry and the source page index it shows.
    pub pages: Vec<(PageId, usize)>,
}

/// One rendered (or failed) thumbnail on its way back to the session.
#[derive(Debug)]
pub struct ThumbnailEvent {
    pub generation: u64,
    pub page: PageId,
    pub result: Result<Thumbnail>,
}

/// Render every job in parallel, one blocking task per document.
///
/// Workers stop early once the receiving end of `events` is dropped.
#[instrument(skip_all, fields(generation = generation, documents = jobs.len()))]
pub fn spawn_thumbnails<R: Renderer>(
    renderer: Arc<R>,
    generation: u64,
    jobs: Vec<ThumbnailJob>,
    scale: f64,
    events: mpsc::Sender<ThumbnailEvent>,
) -> Vec<JoinHandle<()>> {
    jobs.into_iter()
        .map(|job| {
            let renderer = Arc::clone(&renderer);
            let events = events.clone();
            tokio::task::spawn_blocking(move || {
                for (page, page_index) in job.pages {
                    let result = renderer.render_thumbnail(&job.bytes, page_index, scale);
                    let event = ThumbnailEvent {
                        generation,
                        page,
                        result,
                    };
                    if events.blocking_send(event).is_err() {
                        debug!(document = %job.document, "thumbnail receiver gone, stopping");
                        return;
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::error::BlattwerkError;
    use std::collections::HashSet;

    /// Encodes the page index in the thumbnail width; fails on index 99.
    struct IndexRenderer;

    impl Renderer for IndexRenderer {
        fn render_thumbnail(&self, _document: &[u8], page_index: usize, scale: f64) -> Result<Thumbnail> {
            if page_index == 99 {
                return Err(BlattwerkError::PdfError("cannot render".into()));
            }
            Ok(Thumbnail {
                width: page_index as u32,
                height: (scale * 10.0) as u32,
                rgba: Vec::new(),
            })
        }
    }

    fn job(pages: &[(u64, usize)]) -> ThumbnailJob {
        ThumbnailJob {
            document: DocumentId::new(),
            bytes: Arc::new(Vec::new()),
            pages: pages.iter().map(|&(id, index)| (PageId(id), index)).collect(),
        }
    }

    #[tokio::test]
    async fn every_page_reports_back_tagged_with_generation() {
        let (tx, mut rx) = mpsc::channel(4);
        let handles = spawn_thumbnails(
            Arc::new(IndexRenderer),
            3,
            vec![job(&[(1, 0), (2, 1)]), job(&[(3, 0), (4, 99)])],
            0.5,
            tx,
        );
        for handle in handles {
            handle.await.expect("worker");
        }

        let mut seen = HashSet::new();
        let mut failures = 0;
        while let Some(event) = rx.recv().await {
            assert_eq!(event.generation, 3);
            match event.result {
                Ok(thumb) => assert_eq!(thumb.height, 5),
                Err(_) => failures += 1,
            }
            seen.insert(event.page);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn workers_stop_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handles = spawn_thumbnails(
            Arc::new(IndexRenderer),
            0,
            vec![job(&[(1, 0), (2, 1), (3, 2)])],
            1.0,
            tx,
        );
        for handle in handles {
            handle.await.expect("worker exits cleanly");
        }
    }
}

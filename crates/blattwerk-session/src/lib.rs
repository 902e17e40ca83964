// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-session — The editing session behind every page tool.
//
// Holds the ordered page list and the selection, turns them into output
// batches for a tool mode, and runs builds and thumbnail rendering off the
// interactive thread. All state changes go through `EditingSession`.

pub mod build;
pub mod pages;
pub mod plan;
pub mod selection;
pub mod session;
pub mod thumbnails;

pub use build::{BuildOutput, BuildRequest, BuildResult, execute_build, spawn_build};
pub use pages::PageList;
pub use plan::{PlanMode, plan};
pub use selection::Selection;
pub use session::{CropTarget, EditingSession};
pub use thumbnails::{Renderer, Thumbnail, ThumbnailEvent, ThumbnailJob, spawn_thumbnails};

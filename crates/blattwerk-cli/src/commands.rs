// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool implementations: each subcommand drives an editing session the way
// the interactive tool would, then builds and writes the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use blattwerk_core::EditorConfig;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::range::parse_page_ranges;
use blattwerk_core::types::{PageId, Rect};
use blattwerk_document::{LopdfStore, NumberingOptions};
use blattwerk_session::{BuildRequest, CropTarget, EditingSession, PlanMode, spawn_build};

use crate::Command;

/// One position in an `organize --order` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeToken {
    /// 1-based source page, turned by `degrees`.
    Page { number: usize, degrees: i64 },
    Blank,
}

pub fn parse_organize_token(token: &str) -> std::result::Result<OrganizeToken, String> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("blank") {
        return Ok(OrganizeToken::Blank);
    }
    let (number, degrees) = match token.split_once(':') {
        Some((number, degrees)) => (number, degrees.trim()),
        None => (token, "0"),
    };
    let number = number
        .trim()
        .parse()
        .map_err(|_| format!("'{token}' is not a page number or 'blank'"))?;
    let degrees = degrees
        .parse()
        .map_err(|_| format!("'{degrees}' is not a rotation in degrees"))?;
    Ok(OrganizeToken::Page { number, degrees })
}

pub fn parse_rect(text: &str) -> std::result::Result<Rect, String> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|err| format!("invalid number in '{text}': {err}"))?;
    match values[..] {
        [x, y, width, height] => Ok(Rect::new(x, y, width, height)),
        _ => Err(format!("expected X,Y,WIDTH,HEIGHT, got '{text}'")),
    }
}

/// Run one command to completion and return the path written.
pub async fn run(command: Command, config: EditorConfig) -> Result<PathBuf> {
    let store = LopdfStore;
    let mut session = EditingSession::new(config);

    let (request, output) = match command {
        Command::Merge { inputs, output } => {
            for path in &inputs {
                add(&mut session, &store, path)?;
            }
            (named(session.prepare_build(&PlanMode::All)?, "merged"), output)
        }
        Command::Split {
            input,
            every,
            range,
            output,
        } => {
            open(&mut session, &store, &input)?;
            let mode = match every {
                Some(text) => PlanMode::fixed_from_text(&text),
                None => PlanMode::Ranges { expressions: range },
            };
            (session.prepare_build(&mode)?, output)
        }
        Command::Extract {
            input,
            pages,
            output,
        } => {
            open(&mut session, &store, &input)?;
            session.select_pages(&pages);
            info!(pages = %session.selected_ranges(), "Extracting");
            (session.prepare_build(&PlanMode::Extract)?, output)
        }
        Command::Remove {
            input,
            pages,
            output,
        } => {
            open(&mut session, &store, &input)?;
            session.select_pages(&pages);
            info!(pages = %session.selected_ranges(), "Removing");
            (session.prepare_build(&PlanMode::Remove)?, output)
        }
        Command::Rotate {
            input,
            degrees,
            pages,
            output,
        } => {
            open(&mut session, &store, &input)?;
            for id in targets(&session, pages.as_deref()) {
                session.rotate(id, degrees);
            }
            (named(session.prepare_build(&PlanMode::All)?, "rotated"), output)
        }
        Command::Crop {
            input,
            rect,
            scale,
            pages,
            output,
        } => {
            open(&mut session, &store, &input)?;
            let target = match pages {
                Some(expr) => CropTarget::Range(expr),
                None => CropTarget::All,
            };
            session.apply_crop_drawing(&target, rect, scale)?;
            (named(session.prepare_build(&PlanMode::All)?, "cropped"), output)
        }
        Command::Organize {
            input,
            order,
            output,
        } => {
            open(&mut session, &store, &input)?;
            organize(&mut session, &order);
            (session.prepare_build(&PlanMode::All)?, output)
        }
        Command::Number {
            input,
            position,
            format,
            start,
            pages,
            facing,
            bold,
            italic,
            color,
            output,
        } => {
            open(&mut session, &store, &input)?;
            let options = NumberingOptions {
                position,
                margin: session.config().number_margin,
                format,
                start_from: start,
                pages,
                facing,
                font_size: session.config().number_font_size,
                bold,
                italic,
                color,
            };
            let request = session.prepare_build(&PlanMode::All)?.with_numbering(options);
            (named(request, "numbered"), output)
        }
    };

    let result = spawn_build(Arc::new(store), request)
        .await
        .map_err(|err| BlattwerkError::TaskFailed(err.to_string()))?;
    let built = session.accept_build(result)?;

    let path = output.output.unwrap_or_else(|| PathBuf::from(&built.file_name));
    std::fs::write(&path, &built.bytes)?;
    info!(path = %path.display(), documents = built.documents, "Output written");
    Ok(path)
}

fn named(mut request: BuildRequest, base_name: &str) -> BuildRequest {
    request.base_name = base_name.into();
    request
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(session: &mut EditingSession, store: &LopdfStore, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    session.open_document(store, display_name(path), bytes)?;
    Ok(())
}

fn add(session: &mut EditingSession, store: &LopdfStore, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    session.add_document(store, display_name(path), bytes)?;
    Ok(())
}

/// Pages named by `expr`, or every page.
fn targets(session: &EditingSession, expr: Option<&str>) -> Vec<PageId> {
    let ids = session.page_ids();
    match expr {
        Some(expr) => parse_page_ranges(expr, ids.len())
            .into_iter()
            .map(|number| ids[number - 1])
            .collect(),
        None => ids,
    }
}

/// Rearrange the session's pages to follow `order`. A page listed twice is
/// duplicated; pages not listed are removed; unknown page numbers are
/// skipped.
fn organize(session: &mut EditingSession, order: &[OrganizeToken]) {
    let originals = session.page_ids();
    let mut used = vec![false; originals.len()];
    let mut wanted: Vec<PageId> = Vec::with_capacity(order.len());
    let mut turns: Vec<(PageId, i64)> = Vec::new();

    for token in order {
        let id = match *token {
            OrganizeToken::Blank => session.insert_blank(session.pages().len(), None),
            OrganizeToken::Page { number, degrees } => {
                let Some(&original) = number.checked_sub(1).and_then(|i| originals.get(i)) else {
                    warn!(number, "no such page, skipped");
                    continue;
                };
                let id = if used[number - 1] {
                    match session.duplicate(original) {
                        Some(copy) => copy,
                        None => continue,
                    }
                } else {
                    used[number - 1] = true;
                    original
                };
                turns.push((id, degrees));
                id
            }
        };
        wanted.push(id);
    }

    // Copies take the original's rotation, so turns wait until every copy exists.
    for (id, degrees) in turns {
        session.rotate(id, degrees);
    }

    for (id, _) in originals.iter().zip(&used).filter(|(_, used)| !**used) {
        session.remove(*id);
    }
    for (target, id) in wanted.iter().enumerate() {
        if let Some(current) = session.position_of(*id) {
            session.reorder(current, target);
        }
    }
}

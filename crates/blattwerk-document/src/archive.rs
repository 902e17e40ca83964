// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip packaging for builds that produce more than one output document.

use std::io::{Cursor, Write};

use tracing::{debug, instrument};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use blattwerk_core::error::{BlattwerkError, Result};

/// Pack named files into an in-memory zip archive, in the given order.
#[instrument(skip_all, fields(files = files.len()))]
pub fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in files {
        zip.start_file(name.as_str(), options)
            .map_err(|err| BlattwerkError::Archive(format!("cannot add {name}: {err}")))?;
        zip.write_all(bytes)?;
        debug!(%name, bytes = bytes.len(), "added to archive");
    }

    let cursor = zip
        .finish()
        .map_err(|err| BlattwerkError::Archive(err.to_string()))?;
    Ok(cursor.into_inner())
}

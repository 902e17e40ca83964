// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Blattwerk page model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a loaded source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a page entry within one editing session.
///
/// Allocated from a monotonically increasing counter, so an id is never
/// reused after its entry is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A quarter-turn page rotation, always one of 0, 90, 180 or 270 degrees.
///
/// Any integer converts into a rotation: it is snapped to the nearest quarter
/// turn and normalised into `[0, 360)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    pub fn from_degrees(degrees: i64) -> Self {
        let quarters = (degrees as f64 / 90.0).round() as i64;
        Self((quarters.rem_euclid(4) * 90) as u16)
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// Add a delta in degrees: `(rotation + 360 + delta) mod 360`.
    pub fn rotated_by(self, delta: i64) -> Self {
        Self::from_degrees(self.0 as i64 + delta.rem_euclid(360))
    }

    /// Compose two rotations (e.g. a source page's own rotation and an edit).
    pub fn compose(self, other: Rotation) -> Self {
        self.rotated_by(other.0 as i64)
    }

    /// Whether width and height trade places when the page is displayed.
    pub fn is_sideways(self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl From<i64> for Rotation {
    fn from(degrees: i64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.0 as i64
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Axis-aligned rectangle. The coordinate system depends on context: see
/// [`crate::coords`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two corners given in any order, as produced by a
    /// drag gesture that may run up or to the left.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Unrotated page dimensions in native page units (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Dimensions as displayed once `rotation` is applied.
    pub fn oriented(self, rotation: Rotation) -> Self {
        if rotation.is_sideways() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }
}

/// A page boundary box (`MediaBox`, `CropBox`) in absolute page-content
/// coordinates: lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// Build from the four numbers of a PDF rectangle array, in any corner order.
    pub fn from_corners(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            llx: a.min(c),
            lly: b.min(d),
            urx: a.max(c),
            ury: b.max(d),
        }
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.urx - self.llx, self.ury - self.lly)
    }
}

/// What a page entry is made of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PageKind {
    /// A page of an original document (0-based index).
    Source {
        document: DocumentId,
        page_index: usize,
    },
    /// A synthetic blank page.
    Blank { width: f64, height: f64 },
}

/// One logical page of the working document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: PageId,
    pub kind: PageKind,
    /// Delta applied on top of any rotation the source page already carries.
    pub rotation: Rotation,
    /// Crop in page-content space: bottom-left origin relative to the page's
    /// lower-left corner, unrotated, unscaled.
    pub crop: Option<Rect>,
}

impl PageEntry {
    pub fn source(id: PageId, document: DocumentId, page_index: usize) -> Self {
        Self {
            id,
            kind: PageKind::Source {
                document,
                page_index,
            },
            rotation: Rotation::NONE,
            crop: None,
        }
    }

    pub fn blank(id: PageId, size: PageSize) -> Self {
        Self {
            id,
            kind: PageKind::Blank {
                width: size.width,
                height: size.height,
            },
            rotation: Rotation::NONE,
            crop: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, PageKind::Blank { .. })
    }
}

/// The ordered entries destined for exactly one output document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputBatch {
    pub entries: Vec<PageEntry>,
}

impl OutputBatch {
    pub fn new(entries: Vec<PageEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Page geometry of a loaded source document, as reported by the doc store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Display name (usually the file name).
    pub name: String,
    /// Unrotated size of every page, in order.
    pub page_sizes: Vec<PageSize>,
    /// Rotation already stored in the file for every page, in order.
    pub rotations: Vec<Rotation>,
}

impl DocumentInfo {
    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (1/72 inch).
    pub fn page_size(&self) -> PageSize {
        match self {
            // US sizes are defined in inches; millimetre rounding would drift.
            Self::Letter => PageSize::new(612.0, 792.0),
            Self::Legal => PageSize::new(612.0, 1008.0),
            Self::Tabloid => PageSize::new(792.0, 1224.0),
            _ => {
                let (w, h) = self.dimensions_mm();
                PageSize::new(mm_to_pt(w as f64), mm_to_pt(h as f64))
            }
        }
    }
}

fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

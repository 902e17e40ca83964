// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the rendering surface and page-content space.
//
// Rendering space: origin top-left, y grows downward, multiplied by the
// display scale, and showing the page as displayed (i.e. after rotation).
//
// Page-content space: origin bottom-left, y grows upward, unscaled native
// units, and unrotated, which is what a PDF `CropBox` is expressed in.
//
// Between the two sits the "visual" frame: bottom-left origin and unscaled,
// but still rotated. For a 90° or 270° page the visual frame has the page's
// width and height swapped.

use crate::types::{PageBox, PageSize, Rect, Rotation};

/// Convert a rectangle drawn on the rendering surface into page-content space.
///
/// `page` is the unrotated page size and `rotation` the rotation the page was
/// displayed with when the rectangle was drawn. A non-positive or non-finite
/// `scale` is treated as 1.
pub fn to_page_space(rect: Rect, page: PageSize, scale: f64, rotation: Rotation) -> Rect {
    let scale = effective_scale(scale);
    let visual = page.oriented(rotation);

    let width = rect.width / scale;
    let height = rect.height / scale;
    let x = rect.x / scale;
    let y = visual.height - rect.y / scale - height;

    let a = visual_to_page(x, y, page, rotation);
    let b = visual_to_page(x + width, y + height, page, rotation);
    Rect::from_corners(a, b)
}

/// Inverse of [`to_page_space`].
pub fn to_render_space(rect: Rect, page: PageSize, scale: f64, rotation: Rotation) -> Rect {
    let scale = effective_scale(scale);
    let visual = page.oriented(rotation);

    let a = page_to_visual(rect.x, rect.y, page, rotation);
    let b = page_to_visual(rect.right(), rect.top(), page, rotation);
    let v = Rect::from_corners(a, b);

    Rect::new(
        v.x * scale,
        (visual.height - v.y - v.height) * scale,
        v.width * scale,
        v.height * scale,
    )
}

/// Map a point in the visual frame (bottom-left origin, rotated) to unrotated
/// page-content space. Rotation is clockwise, as PDF `/Rotate` is.
pub fn visual_to_page(x: f64, y: f64, page: PageSize, rotation: Rotation) -> (f64, f64) {
    match rotation.degrees() {
        90 => (page.width - y, x),
        180 => (page.width - x, page.height - y),
        270 => (y, page.height - x),
        _ => (x, y),
    }
}

/// Map a point in unrotated page-content space into the visual frame.
pub fn page_to_visual(x: f64, y: f64, page: PageSize, rotation: Rotation) -> (f64, f64) {
    match rotation.degrees() {
        90 => (y, page.width - x),
        180 => (page.width - x, page.height - y),
        270 => (page.height - y, x),
        _ => (x, y),
    }
}

/// Position a page-relative rectangle inside a page's media box.
///
/// Page entries store crops relative to the page's lower-left corner; a PDF
/// media box does not have to start at the origin. The result is clipped to
/// the media box, or `None` when nothing of the rectangle lies on the page.
pub fn place_in_box(rect: Rect, media: PageBox) -> Option<PageBox> {
    let placed = PageBox {
        llx: (media.llx + rect.x).max(media.llx),
        lly: (media.lly + rect.y).max(media.lly),
        urx: (media.llx + rect.right()).min(media.urx),
        ury: (media.lly + rect.top()).min(media.ury),
    };
    (placed.urx > placed.llx && placed.ury > placed.lly).then_some(placed)
}

fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

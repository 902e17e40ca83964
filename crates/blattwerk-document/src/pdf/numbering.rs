// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-number stamping.
//
// Numbers are placed in the frame the reader sees (after `/Rotate`) and then
// mapped back into page-content space, so a number at "bottom-right" lands
// in the displayed bottom-right corner and reads upright on rotated pages.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, instrument, warn};

use blattwerk_core::coords;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::range::parse_page_ranges;
use blattwerk_core::types::Rotation;

use super::page_tree;

/// Resource name the stamp font is registered under on every stamped page.
const FONT_RESOURCE: &[u8] = b"BwNum";

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// Where on the displayed page a number goes. Parses from `"bottom-center"`
/// style strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberPosition {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl NumberPosition {
    pub fn new(vertical: Vertical, horizontal: Horizontal) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// The same position with left and right exchanged.
    pub fn mirrored(self) -> Self {
        let horizontal = match self.horizontal {
            Horizontal::Left => Horizontal::Right,
            Horizontal::Right => Horizontal::Left,
            Horizontal::Center => Horizontal::Center,
        };
        Self { horizontal, ..self }
    }

    /// Position for the page with 1-based number `page_number`. In facing
    /// mode odd pages keep numbers on the right and even pages on the left.
    fn for_page(self, page_number: usize, facing: bool) -> Self {
        if !facing {
            return self;
        }
        let odd = page_number % 2 == 1;
        match (odd, self.horizontal) {
            (true, Horizontal::Left) | (false, Horizontal::Right) => self.mirrored(),
            _ => self,
        }
    }
}

impl Default for NumberPosition {
    fn default() -> Self {
        Self::new(Vertical::Bottom, Horizontal::Center)
    }
}

impl FromStr for NumberPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (v, h) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected <vertical>-<horizontal>, got '{s}'"))?;
        let vertical = match v.to_ascii_lowercase().as_str() {
            "top" => Vertical::Top,
            "middle" => Vertical::Middle,
            "bottom" => Vertical::Bottom,
            other => return Err(format!("unknown vertical position '{other}'")),
        };
        let horizontal = match h.to_ascii_lowercase().as_str() {
            "left" => Horizontal::Left,
            "center" => Horizontal::Center,
            "right" => Horizontal::Right,
            other => return Err(format!("unknown horizontal position '{other}'")),
        };
        Ok(Self::new(vertical, horizontal))
    }
}

impl fmt::Display for NumberPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self.vertical {
            Vertical::Top => "top",
            Vertical::Middle => "middle",
            Vertical::Bottom => "bottom",
        };
        let h = match self.horizontal {
            Horizontal::Left => "left",
            Horizontal::Center => "center",
            Horizontal::Right => "right",
        };
        write!(f, "{v}-{h}")
    }
}

/// Options for [`stamp_page_numbers`].
#[derive(Debug, Clone, PartialEq)]
pub struct NumberingOptions {
    pub position: NumberPosition,
    /// Distance from the page edge in points.
    pub margin: f64,
    /// Label text; `{n}` is replaced by the running number and `{p}` by the
    /// count of numbered pages.
    pub format: String,
    pub start_from: i64,
    /// Range expression restricting which pages get a number.
    pub pages: Option<String>,
    pub facing: bool,
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    /// `#rrggbb`.
    pub color: String,
}

impl Default for NumberingOptions {
    fn default() -> Self {
        Self {
            position: NumberPosition::default(),
            margin: 30.0,
            format: "{n}".into(),
            start_from: 1,
            pages: None,
            facing: false,
            font_size: 12.0,
            bold: false,
            italic: false,
            color: "#000000".into(),
        }
    }
}

impl NumberingOptions {
    fn label(&self, number: i64, total: usize) -> String {
        self.format
            .replace("{n}", &number.to_string())
            .replace("{p}", &total.to_string())
    }

    fn base_font(&self) -> &'static str {
        match (self.bold, self.italic) {
            (true, true) => "Helvetica-BoldOblique",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (false, false) => "Helvetica",
        }
    }
}

/// Parse `#rrggbb` into fill components in `[0, 1]`; anything else is black.
pub fn parse_color(hex: &str) -> [f32; 3] {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return [0.0; 3];
    }
    let mut rgb = [0.0f32; 3];
    for (slot, i) in rgb.iter_mut().zip([0, 2, 4]) {
        match u8::from_str_radix(&digits[i..i + 2], 16) {
            Ok(value) => *slot = value as f32 / 255.0,
            Err(_) => return [0.0; 3],
        }
    }
    rgb
}

/// Stamp page numbers onto a PDF and return the new bytes.
#[instrument(skip_all, fields(bytes_len = bytes.len(), position = %options.position))]
pub fn stamp_page_numbers(bytes: &[u8], options: &NumberingOptions) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes).map_err(|err| {
        BlattwerkError::PdfError(format!("failed to load PDF from memory: {err}"))
    })?;
    if doc.is_encrypted() {
        return Err(BlattwerkError::EncryptedDocument);
    }

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let numbered: BTreeSet<usize> = match options.pages.as_deref() {
        Some(expr) => parse_page_ranges(expr, pages.len()),
        None => (1..=pages.len()).collect(),
    };
    if numbered.is_empty() {
        warn!("no pages selected for numbering, document left unchanged");
    }

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(options.base_font().as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let color = parse_color(&options.color);

    let mut number = options.start_from;
    for (index, &page_id) in pages.iter().enumerate() {
        let page_number = index + 1;
        if !numbered.contains(&page_number) {
            continue;
        }
        let label = options.label(number, numbered.len());
        let operations = stamp_operations(&doc, page_id, page_number, &label, color, options);
        attach_stamp(&mut doc, page_id, font_id, operations)?;
        debug!(page_number, %label, "page numbered");
        number += 1;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| BlattwerkError::PdfError(format!("failed to serialise PDF: {err}")))?;
    info!(
        numbered = numbered.len(),
        output_bytes = output.len(),
        "Page numbers stamped"
    );
    Ok(output)
}

/// Content operations drawing `label` on one page.
fn stamp_operations(
    doc: &Document,
    page_id: ObjectId,
    page_number: usize,
    label: &str,
    color: [f32; 3],
    options: &NumberingOptions,
) -> Vec<Operation> {
    let visible = page_tree::crop_box(doc, page_id)
        .unwrap_or_else(|| page_tree::media_box(doc, page_id));
    let page = visible.size();
    let rotation = page_tree::rotation(doc, page_id);
    let shown = page.oriented(rotation);

    let size = options.font_size;
    let margin = options.margin;
    let text_width = label.chars().count() as f64 * AVG_GLYPH_WIDTH * size;
    let position = options.position.for_page(page_number, options.facing);

    let y = match position.vertical {
        Vertical::Top => shown.height - margin - size,
        Vertical::Middle => shown.height / 2.0,
        Vertical::Bottom => margin,
    };
    let x = match position.horizontal {
        Horizontal::Left => margin,
        Horizontal::Center => shown.width / 2.0 - text_width / 2.0,
        Horizontal::Right => shown.width - margin - text_width,
    };

    let (px, py) = coords::visual_to_page(x, y, page, rotation);
    let [a, b, c, d] = text_axes(rotation);

    let real = |v: f64| Object::Real(v as f32);
    vec![
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        Operation::new("rg", color.iter().map(|&v| Object::Real(v)).collect()),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.to_vec()), real(size)]),
        Operation::new(
            "Tm",
            vec![
                real(a),
                real(b),
                real(c),
                real(d),
                real(visible.llx + px),
                real(visible.lly + py),
            ],
        ),
        Operation::new("Tj", vec![Object::String(win_ansi(label), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Text-space axes that read upright once the page is displayed rotated.
fn text_axes(rotation: Rotation) -> [f64; 4] {
    match rotation.degrees() {
        90 => [0.0, 1.0, -1.0, 0.0],
        180 => [-1.0, 0.0, 0.0, -1.0],
        270 => [0.0, -1.0, 1.0, 0.0],
        _ => [1.0, 0.0, 0.0, 1.0],
    }
}

/// Wrap the page's existing content in `q`/`Q`, append the stamp, and make
/// the stamp font available to the page.
fn attach_stamp(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    let existing = existing_contents(doc, page_id);
    let resources = stamped_resources(doc, page_id, font_id);

    let prefix = encode_stream(doc, vec![Operation::new("q", vec![])])?;
    let stamp = encode_stream(doc, operations)?;

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(prefix));
    contents.extend(existing);
    contents.push(Object::Reference(stamp));

    let page = doc.get_dictionary_mut(page_id).map_err(|err| {
        BlattwerkError::PdfError(format!("cannot access page {page_id:?}: {err}"))
    })?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Readers concatenate a page's content streams, so each stream added here
/// is delimited by newlines on both ends.
fn encode_stream(doc: &mut Document, operations: Vec<Operation>) -> Result<ObjectId> {
    let encoded = Content { operations }
        .encode()
        .map_err(|err| BlattwerkError::PdfError(format!("cannot encode page content: {err}")))?;
    let mut bytes = Vec::with_capacity(encoded.len() + 2);
    bytes.push(b'\n');
    bytes.extend(encoded);
    bytes.push(b'\n');
    Ok(doc.add_object(Stream::new(Dictionary::new(), bytes)))
}

/// Encode text for a `WinAnsiEncoding` font; unmappable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

/// The page's content streams as a flat list of objects.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// A private copy of the page's resources with the stamp font added. Shared
/// or inherited resource dictionaries are left untouched.
fn stamped_resources(doc: &Document, page_id: ObjectId, font_id: ObjectId) -> Dictionary {
    let mut resources = page_tree::inherited(doc, page_id, b"Resources")
        .and_then(|obj| page_tree::resolve(doc, obj).ok())
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| page_tree::resolve(doc, obj).ok())
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    fonts.set(FONT_RESOURCE.to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    /// Every `Tj` label and the `Tm` operands preceding it, per page.
    fn stamps(bytes: &[u8]) -> Vec<Vec<(String, Vec<f64>)>> {
        let doc = Document::load_mem(bytes).expect("load");
        doc.get_pages()
            .into_values()
            .map(|page_id| {
                let content = doc.get_page_content(page_id).expect("content");
                let ops = Content::decode(&content).expect("decode").operations;
                let mut found = Vec::new();
                let mut matrix = Vec::new();
                for op in ops {
                    match op.operator.as_str() {
                        "Tm" => {
                            matrix = op
                                .operands
                                .iter()
                                .map(|o| o.as_float().expect("number") as f64)
                                .collect();
                        }
                        "Tj" if !matrix.is_empty() => {
                            let text = match &op.operands[0] {
                                Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
                                other => panic!("unexpected operand {other:?}"),
                            };
                            found.push((text, std::mem::take(&mut matrix)));
                        }
                        _ => {}
                    }
                }
                found
            })
            .collect()
    }

    fn close(actual: &[f64], expected: &[f64]) -> bool {
        actual.len() == expected.len()
            && actual.iter().zip(expected).all(|(a, e)| (a - e).abs() < 0.01)
    }

    #[test]
    fn numbers_every_page_by_default() {
        let out = stamp_page_numbers(&fixtures::sample_pdf(3), &NumberingOptions::default())
            .expect("stamp");
        let labels: Vec<Vec<String>> = stamps(&out)
            .into_iter()
            .map(|page| page.into_iter().map(|(label, _)| label).collect())
            .collect();
        assert_eq!(labels, vec![vec!["1"], vec!["2"], vec!["3"]]);
    }

    #[test]
    fn range_format_and_start_number() {
        let options = NumberingOptions {
            format: "Page {n} of {p}".into(),
            start_from: 5,
            pages: Some("2-3".into()),
            ..Default::default()
        };
        let out = stamp_page_numbers(&fixtures::sample_pdf(3), &options).expect("stamp");
        let pages = stamps(&out);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1][0].0, "Page 5 of 2");
        assert_eq!(pages[2][0].0, "Page 6 of 2");
    }

    #[test]
    fn bottom_right_on_upright_page() {
        let options = NumberingOptions {
            position: "bottom-right".parse().expect("position"),
            ..Default::default()
        };
        let out = stamp_page_numbers(&fixtures::sample_pdf(1), &options).expect("stamp");
        // Page 1 is 601 wide; "1" is estimated at 6pt wide.
        let (_, matrix) = &stamps(&out)[0][0];
        assert!(close(matrix, &[1.0, 0.0, 0.0, 1.0, 565.0, 30.0]), "{matrix:?}");
    }

    #[test]
    fn rotated_page_gets_rotated_text() {
        let options = NumberingOptions {
            position: "bottom-left".parse().expect("position"),
            ..Default::default()
        };
        let out = stamp_page_numbers(&fixtures::sample_pdf_with_rotations(&[90]), &options)
            .expect("stamp");
        // Displayed bottom-left of a 601x800 page turned 90° clockwise is
        // the page's lower-right corner.
        let (_, matrix) = &stamps(&out)[0][0];
        assert!(close(matrix, &[0.0, 1.0, -1.0, 0.0, 571.0, 30.0]), "{matrix:?}");
    }

    #[test]
    fn facing_pages_mirror_outer_edge() {
        let options = NumberingOptions {
            position: "bottom-right".parse().expect("position"),
            facing: true,
            ..Default::default()
        };
        let out = stamp_page_numbers(&fixtures::sample_pdf(2), &options).expect("stamp");
        let pages = stamps(&out);
        assert!(close(&pages[0][0].1[4..], &[565.0, 30.0]));
        assert!(close(&pages[1][0].1[4..], &[30.0, 30.0]));
    }

    #[test]
    fn original_content_is_preserved_and_isolated() {
        let out = stamp_page_numbers(&fixtures::sample_pdf(1), &NumberingOptions::default())
            .expect("stamp");
        let doc = Document::load_mem(&out).expect("load");
        let page_id = doc.get_pages().into_values().next().expect("page");
        let ops = Content::decode(&doc.get_page_content(page_id).expect("content"))
            .expect("decode")
            .operations;
        assert_eq!(ops.first().map(|o| o.operator.as_str()), Some("q"));
        let texts: Vec<String> = ops
            .iter()
            .filter(|o| o.operator == "Tj")
            .filter_map(|o| match &o.operands[0] {
                Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Page 1", "1"]);

        let known = ["q", "Q", "BT", "ET", "Tf", "Td", "Tj", "Tm", "rg"];
        assert!(ops.iter().all(|o| known.contains(&o.operator.as_str())));
        let depth = ops.iter().try_fold(0i32, |depth, o| match o.operator.as_str() {
            "q" => Some(depth + 1),
            "Q" if depth > 0 => Some(depth - 1),
            "Q" => None,
            _ => Some(depth),
        });
        assert_eq!(depth, Some(0));
    }

    #[test]
    fn labels_are_written_in_win_ansi() {
        let options = NumberingOptions {
            format: "Seite {n} – {p} · ✓".into(),
            ..Default::default()
        };
        let out = stamp_page_numbers(&fixtures::sample_pdf(1), &options).expect("stamp");
        let doc = Document::load_mem(&out).expect("load");
        let page_id = doc.get_pages().into_values().next().expect("page");
        let ops = Content::decode(&doc.get_page_content(page_id).expect("content"))
            .expect("decode")
            .operations;
        let label = ops
            .iter()
            .filter(|o| o.operator == "Tj")
            .filter_map(|o| o.operands[0].as_str().ok())
            .last()
            .expect("stamp label");
        assert_eq!(label, b"Seite 1 \x96 1 \xb7 ?");
    }

    #[test]
    fn win_ansi_mapping() {
        assert_eq!(win_ansi("Aé€—"), vec![b'A', 0xe9, 0x80, 0x97]);
        assert_eq!(win_ansi("日\u{85}"), b"??".to_vec());
    }

    #[test]
    fn garbage_input_is_rejected() {
        let err = stamp_page_numbers(b"nope", &NumberingOptions::default()).expect_err("fail");
        assert!(matches!(err, BlattwerkError::PdfError(_)));
    }

    #[test]
    fn color_parsing() {
        assert_eq!(parse_color("#ff0000"), [1.0, 0.0, 0.0]);
        assert_eq!(parse_color("00ff00"), [0.0, 1.0, 0.0]);
        assert_eq!(parse_color("#12"), [0.0; 3]);
        assert_eq!(parse_color("#gg0000"), [0.0; 3]);
    }

    #[test]
    fn position_parsing_and_mirroring() {
        let p: NumberPosition = "Top-Left".parse().expect("parse");
        assert_eq!(p, NumberPosition::new(Vertical::Top, Horizontal::Left));
        assert_eq!(p.mirrored().to_string(), "top-right");
        assert_eq!(NumberPosition::default().mirrored(), NumberPosition::default());
        assert!("sideways".parse::<NumberPosition>().is_err());
        assert!("bottom-middle".parse::<NumberPosition>().is_err());
    }
}

//! Text lines with font sizes, read from PDF content streams.
//!
//! The interpreter follows the text-state operators, the graphics-state stack
//! and the current transformation matrix, and steps into Form XObjects. Glyph
//! widths are approximated from the font size, which is good enough to tell
//! word gaps from kerning.

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// One visual line of text and the largest font size used on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }
}

/// Spans whose baselines differ by less than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph width as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Horizontal gap (device units) that separates two words.
const MIN_WORD_GAP: f32 = 1.5;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

type Matrix = [f32; 6];

const IDENTITY_MATRIX: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m × n` for PDF's row-vector affine matrices.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn number(obj: &Object) -> Option<f32> {
    obj.as_float().ok()
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    let vals: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
    match vals[..] {
        [a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct Span {
    text: String,
    x: f32,
    y: f32,
    width: f32,
    font_size: f32,
}

/// The parts of the graphics state that `q`/`Q` save and restore.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f32,
    leading: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY_MATRIX,
            font: None,
            font_size: 0.0,
            leading: 0.0,
        }
    }
}

/// Font encodings and Form XObjects visible to one content stream.
#[derive(Default)]
struct Resources<'a> {
    encodings: BTreeMap<Vec<u8>, Encoding<'a>>,
    forms: BTreeMap<Vec<u8>, &'a Stream>,
}

impl<'a> Resources<'a> {
    /// Collect from resource dictionaries; earlier ones win on name clashes.
    fn from_dicts(doc: &'a Document, dicts: &[&'a Dictionary]) -> Self {
        let mut resources = Self::default();
        for &dict in dicts {
            if let Ok(fonts) = dict.get_deref(b"Font", doc).and_then(Object::as_dict) {
                for (name, value) in fonts.iter() {
                    if resources.encodings.contains_key(name) {
                        continue;
                    }
                    let Ok(font) = doc.dereference(value).and_then(|(_, obj)| obj.as_dict()) else {
                        continue;
                    };
                    if !font.type_is(b"Font") {
                        continue;
                    }
                    match font.get_font_encoding(doc) {
                        Ok(encoding) => {
                            resources.encodings.insert(name.clone(), encoding);
                        }
                        Err(e) => debug!(
                            font = %String::from_utf8_lossy(name),
                            "no usable font encoding: {e}"
                        ),
                    }
                }
            }
            if let Ok(xobjects) = dict.get_deref(b"XObject", doc).and_then(Object::as_dict) {
                for (name, value) in xobjects.iter() {
                    if let Ok(stream) = doc.dereference(value).and_then(|(_, obj)| obj.as_stream())
                        && stream.dict.get(b"Subtype").and_then(Object::as_name).ok()
                            == Some(b"Form".as_slice())
                    {
                        resources.forms.entry(name.clone()).or_insert(stream);
                    }
                }
            }
        }
        resources
    }

    /// The page's own resources first, then those inherited from the tree.
    fn for_page(doc: &'a Document, page_id: ObjectId) -> Self {
        let Ok((own, inherited)) = doc.get_page_resources(page_id) else {
            return Self::default();
        };
        let mut dicts: Vec<&Dictionary> = own.into_iter().collect();
        dicts.extend(inherited.into_iter().filter_map(|id| doc.get_dictionary(id).ok()));
        Self::from_dicts(doc, &dicts)
    }
}

/// Decode a PDF string operand without font information: UTF-16BE when it
/// carries a BOM, otherwise byte-per-char (PDFDocEncoding is close enough to
/// Latin-1 for prose).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

struct Interpreter<'a> {
    doc: Option<&'a Document>,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    spans: Vec<Span>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: Option<&'a Document>) -> Self {
        Self {
            doc,
            state: GraphicsState::default(),
            saved: Vec::new(),
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            spans: Vec::new(),
        }
    }

    /// Text space to device space.
    fn rendering_matrix(&self) -> Matrix {
        multiply(&self.text_matrix, &self.state.ctm)
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn decode(&self, bytes: &[u8], resources: &Resources) -> String {
        self.state
            .font
            .as_ref()
            .and_then(|font| resources.encodings.get(font))
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| decode_pdf_string(bytes))
    }

    fn show_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let rm = self.rendering_matrix();
        let scale = (rm[1].powi(2) + rm[3].powi(2)).sqrt();
        let font_size = (self.state.font_size * scale).abs();

        let dx = text.chars().count() as f32 * self.state.font_size * APPROX_CHAR_WIDTH_RATIO;
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];

        self.spans.push(Span {
            text,
            x: rm[4],
            y: rm[5],
            width: dx * rm[0],
            font_size,
        });
    }

    fn show_string(&mut self, operand: Option<&Object>, resources: &Resources) {
        if let Some(Object::String(bytes, _)) = operand {
            let text = self.decode(bytes, resources);
            self.show_text(text);
        }
    }

    /// `TJ` arrays mix strings with kerning offsets in thousandths of a unit.
    /// Large negative offsets are word gaps.
    fn show_array(&mut self, items: &[Object], resources: &Resources) {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(bytes, resources)),
                other => {
                    if let Some(adj) = number(other)
                        && -adj / 1000.0 > APPROX_CHAR_WIDTH_RATIO * 0.3
                        && !text.is_empty()
                        && !text.ends_with(' ')
                    {
                        text.push(' ');
                    }
                }
            }
        }
        self.show_text(text);
    }

    fn run(&mut self, operations: &[Operation], resources: &Resources<'a>, depth: usize) {
        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.saved.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.saved.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        self.state.ctm = multiply(&m, &self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = IDENTITY_MATRIX;
                    self.line_matrix = IDENTITY_MATRIX;
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.state.font = Some(name.clone());
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        self.state.font_size = size;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            self.state.leading = -ty;
                        }
                        self.translate_line(tx, ty);
                    }
                }
                "T*" => self.translate_line(0.0, -self.state.leading),
                "TL" => {
                    if let Some(v) = operands.first().and_then(number) {
                        self.state.leading = v;
                    }
                }
                "Tj" => self.show_string(operands.first(), resources),
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_array(items, resources);
                    }
                }
                "'" => {
                    self.translate_line(0.0, -self.state.leading);
                    self.show_string(operands.first(), resources);
                }
                "\"" => {
                    self.translate_line(0.0, -self.state.leading);
                    self.show_string(operands.get(2), resources);
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first()
                        && let Some(&form) = resources.forms.get(name)
                    {
                        self.run_form(form, resources, depth);
                    }
                }
                _ => {}
            }
        }
    }

    /// Interpret a Form XObject in place, isolated from the caller's state.
    fn run_form(&mut self, form: &'a Stream, parent: &Resources<'a>, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            debug!(depth, "form XObjects nested too deeply; skipping");
            return;
        }
        let content = match form.get_plain_content().and_then(|bytes| Content::decode(&bytes)) {
            Ok(content) => content,
            Err(e) => {
                debug!("skipping unreadable form XObject: {e}");
                return;
            }
        };

        let saved_state = self.state.clone();
        let saved_depth = self.saved.len();
        let (text_matrix, line_matrix) = (self.text_matrix, self.line_matrix);

        if let Ok(Object::Array(values)) = form.dict.get(b"Matrix")
            && let Some(m) = matrix_operand(values)
        {
            self.state.ctm = multiply(&m, &self.state.ctm);
        }
        let own = self.doc.and_then(|doc| {
            form.dict
                .get_deref(b"Resources", doc)
                .and_then(Object::as_dict)
                .ok()
                .map(|dict| Resources::from_dicts(doc, &[dict]))
        });
        self.run(&content.operations, own.as_ref().unwrap_or(parent), depth + 1);

        self.state = saved_state;
        self.saved.truncate(saved_depth);
        self.text_matrix = text_matrix;
        self.line_matrix = line_matrix;
    }
}

fn push_line(text: &str, font_size: f32, lines: &mut Vec<TextLine>) {
    let text = text.trim();
    if !text.is_empty() {
        lines.push(TextLine::new(text, font_size));
    }
}

fn group_spans(spans: Vec<Span>) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_size: f32 = 0.0;
    let mut prev: Option<Span> = None;

    for span in spans {
        match &prev {
            Some(p) if (p.y - span.y).abs() < Y_TOLERANCE => {
                let gap = span.x - (p.x + p.width);
                if gap > MIN_WORD_GAP && !current.ends_with(' ') && !span.text.starts_with(' ') {
                    current.push(' ');
                }
            }
            Some(_) => {
                push_line(&current, current_size, &mut lines);
                current.clear();
                current_size = 0.0;
            }
            None => {}
        }
        current.push_str(&span.text);
        current_size = current_size.max(span.font_size);
        prev = Some(span);
    }
    push_line(&current, current_size, &mut lines);
    lines
}

/// Group a page's operations into text lines, in content-stream order.
///
/// Without a document there are no fonts or XObjects to look up, so strings
/// are decoded by [`decode_pdf_string`] and `Do` is ignored.
pub fn lines_from_operations(operations: &[Operation]) -> Vec<TextLine> {
    let mut interpreter = Interpreter::new(None);
    interpreter.run(operations, &Resources::default(), 0);
    group_spans(interpreter.spans)
}

fn page_lines(doc: &Document, page_id: ObjectId, operations: &[Operation]) -> Vec<TextLine> {
    let resources = Resources::for_page(doc, page_id);
    let mut interpreter = Interpreter::new(Some(doc));
    interpreter.run(operations, &resources, 0);
    group_spans(interpreter.spans)
}

/// Read every page of a PDF into text lines.
///
/// A page whose content stream cannot be read is skipped with a warning.
pub fn extract_lines(path: &Path, diagnostics: &mut Diagnostics) -> Result<Vec<TextLine>> {
    let doc = Document::load(path)?;
    let mut lines = Vec::new();

    for (page_num, page_id) in doc.get_pages() {
        let content = match doc
            .get_page_content(page_id)
            .and_then(|bytes| Content::decode(&bytes))
        {
            Ok(content) => content,
            Err(e) => {
                diagnostics.warn(format!("skipping unreadable PDF page {page_num}: {e}"));
                continue;
            }
        };
        let found = page_lines(&doc, page_id, &content.operations);
        debug!(page = page_num, lines = found.len(), "read PDF page");
        lines.extend(found);
    }
    Ok(lines)
}

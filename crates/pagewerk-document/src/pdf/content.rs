// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream scanner.
//
// Walks decoded operations tracking the graphics and text state just far
// enough to place text runs, paths, and image draws on the page. Glyph widths
// are approximated at half an em: no font programs are parsed, so boxes are
// estimates that err on the wide side for narrow fonts.

use std::collections::BTreeSet;

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use pagewerk_core::types::Rect;

/// Assumed advance width of every glyph, in em.
pub const GLYPH_WIDTH_EM: f32 = 0.5;
const DESCENT_EM: f32 = -0.2;
const ASCENT_EM: f32 = 0.8;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m × n`: apply `m` first, then `n`.
pub fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

pub fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn translate(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Bounding box of the rectangle `(x0, y0)-(x1, y1)` after transformation.
fn transformed_box(m: &Matrix, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Rect> {
    Rect::bounding(&[
        transform_point(m, x0, y0),
        transform_point(m, x1, y0),
        transform_point(m, x0, y1),
        transform_point(m, x1, y1),
    ])
}

// ---------------------------------------------------------------------------
// Scan results
// ---------------------------------------------------------------------------

/// Text drawn by one text-showing operator.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Index of the `Tj`, `TJ`, `'`, or `"` operation.
    pub op_index: usize,
    /// One char per string byte.
    pub text: String,
    /// What [`ContentScan::page_text`] puts between the previous run and
    /// this one: `""` when the text continues the same line, `" "` across a
    /// gap wider than a glyph, `"\n"` for a new line. Empty for the first run.
    pub separator: &'static str,
    /// Page-space box of each glyph, parallel to `text.chars()`.
    pub glyph_boxes: Vec<Rect>,
    pub font_size: f32,
    pub char_spacing: f32,
    pub word_spacing: f32,
    pub invisible: bool,
}

impl TextRun {
    pub fn bbox(&self) -> Option<Rect> {
        self.glyph_boxes.iter().copied().reduce(|a, b| a.union(&b))
    }
}

/// A path from its first construction operator to its painting operator.
#[derive(Debug, Clone)]
pub struct PathObject {
    pub start: usize,
    /// Index of the painting (or `n`) operator.
    pub end: usize,
    pub bbox: Option<Rect>,
    pub painted: bool,
}

/// An image or form XObject placement (`Do`) or an inline image.
#[derive(Debug, Clone)]
pub struct ImageDraw {
    pub op_index: usize,
    pub bbox: Option<Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentScan {
    pub runs: Vec<TextRun>,
    pub paths: Vec<PathObject>,
    pub images: Vec<ImageDraw>,
    /// True when anything visible is drawn.
    pub has_ink: bool,
}

// ---------------------------------------------------------------------------
// State tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill_white: bool,
    stroke_white: bool,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    render_mode: i64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            fill_white: false,
            stroke_white: false,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }
}

enum ShowItem<'a> {
    Glyphs(&'a [u8]),
    Adjust(f32),
}

struct Scanner {
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path_start: Option<usize>,
    path_points: Vec<(f32, f32)>,
    /// Page-space pen position after the previous run, and its glyph count.
    last_pen: Option<((f32, f32), usize)>,
    scan: ContentScan,
}

fn operand(op: &Operation, index: usize) -> f32 {
    op.operands
        .get(index)
        .and_then(|o| o.as_float().ok())
        .unwrap_or(0.0)
}

fn numbers(op: &Operation) -> Option<Vec<f32>> {
    op.operands.iter().map(|o| o.as_float().ok()).collect()
}

/// Whether a colour operator's operands describe white.
fn is_white(operator: &str, op: &Operation) -> bool {
    let Some(values) = numbers(op) else {
        return false;
    };
    match (operator, values.as_slice()) {
        ("g" | "G", [gray]) => *gray >= 1.0,
        ("rg" | "RG", [r, g, b]) => *r >= 1.0 && *g >= 1.0 && *b >= 1.0,
        ("k" | "K", [c, m, y, k]) => *c <= 0.0 && *m <= 0.0 && *y <= 0.0 && *k <= 0.0,
        ("sc" | "scn" | "SC" | "SCN", [gray]) => *gray >= 1.0,
        ("sc" | "scn" | "SC" | "SCN", [r, g, b]) => *r >= 1.0 && *g >= 1.0 && *b >= 1.0,
        ("sc" | "scn" | "SC" | "SCN", [c, m, y, k]) => {
            *c <= 0.0 && *m <= 0.0 && *y <= 0.0 && *k <= 0.0
        }
        _ => false,
    }
}

impl Scanner {
    fn new() -> Self {
        Self {
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            path_start: None,
            path_points: Vec::new(),
            last_pen: None,
            scan: ContentScan::default(),
        }
    }

    fn add_path_points(&mut self, index: usize, points: &[(f32, f32)]) {
        self.path_start.get_or_insert(index);
        let ctm = self.state.ctm;
        self.path_points
            .extend(points.iter().map(|&(x, y)| transform_point(&ctm, x, y)));
    }

    fn finish_path(&mut self, index: usize, operator: &str) {
        let Some(start) = self.path_start.take() else {
            return;
        };
        let bbox = Rect::bounding(&self.path_points);
        self.path_points.clear();

        let fills = matches!(operator, "f" | "F" | "f*" | "B" | "B*" | "b" | "b*");
        let strokes = matches!(operator, "S" | "s" | "B" | "B*" | "b" | "b*");
        if (fills && !self.state.fill_white) || (strokes && !self.state.stroke_white) {
            self.scan.has_ink = true;
        }
        self.scan.paths.push(PathObject {
            start,
            end: index,
            bbox,
            painted: operator != "n",
        });
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translate(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Glyph space scaled to one em, then placed on the page.
    fn rendering_matrix(&self) -> Matrix {
        let st = &self.state;
        multiply(
            &[st.font_size * st.horizontal_scale, 0.0, 0.0, st.font_size, 0.0, st.rise],
            &multiply(&self.text_matrix, &st.ctm),
        )
    }

    /// Separator for a run about to start at the current pen position. The
    /// offset from the previous run's end is measured in ems along and across
    /// the current baseline.
    fn separator(&self) -> &'static str {
        let Some((previous, glyphs)) = self.last_pen else {
            return "";
        };
        let m = self.rendering_matrix();
        let (x, y) = transform_point(&m, 0.0, 0.0);
        let (dx, dy) = (x - previous.0, y - previous.1);
        let det = m[0] * m[3] - m[1] * m[2];
        if det.abs() < f32::EPSILON {
            return "\n";
        }
        let along = (dx * m[3] - dy * m[2]) / det;
        let across = (m[0] * dy - m[1] * dx) / det;

        if across.abs() > 0.5 || along < -(glyphs as f32 + 1.0) * GLYPH_WIDTH_EM {
            "\n"
        } else if along > GLYPH_WIDTH_EM {
            " "
        } else {
            ""
        }
    }

    fn show(&mut self, index: usize, items: &[ShowItem<'_>]) {
        let separator = self.separator();
        let st = &self.state;
        let (fs, th) = (st.font_size, st.horizontal_scale);
        let mut text = String::new();
        let mut glyph_boxes = Vec::new();

        for item in items {
            match item {
                ShowItem::Glyphs(bytes) => {
                    for &byte in *bytes {
                        let rendering = multiply(
                            &[fs * th, 0.0, 0.0, fs, 0.0, st.rise],
                            &multiply(&self.text_matrix, &st.ctm),
                        );
                        let glyph = transformed_box(&rendering, 0.0, DESCENT_EM, GLYPH_WIDTH_EM, ASCENT_EM)
                            .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
                        text.push(byte as char);
                        glyph_boxes.push(glyph);

                        let spacing = st.char_spacing + if byte == b' ' { st.word_spacing } else { 0.0 };
                        let advance = (GLYPH_WIDTH_EM * fs + spacing) * th;
                        self.text_matrix = multiply(&translate(advance, 0.0), &self.text_matrix);
                    }
                }
                ShowItem::Adjust(amount) => {
                    let shift = -amount / 1000.0 * fs * th;
                    self.text_matrix = multiply(&translate(shift, 0.0), &self.text_matrix);
                }
            }
        }

        let invisible = match st.render_mode {
            3 | 7 => true,
            1 | 5 => st.stroke_white,
            _ => st.fill_white,
        };
        if !invisible && text.chars().any(|c| !c.is_whitespace()) {
            self.scan.has_ink = true;
        }
        let pen = transform_point(&self.rendering_matrix(), 0.0, 0.0);
        self.last_pen = Some((pen, glyph_boxes.len()));
        self.scan.runs.push(TextRun {
            op_index: index,
            text,
            separator,
            glyph_boxes,
            font_size: fs,
            char_spacing: st.char_spacing,
            word_spacing: st.word_spacing,
            invisible,
        });
    }

    fn step(&mut self, index: usize, op: &Operation) {
        let operator = op.operator.as_str();
        match operator {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(&[a, b, c, d, e, f]) = numbers(op).as_deref() {
                    self.state.ctm = multiply(&[a, b, c, d, e, f], &self.state.ctm);
                }
            }

            // Colour
            "g" | "rg" | "k" | "sc" | "scn" => self.state.fill_white = is_white(operator, op),
            "G" | "RG" | "K" | "SC" | "SCN" => self.state.stroke_white = is_white(operator, op),
            "cs" => self.state.fill_white = false,
            "CS" => self.state.stroke_white = false,

            // Path construction
            "m" | "l" => self.add_path_points(index, &[(operand(op, 0), operand(op, 1))]),
            "c" => self.add_path_points(
                index,
                &[
                    (operand(op, 0), operand(op, 1)),
                    (operand(op, 2), operand(op, 3)),
                    (operand(op, 4), operand(op, 5)),
                ],
            ),
            "v" | "y" => self.add_path_points(
                index,
                &[(operand(op, 0), operand(op, 1)), (operand(op, 2), operand(op, 3))],
            ),
            "re" => {
                let (x, y, w, h) = (operand(op, 0), operand(op, 1), operand(op, 2), operand(op, 3));
                self.add_path_points(index, &[(x, y), (x + w, y), (x, y + h), (x + w, y + h)]);
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => {
                self.finish_path(index, operator)
            }

            // XObjects, inline images, shadings
            "Do" | "BI" => {
                self.scan.has_ink = true;
                let bbox = transformed_box(&self.state.ctm, 0.0, 0.0, 1.0, 1.0);
                self.scan.images.push(ImageDraw { op_index: index, bbox });
            }
            "sh" => self.scan.has_ink = true,

            // Text objects and state
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => self.state.font_size = operand(op, 1),
            "Tc" => self.state.char_spacing = operand(op, 0),
            "Tw" => self.state.word_spacing = operand(op, 0),
            "Tz" => self.state.horizontal_scale = operand(op, 0) / 100.0,
            "TL" => self.state.leading = operand(op, 0),
            "Ts" => self.state.rise = operand(op, 0),
            "Tr" => {
                self.state.render_mode = op.operands.first().and_then(|o| o.as_i64().ok()).unwrap_or(0)
            }
            "Td" => self.next_line(operand(op, 0), operand(op, 1)),
            "TD" => {
                self.state.leading = -operand(op, 1);
                self.next_line(operand(op, 0), operand(op, 1));
            }
            "Tm" => {
                if let Some(&[a, b, c, d, e, f]) = numbers(op).as_deref() {
                    self.line_matrix = [a, b, c, d, e, f];
                    self.text_matrix = self.line_matrix;
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),

            // Text showing
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(index, &[ShowItem::Glyphs(bytes)]);
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(index, &[ShowItem::Glyphs(bytes)]);
                }
            }
            "\"" => {
                self.state.word_spacing = operand(op, 0);
                self.state.char_spacing = operand(op, 1);
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show(index, &[ShowItem::Glyphs(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Object::Array(elements)) = op.operands.first() {
                    let items: Vec<ShowItem<'_>> = elements
                        .iter()
                        .filter_map(|element| match element {
                            Object::String(bytes, _) => Some(ShowItem::Glyphs(bytes)),
                            other => other.as_float().ok().map(ShowItem::Adjust),
                        })
                        .collect();
                    self.show(index, &items);
                }
            }
            _ => {}
        }
    }
}

impl ContentScan {
    pub fn scan(operations: &[Operation]) -> Self {
        let mut scanner = Scanner::new();
        for (index, op) in operations.iter().enumerate() {
            scanner.step(index, op);
        }
        scanner.scan
    }

    /// Run texts, each preceded by its separator.
    pub fn page_text(&self) -> String {
        let mut text = String::new();
        for run in &self.runs {
            text.push_str(run.separator);
            text.push_str(&run.text);
        }
        text
    }

    /// Char offset of each run's first char within [`Self::page_text`].
    pub fn run_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.runs.len());
        let mut next = 0;
        for run in &self.runs {
            next += run.separator.len();
            offsets.push(next);
            next += run.glyph_boxes.len();
        }
        offsets
    }
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Rewrite a text-showing operation without the glyphs at `removed` (indices
/// into the run's text). Each removed glyph becomes a `TJ` displacement of
/// its estimated advance so the remaining glyphs stay where they were.
pub fn remove_glyphs(op: &Operation, run: &TextRun, removed: &BTreeSet<usize>) -> Vec<Operation> {
    let elements: Vec<Object> = match op.operator.as_str() {
        "Tj" | "'" => op.operands.first().cloned().into_iter().collect(),
        "\"" => op.operands.get(2).cloned().into_iter().collect(),
        "TJ" => match op.operands.first() {
            Some(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => return vec![op.clone()],
    };

    let displacement = |byte: u8| -> f32 {
        if run.font_size == 0.0 {
            return 0.0;
        }
        let spacing = run.char_spacing + if byte == b' ' { run.word_spacing } else { 0.0 };
        -(GLYPH_WIDTH_EM * run.font_size + spacing) * 1000.0 / run.font_size
    };

    let mut out: Vec<Object> = Vec::new();
    let mut glyph = 0usize;
    let mut pending = 0.0f32;
    for element in elements {
        match element {
            Object::String(bytes, format) => {
                let mut kept = Vec::new();
                for byte in bytes {
                    if removed.contains(&glyph) {
                        flush_string(&mut out, &mut kept, format);
                        pending += displacement(byte);
                    } else {
                        flush_adjust(&mut out, &mut pending);
                        kept.push(byte);
                    }
                    glyph += 1;
                }
                flush_string(&mut out, &mut kept, format);
            }
            other => {
                flush_adjust(&mut out, &mut pending);
                out.push(other);
            }
        }
    }
    flush_adjust(&mut out, &mut pending);

    let show = Operation::new("TJ", vec![Object::Array(out)]);
    match op.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), show],
        "\"" => {
            let word = op.operands.first().cloned().unwrap_or(Object::Integer(0));
            let chars = op.operands.get(1).cloned().unwrap_or(Object::Integer(0));
            vec![
                Operation::new("Tw", vec![word]),
                Operation::new("Tc", vec![chars]),
                Operation::new("T*", vec![]),
                show,
            ]
        }
        _ => vec![show],
    }
}

fn flush_string(out: &mut Vec<Object>, kept: &mut Vec<u8>, format: StringFormat) {
    if !kept.is_empty() {
        out.push(Object::String(std::mem::take(kept), format));
    }
}

fn flush_adjust(out: &mut Vec<Object>, pending: &mut f32) {
    if *pending != 0.0 {
        out.push(Object::Real(*pending));
        *pending = 0.0;
    }
}

/// Approximate serialized size of a list of operations.
pub fn encoded_len(operations: &[Operation]) -> usize {
    operations
        .iter()
        .map(|op| {
            op.operator.len() + 1 + op.operands.iter().map(|o| object_len(o) + 1).sum::<usize>()
        })
        .sum()
}

fn object_len(object: &Object) -> usize {
    match object {
        Object::Name(name) => name.len() + 1,
        Object::String(bytes, StringFormat::Hexadecimal) => bytes.len() * 2 + 2,
        Object::String(bytes, _) => bytes.len() + 2,
        Object::Array(items) => 2 + items.iter().map(|o| object_len(o) + 1).sum::<usize>(),
        Object::Dictionary(dict) => {
            4 + dict.iter().map(|(k, v)| k.len() + 2 + object_len(v)).sum::<usize>()
        }
        Object::Stream(stream) => stream.content.len() + 32,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;

    fn ops(source: &str) -> Vec<Operation> {
        Content::decode(source.as_bytes()).unwrap().operations
    }

    #[test]
    fn text_runs_are_placed_by_the_text_matrix() {
        let scan = ContentScan::scan(&ops("BT /F1 10 Tf 100 700 Td (Hello) Tj ET"));
        assert_eq!(scan.runs.len(), 1);
        let run = &scan.runs[0];
        assert_eq!(run.text, "Hello");
        let bbox = run.bbox().unwrap();
        assert!((bbox.x - 100.0).abs() < 0.01);
        // Five glyphs at half an em of 10pt.
        assert!((bbox.width - 25.0).abs() < 0.01);
        assert!((bbox.y - 698.0).abs() < 0.01);
        assert!(scan.has_ink);
    }

    #[test]
    fn ctm_and_tj_adjustments_move_glyphs() {
        let scan = ContentScan::scan(&ops(
            "q 2 0 0 2 0 0 cm BT /F1 10 Tf 10 10 Td [(A) -1000 (B)] TJ ET Q",
        ));
        let run = &scan.runs[0];
        assert_eq!(run.text, "AB");
        // A at x = 20, advance 5, adjust 10, scaled by 2.
        assert!((run.glyph_boxes[0].x - 20.0).abs() < 0.01);
        assert!((run.glyph_boxes[1].x - 50.0).abs() < 0.01);
    }

    #[test]
    fn quote_operators_move_to_the_next_line() {
        let scan = ContentScan::scan(&ops("BT /F1 12 Tf 14 TL 72 720 Td (one) Tj (two) ' ET"));
        assert_eq!(scan.page_text(), "one\ntwo");
        assert!((scan.runs[1].glyph_boxes[0].y - (706.0 - 2.4)).abs() < 0.01);
        assert_eq!(scan.run_offsets(), vec![0, 4]);
    }

    #[test]
    fn runs_on_one_baseline_join_into_one_line() {
        let scan = ContentScan::scan(&ops(
            "BT /F1 12 Tf 72 700 Td (Jo) Tj (hn) Tj 40 0 Td (Smith) Tj 0 -14 Td (next) Tj ET",
        ));
        assert_eq!(scan.page_text(), "John Smith\nnext");
        assert_eq!(scan.run_offsets(), vec![0, 2, 5, 11]);
        let separators: Vec<&str> = scan.runs.iter().map(|run| run.separator).collect();
        assert_eq!(separators, ["", "", " ", "\n"]);
    }

    #[test]
    fn a_new_text_object_on_the_same_baseline_continues_the_line() {
        let scan = ContentScan::scan(&ops(
            "BT /F1 10 Tf 100 500 Td (ab) Tj ET BT /F1 10 Tf 110 500 Td (cd) Tj ET BT /F1 10 Tf 100 480 Td (ef) Tj ET",
        ));
        assert_eq!(scan.page_text(), "abcd\nef");
    }

    #[test]
    fn white_fills_and_invisible_text_are_not_ink() {
        assert!(!ContentScan::scan(&ops("1 g 0 0 612 792 re f")).has_ink);
        assert!(!ContentScan::scan(&ops("BT 3 Tr /F1 12 Tf (hidden) Tj ET")).has_ink);
        assert!(!ContentScan::scan(&ops("BT /F1 12 Tf (   ) Tj ET")).has_ink);
        assert!(ContentScan::scan(&ops("0 0 1 rg 0 0 10 10 re f")).has_ink);
        assert!(ContentScan::scan(&ops("q 100 0 0 100 0 0 cm /Im0 Do Q")).has_ink);
        assert!(!ContentScan::scan(&[]).has_ink);
    }

    #[test]
    fn paths_span_construction_to_paint() {
        let scan = ContentScan::scan(&ops("q 10 10 m 20 20 l S 5 5 10 10 re W n Q"));
        assert_eq!(scan.paths.len(), 2);
        assert_eq!((scan.paths[0].start, scan.paths[0].end), (1, 3));
        assert!(scan.paths[0].painted);
        assert!(!scan.paths[1].painted);
        assert_eq!(scan.paths[1].bbox, Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn image_placement_uses_the_ctm() {
        let scan = ContentScan::scan(&ops("q 200 0 0 100 50 60 cm /Im0 Do Q"));
        assert_eq!(scan.images[0].bbox, Some(Rect::new(50.0, 60.0, 200.0, 100.0)));
    }

    #[test]
    fn removing_glyphs_keeps_the_rest_in_place() {
        let content = ops("BT /F1 10 Tf 0 0 Td (SECRET code) Tj ET");
        let scan = ContentScan::scan(&content);
        let run = &scan.runs[0];
        let removed: BTreeSet<usize> = (0..6).collect();

        let rewritten = remove_glyphs(&content[run.op_index], run, &removed);
        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].operator, "TJ");

        let mut patched = content.clone();
        patched.splice(run.op_index..=run.op_index, rewritten);
        let rescanned = ContentScan::scan(&patched);
        let after = &rescanned.runs[0];
        assert_eq!(after.text, " code");
        // The space that followed "SECRET" has not moved.
        assert!((after.glyph_boxes[0].x - run.glyph_boxes[6].x).abs() < 0.01);
    }

    #[test]
    fn removing_glyphs_from_a_double_quote_keeps_spacing_state() {
        let content = ops("BT /F1 10 Tf 12 TL 2 1 (abc) \" ET");
        let scan = ContentScan::scan(&content);
        let run = &scan.runs[0];
        let rewritten = remove_glyphs(&content[run.op_index], run, &BTreeSet::from([1]));
        let operators: Vec<&str> = rewritten.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["Tw", "Tc", "T*", "TJ"]);
    }

    #[test]
    fn encoded_len_is_roughly_the_source_length() {
        let source = "BT /F1 12 Tf 72 720 Td (Hello world) Tj ET";
        let estimate = encoded_len(&ops(source));
        assert!(estimate >= source.len() / 2 && estimate <= source.len() * 3);
    }
}

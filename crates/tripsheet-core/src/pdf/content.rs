//! Content-stream interpreter.
//!
//! Walks the operators of a page and keeps just enough graphics and text
//! state to place every shown string on the page and to collect the ruled
//! lines that tables are drawn with. Coordinates are PDF user space after
//! the current transformation matrix: origin bottom-left, y growing upwards.

use lopdf::content::Operation;
use lopdf::Object;
use std::collections::HashMap;
use tracing::trace;

use super::font::{number, FontMetrics};

/// A run of text shown by one string operand.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    /// Origin of the first glyph (baseline).
    pub x: f32,
    pub y: f32,
    /// Advance width of the whole run.
    pub width: f32,
    pub font_size: f32,
}

/// A straight stroke or rectangle edge, with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Thickness below which a segment counts as axis-aligned.
const AXIS_TOLERANCE: f32 = 1.0;

impl Segment {
    pub fn new(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x0: a.0.min(b.0),
            y0: a.1.min(b.1),
            x1: a.0.max(b.0),
            y1: a.1.max(b.1),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 - self.y0 <= AXIS_TOLERANCE && self.x1 - self.x0 > AXIS_TOLERANCE
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 - self.x0 <= AXIS_TOLERANCE && self.y1 - self.y0 > AXIS_TOLERANCE
    }

    pub fn length(&self) -> f32 {
        (self.x1 - self.x0).max(self.y1 - self.y0)
    }
}

/// Everything the table and text layers need from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub chunks: Vec<TextChunk>,
    pub segments: Vec<Segment>,
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

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

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Graphics state saved by `q` and restored by `Q`. Text parameters are
/// part of it, the text matrices are not.
#[derive(Debug, Clone)]
struct State {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct Interpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, FontMetrics>,
    fallback: FontMetrics,
    state: State,
    stack: Vec<State>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    pending: Vec<Segment>,
    output: PageContent,
}

/// Run the operators of a page and collect its text chunks and segments.
///
/// `fonts` maps resource names (as used by `Tf`) to their metrics; unknown
/// fonts decode as Latin-1 with estimated widths.
pub fn interpret(operations: &[Operation], fonts: &HashMap<Vec<u8>, FontMetrics>) -> PageContent {
    let mut interpreter = Interpreter {
        fonts,
        fallback: FontMetrics::default(),
        state: State::default(),
        stack: Vec::new(),
        text_matrix: IDENTITY,
        line_matrix: IDENTITY,
        current_point: None,
        subpath_start: None,
        pending: Vec::new(),
        output: PageContent::default(),
    };

    for op in operations {
        interpreter.execute(op);
    }

    trace!(
        "Interpreted {} operators: {} text chunks, {} segments",
        operations.len(),
        interpreter.output.chunks.len(),
        interpreter.output.segments.len()
    );
    interpreter.output
}

impl Interpreter<'_> {
    fn execute(&mut self, op: &Operation) {
        let operands = &op.operands;
        let num = |i: usize| operands.get(i).and_then(number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }

            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                self.state.font = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(<[u8]>::to_vec);
                self.state.font_size = num(1).unwrap_or(0.0);
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.rise = num(0).unwrap_or(0.0),
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.state.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                self.next_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0
                                        * self.state.font_size
                                        * self.state.horizontal_scale;
                                    self.text_matrix =
                                        multiply(&translation(tx, 0.0), &self.text_matrix);
                                }
                            }
                        }
                    }
                }
            }

            "m" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let p = apply(&self.state.ctm, x, y);
                    self.current_point = Some(p);
                    self.subpath_start = Some(p);
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let p = apply(&self.state.ctm, x, y);
                    if let Some(from) = self.current_point {
                        self.pending.push(Segment::new(from, p));
                    }
                    self.current_point = Some(p);
                }
            }
            "c" | "v" | "y" => {
                let n = operands.len();
                if n >= 2 {
                    if let (Some(x), Some(y)) = (num(n - 2), num(n - 1)) {
                        self.current_point = Some(apply(&self.state.ctm, x, y));
                    }
                }
            }
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                    let ctm = self.state.ctm;
                    let corners = [
                        apply(&ctm, x, y),
                        apply(&ctm, x + w, y),
                        apply(&ctm, x + w, y + h),
                        apply(&ctm, x, y + h),
                    ];
                    for k in 0..4 {
                        self.pending.push(Segment::new(corners[k], corners[(k + 1) % 4]));
                    }
                    self.current_point = Some(corners[0]);
                    self.subpath_start = Some(corners[0]);
                }
            }
            "h" => self.close_subpath(),
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint(),
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint();
            }
            "n" => self.end_path(),

            _ => {}
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn show(&mut self, bytes: &[u8]) {
        let metrics = self
            .state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback);
        let size = self.state.font_size;

        let rendering = multiply(&self.text_matrix, &self.state.ctm);
        let (x, y) = apply(&rendering, 0.0, self.state.rise);

        let mut advance = 0.0;
        let mut text = String::new();
        for (code, glyph) in metrics.decode(bytes) {
            let mut width = metrics.glyph_width(code) / 1000.0 * size + self.state.char_spacing;
            if code == 32 && !metrics.two_byte {
                width += self.state.word_spacing;
            }
            advance += width * self.state.horizontal_scale;
            text.push_str(&glyph);
        }

        let x_scale = rendering[0].hypot(rendering[1]);
        let y_scale = rendering[2].hypot(rendering[3]);
        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);

        if !text.trim().is_empty() {
            self.output.chunks.push(TextChunk {
                text,
                x,
                y,
                width: advance * x_scale,
                font_size: size * y_scale,
            });
        }
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(start)) = (self.current_point, self.subpath_start) {
            if from != start {
                self.pending.push(Segment::new(from, start));
            }
            self.current_point = Some(start);
        }
    }

    fn paint(&mut self) {
        self.output.segments.append(&mut self.pending);
        self.end_path();
    }

    fn end_path(&mut self) {
        self.pending.clear();
        self.current_point = None;
        self.subpath_start = None;
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use lopdf::StringFormat;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn int(v: i64) -> Object {
        Object::Integer(v)
    }

    fn name(s: &str) -> Object {
        Object::Name(s.as_bytes().to_vec())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_text_position_and_width() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("Td", vec![int(100), int(700)]),
            op("Tj", vec![text("ABCD12")]),
            op("ET", vec![]),
        ];
        let page = interpret(&ops, &HashMap::new());
        assert_eq!(page.chunks.len(), 1);
        let chunk = &page.chunks[0];
        assert_eq!(chunk.text, "ABCD12");
        assert!(close(chunk.x, 100.0) && close(chunk.y, 700.0));
        // six glyphs at the 0.5 em estimate
        assert!(close(chunk.width, 30.0));
        assert!(close(chunk.font_size, 10.0));
    }

    #[test]
    fn test_leading_and_next_line() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(12)]),
            op("TL", vec![int(14)]),
            op("Td", vec![int(50), int(500)]),
            op("Tj", vec![text("first")]),
            op("T*", vec![]),
            op("Tj", vec![text("second")]),
            op("ET", vec![]),
        ];
        let page = interpret(&ops, &HashMap::new());
        assert!(close(page.chunks[1].y, 486.0));
        assert!(close(page.chunks[1].x, 50.0));
    }

    #[test]
    fn test_tj_array_kerning_moves_next_string() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op(
                "TJ",
                vec![Object::Array(vec![text("AB"), Object::Integer(-1000), text("CD")])],
            ),
            op("ET", vec![]),
        ];
        let page = interpret(&ops, &HashMap::new());
        assert_eq!(page.chunks.len(), 2);
        // "AB" advances 10, the adjustment another 10
        assert!(close(page.chunks[1].x, 20.0));
    }

    #[test]
    fn test_font_widths_and_ctm() {
        let mut fonts = HashMap::new();
        fonts.insert(
            b"F2".to_vec(),
            FontMetrics {
                first_char: 65,
                widths: vec![1000.0, 1000.0],
                ..Default::default()
            },
        );
        let ops = vec![
            op("q", vec![]),
            op("cm", vec![int(2), int(0), int(0), int(2), int(10), int(20)]),
            op("BT", vec![]),
            op("Tf", vec![name("F2"), int(5)]),
            op("Tj", vec![text("AB")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Tf", vec![name("F2"), int(5)]),
            op("Tj", vec![text("A")]),
            op("ET", vec![]),
        ];
        let page = interpret(&ops, &fonts);
        assert!(close(page.chunks[0].x, 10.0) && close(page.chunks[0].y, 20.0));
        assert!(close(page.chunks[0].width, 20.0));
        assert!(close(page.chunks[0].font_size, 10.0));
        // the saved state drops the scaling again
        assert!(close(page.chunks[1].x, 0.0) && close(page.chunks[1].width, 5.0));
    }

    #[test]
    fn test_rectangles_and_strokes_become_segments() {
        let ops = vec![
            op("re", vec![int(10), int(10), int(100), int(20)]),
            op("S", vec![]),
            op("m", vec![int(0), int(50)]),
            op("l", vec![int(200), int(50)]),
            op("S", vec![]),
            op("m", vec![int(0), int(0)]),
            op("l", vec![int(5), int(5)]),
            op("n", vec![]),
        ];
        let page = interpret(&ops, &HashMap::new());
        assert_eq!(page.segments.len(), 5);
        let horizontals = page.segments.iter().filter(|s| s.is_horizontal()).count();
        let verticals = page.segments.iter().filter(|s| s.is_vertical()).count();
        assert_eq!((horizontals, verticals), (3, 2));
        assert_eq!(page.segments[4], Segment::new((0.0, 50.0), (200.0, 50.0)));
    }

    #[test]
    fn test_decoded_stream() {
        let stream = b"BT /F1 9 Tf 1 0 0 1 72 600 Tm (01-02-2024) Tj ET 0 0 m 100 0 l S";
        let content = Content::decode(stream).unwrap();
        let page = interpret(&content.operations, &HashMap::new());
        assert_eq!(page.chunks[0].text, "01-02-2024");
        assert!(close(page.chunks[0].x, 72.0) && close(page.chunks[0].y, 600.0));
        assert_eq!(page.segments.len(), 1);
    }

    #[test]
    fn test_blank_strings_dropped() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("Tj", vec![text("   ")]),
            op("Tj", vec![text("X")]),
            op("ET", vec![]),
        ];
        let page = interpret(&ops, &HashMap::new());
        assert_eq!(page.chunks.len(), 1);
        assert!(close(page.chunks[0].x, 15.0));
    }
}

//! Words, lines and page text from positioned chunks.

use super::content::TextChunk;

/// Baselines closer than this belong to the same line.
pub const LINE_TOLERANCE: f32 = 3.0;

/// Gap, as a fraction of the font size, below which neighbouring pieces are
/// one word.
const WORD_GAP_RATIO: f32 = 0.15;

/// Character width used for layout text when the page gives no hint.
const DEFAULT_CHAR_WIDTH: f32 = 5.0;

/// A whitespace-free run of text with its horizontal extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
}

impl Word {
    /// Horizontal centre.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical centre, estimated from the baseline and font size.
    pub fn center_y(&self) -> f32 {
        self.y + self.size * 0.35
    }
}

/// Words sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub y: f32,
    pub words: Vec<Word>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group chunks into lines (top to bottom) of words (left to right).
pub fn text_lines(chunks: &[TextChunk]) -> Vec<TextLine> {
    let mut pieces: Vec<Word> = chunks.iter().flat_map(split_chunk).collect();
    pieces.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x0.total_cmp(&b.x0)));

    let mut rows: Vec<(f32, Vec<Word>)> = Vec::new();
    for piece in pieces {
        match rows.last_mut() {
            Some((y, row)) if (*y - piece.y).abs() <= LINE_TOLERANCE => row.push(piece),
            _ => rows.push((piece.y, vec![piece])),
        }
    }

    rows.into_iter()
        .map(|(y, mut row)| {
            row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            TextLine { y, words: merge_pieces(row) }
        })
        .collect()
}

/// Plain text: one line per text line, words separated by single spaces.
pub fn plain_text(lines: &[TextLine]) -> String {
    lines.iter().map(TextLine::text).collect::<Vec<_>>().join("\n")
}

/// Text with horizontal positions kept: each word starts at the column its
/// x coordinate maps to, given the average character width on the page.
pub fn layout_text(lines: &[TextLine]) -> String {
    let words = lines.iter().flat_map(|l| l.words.iter());
    let (width, chars) = words
        .clone()
        .fold((0.0f32, 0usize), |(w, c), word| (w + (word.x1 - word.x0), c + word.text.chars().count()));
    let char_width = if chars > 0 && width > 0.0 {
        width / chars as f32
    } else {
        DEFAULT_CHAR_WIDTH
    };
    let left = words.map(|w| w.x0).fold(f32::INFINITY, f32::min);

    lines
        .iter()
        .map(|line| {
            let mut out = String::new();
            let mut column = 0usize;
            for word in &line.words {
                let target = ((word.x0 - left) / char_width).round().max(0.0) as usize;
                if column > 0 || target > 0 {
                    let pad = if target > column { target - column } else { usize::from(column > 0) };
                    out.extend(std::iter::repeat_n(' ', pad));
                    column += pad;
                }
                out.push_str(&word.text);
                column += word.text.chars().count();
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a chunk on whitespace, spreading its width evenly over characters.
fn split_chunk(chunk: &TextChunk) -> Vec<Word> {
    let count = chunk.text.chars().count().max(1);
    let per_char = chunk.width / count as f32;

    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    for (i, c) in chunk.text.chars().enumerate() {
        if c.is_whitespace() {
            if !current.is_empty() {
                words.push(piece(chunk, std::mem::take(&mut current), start, i, per_char));
            }
            start = i + 1;
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(piece(chunk, current, start, count, per_char));
    }
    words
}

fn piece(chunk: &TextChunk, text: String, from: usize, to: usize, per_char: f32) -> Word {
    Word {
        text,
        x0: chunk.x + from as f32 * per_char,
        x1: chunk.x + to as f32 * per_char,
        y: chunk.y,
        size: chunk.font_size,
    }
}

/// Join pieces of one line whose gap is too small to be a space.
fn merge_pieces(pieces: Vec<Word>) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match words.last_mut() {
            Some(last) if piece.x0 - last.x1 < WORD_GAP_RATIO * last.size.max(piece.size) => {
                last.text.push_str(&piece.text);
                last.x1 = last.x1.max(piece.x1);
            }
            _ => words.push(piece),
        }
    }
    words
}

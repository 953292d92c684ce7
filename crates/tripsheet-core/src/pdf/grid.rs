//! Table detection on a page.
//!
//! Two heuristics build a grid and drop words into its cells:
//! ruled lines (rectangle edges and strokes) or left edges that several text
//! lines share. A third reader splits already-decoded plain text into rows
//! for the whole-document backend.

use lazy_static::lazy_static;
use regex::Regex;

use super::content::Segment;
use super::layout::{TextLine, Word};
use super::{DocumentTableMode, Table};

/// Boundaries closer than this are one boundary.
pub const SNAP_TOLERANCE: f32 = 3.0;

/// Shorter segments are ignored (rectangle sides of thin rules, ticks).
pub const MIN_EDGE_LENGTH: f32 = 3.0;

/// A left edge must be shared by this many lines to become a column.
pub const MIN_ALIGNED_LINES: usize = 3;

lazy_static! {
    static ref CELL_GAP: Regex = Regex::new(r"\t+|\s{2,}").unwrap();
}

/// Build a table from ruled lines.
///
/// Rows are bounded by distinct horizontal rules and columns by distinct
/// vertical rules; at least two of each are needed. Each word lands in the
/// cell holding its centre. Rows with only empty cells are dropped.
pub fn lines_tables(segments: &[Segment], lines: &[TextLine]) -> Vec<Table> {
    let long = |s: &&Segment| s.length() >= MIN_EDGE_LENGTH;
    let horizontal: Vec<f32> = segments
        .iter()
        .filter(|s| s.is_horizontal())
        .filter(long)
        .map(|s| (s.y0 + s.y1) / 2.0)
        .collect();
    let vertical: Vec<f32> = segments
        .iter()
        .filter(|s| s.is_vertical())
        .filter(long)
        .map(|s| (s.x0 + s.x1) / 2.0)
        .collect();

    let mut rows_at = snap(horizontal);
    let cols_at = snap(vertical);
    if rows_at.len() < 2 || cols_at.len() < 2 {
        return Vec::new();
    }
    rows_at.reverse();

    let mut rows = Vec::new();
    for band in rows_at.windows(2) {
        let (top, bottom) = (band[0], band[1]);
        let cells: Vec<String> = cols_at
            .windows(2)
            .map(|col| cell_text(lines, col[0], col[1], bottom, top))
            .collect();
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        Vec::new()
    } else {
        vec![Table::new(rows)]
    }
}

/// Build a table from text alignment.
///
/// Column boundaries are word left edges shared (within the snap tolerance)
/// by enough distinct lines. Lines with words on fewer than two boundaries
/// are not rows; the table needs two columns and two rows.
pub fn text_tables(lines: &[TextLine]) -> Vec<Table> {
    let boundaries = aligned_edges(lines);
    if boundaries.len() < 2 {
        return Vec::new();
    }

    let rows: Vec<Vec<String>> = lines
        .iter()
        .filter(|line| {
            let aligned = line
                .words
                .iter()
                .filter(|w| boundaries.iter().any(|b| (w.x0 - b).abs() <= SNAP_TOLERANCE))
                .count();
            aligned >= 2
        })
        .map(|line| {
            let mut cells = vec![Vec::new(); boundaries.len()];
            for word in &line.words {
                let column = boundaries
                    .iter()
                    .rposition(|b| *b <= word.x0 + SNAP_TOLERANCE)
                    .unwrap_or(0);
                cells[column].push(word.text.as_str());
            }
            cells.into_iter().map(|c| c.join(" ")).collect()
        })
        .collect();

    if rows.len() < 2 {
        Vec::new()
    } else {
        vec![Table::new(rows)]
    }
}

/// Split decoded text into tables.
///
/// Lattice mode keeps maximal runs of at least two consecutive lines that
/// each split into at least two cells on tabs or runs of two or more spaces.
/// Stream mode makes every non-empty line a one-cell row of a single table.
pub fn split_text_tables(text: &str, mode: DocumentTableMode) -> Vec<Table> {
    match mode {
        DocumentTableMode::Stream => {
            let rows: Vec<Vec<String>> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| vec![l.to_string()])
                .collect();
            if rows.is_empty() { Vec::new() } else { vec![Table::new(rows)] }
        }
        DocumentTableMode::Lattice => {
            let mut tables = Vec::new();
            let mut run: Vec<Vec<String>> = Vec::new();
            for line in text.lines() {
                let cells: Vec<String> = CELL_GAP
                    .split(line.trim())
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                if cells.len() >= 2 {
                    run.push(cells);
                } else {
                    flush_run(&mut run, &mut tables);
                }
            }
            flush_run(&mut run, &mut tables);
            tables
        }
    }
}

fn flush_run(run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if run.len() >= 2 {
        tables.push(Table::new(std::mem::take(run)));
    } else {
        run.clear();
    }
}

/// Sort and merge values lying within the snap tolerance of their group's
/// first value. Each group is represented by its mean.
fn snap(mut values: Vec<f32>) -> Vec<f32> {
    values.sort_by(f32::total_cmp);
    let mut groups: Vec<(f32, f32, usize)> = Vec::new();
    for v in values {
        match groups.last_mut() {
            Some((first, sum, n)) if v - *first <= SNAP_TOLERANCE => {
                *sum += v;
                *n += 1;
            }
            _ => groups.push((v, v, 1)),
        }
    }
    groups.into_iter().map(|(_, sum, n)| sum / n as f32).collect()
}

/// Left edges shared by at least [`MIN_ALIGNED_LINES`] distinct lines.
fn aligned_edges(lines: &[TextLine]) -> Vec<f32> {
    let mut edges: Vec<(f32, usize)> = lines
        .iter()
        .enumerate()
        .flat_map(|(i, line)| line.words.iter().map(move |w| (w.x0, i)))
        .collect();
    edges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<(f32, Vec<usize>)> = Vec::new();
    for (x, line) in edges {
        match groups.last_mut() {
            Some((first, members)) if x - *first <= SNAP_TOLERANCE => members.push(line),
            _ => groups.push((x, vec![line])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(first, mut members)| {
            members.sort_unstable();
            members.dedup();
            (members.len() >= MIN_ALIGNED_LINES).then_some(first)
        })
        .collect()
}

/// Text of the words whose centre lies inside the cell, lines joined by
/// newlines.
fn cell_text(lines: &[TextLine], left: f32, right: f32, bottom: f32, top: f32) -> String {
    let inside = |w: &&Word| {
        let (cx, cy) = (w.center_x(), w.center_y());
        cx >= left && cx <= right && cy >= bottom && cy <= top
    };
    lines
        .iter()
        .map(|line| {
            line.words
                .iter()
                .filter(inside)
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

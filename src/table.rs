//! Plain-text rendering of a [`crate::report::WarningsAndErrors`] entry list
//! (spec §6 human-readable mode).
//!
//! Grounded on `table.rs::render_table`'s column-width/padding algorithm,
//! adapted for this domain: the `content` column carries a free-text
//! validation message that can run much longer than any other column, so
//! it is capped at [`MAX_CONTENT_WIDTH`] rather than left to stretch the
//! whole table to its widest cell. `print_table` (no callers in the
//! teacher's domain either) is dropped — this module only ever renders to
//! a `String` for `WarningsAndErrors::render_human`.

use std::borrow::Cow;
use std::fmt::Write as _;

/// Longest a `content` cell may be before it's truncated with an ellipsis.
/// Validation messages are free text (e.g. quoted source values) and can
/// otherwise blow out every row's column widths for one long message.
const MAX_CONTENT_WIDTH: usize = 80;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let content_idx = headers.iter().position(|h| h == "content");
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(idx) = content_idx {
                if let Some(cell) = row.get_mut(idx) {
                    truncate_in_place(cell, MAX_CONTENT_WIDTH);
                }
            }
            row
        })
        .collect();

    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(headers, &widths);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths);
    let _ = writeln!(output, "{separator_line}");

    for row in &rows {
        let row_line = format_row(row, &widths);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

fn truncate_in_place(cell: &mut String, max_width: usize) {
    if display_width(cell) <= max_width {
        return;
    }
    let keep = max_width.saturating_sub(1);
    let truncated: String = cell.chars().take(keep).collect();
    *cell = truncated;
    cell.push('\u{2026}');
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let display = display_width(sanitized.as_ref());
        let mut cell = sanitized.into_owned();
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        if padding > 0 {
            cell.push_str(&" ".repeat(padding));
        }
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        let mut sanitized = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\n' | '\r' | '\t' => sanitized.push(' '),
                other => sanitized.push(other),
            }
        }
        Cow::Owned(sanitized)
    } else {
        Cow::Borrowed(value)
    }
}

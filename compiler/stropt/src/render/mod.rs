//! Text output: title box, layout tables, bare lines and C listings.
//!
//! Everything here builds a `String`; writing it out is the caller's job.

use stropt_layout::{Aggregate, AggregateMeta, FieldType, Layout};

/// Narrowest table column, in characters.
const MIN_CELL: usize = 15;

/// Narrowest listing box content, in characters.
const MIN_LISTING: usize = 28;

/// One table row or bare line.
#[derive(Debug)]
struct Row {
    label: String,
    size: u64,
    alignment: u64,
    padding: u64,
}

impl Row {
    fn of(label: String, layout: &Layout) -> Self {
        Row {
            label,
            size: layout.size,
            alignment: layout.alignment,
            padding: layout.padding,
        }
    }

    fn cells(&self) -> [String; 4] {
        [
            self.label.clone(),
            self.size.to_string(),
            self.alignment.to_string(),
            self.padding.to_string(),
        ]
    }
}

/// The summary row, then a row per field. With `verbose`, the rows of
/// nested aggregates follow their field, labelled `type::field`.
fn rows(name: &str, meta: &AggregateMeta, verbose: bool) -> Vec<Row> {
    let mut rows = vec![Row {
        label: name.to_owned(),
        size: meta.size,
        alignment: meta.alignment,
        padding: meta.total_padding(),
    }];
    push_rows(&meta.layout, None, verbose, &mut rows);
    rows
}

fn push_rows(layout: &[Layout], prefix: Option<&str>, verbose: bool, rows: &mut Vec<Row>) {
    for entry in layout {
        // Anonymous members have no name; show their type instead.
        let mut label = entry.declaration();
        if label.is_empty() {
            label = entry.field.unqualified_type();
        }
        if let Some(prefix) = prefix {
            label = format!("{prefix}::{label}");
        }
        rows.push(Row::of(label, entry));

        if let (true, Some(nested)) = (verbose, &entry.sub_layout) {
            push_rows(nested, Some(&entry.field.unqualified_type()), verbose, rows);
        }
    }
}

/// `text` centered in a rounded box as wide as a default table.
pub(crate) fn title(text: &str) -> String {
    let width = (4 * MIN_CELL + 3).max(text.chars().count() + 2);
    let rule = "─".repeat(width);
    format!("╭{rule}╮\n│{text:^width$}│\n╰{rule}╯\n")
}

/// A rounded table with a header row; `heading` labels the first column.
pub(crate) fn table(heading: &str, name: &str, meta: &AggregateMeta, verbose: bool) -> String {
    let header = [
        heading.to_owned(),
        "Size".to_owned(),
        "Alignment".to_owned(),
        "Padding".to_owned(),
    ];
    let body: Vec<[String; 4]> = rows(name, meta, verbose).iter().map(Row::cells).collect();

    let mut widths = [MIN_CELL; 4];
    for cells in std::iter::once(&header).chain(&body) {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count() + 2);
        }
    }

    let mut out = rule('╭', '┬', '╮', &widths);
    out.push_str(&table_line(&header, &widths));
    out.push_str(&rule('├', '┼', '┤', &widths));
    for cells in &body {
        out.push_str(&table_line(cells, &widths));
    }
    out.push_str(&rule('╰', '┴', '╯', &widths));
    out
}

fn rule(left: char, junction: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
    format!("{left}{}{right}\n", segments.join(&junction.to_string()))
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:^width$}"))
        .collect();
    format!("│{}│\n", cells.join("│"))
}

/// `tag name, size: S, alignment: A, padding: P` for the aggregate, and
/// with `verbose` for every row below it too.
pub(crate) fn bare(tag: &str, name: &str, meta: &AggregateMeta, verbose: bool) -> String {
    let rows = rows(name, meta, verbose);
    let shown = if verbose { rows.len() } else { 1 };
    rows.iter()
        .take(shown)
        .map(|row| {
            format!(
                "{tag} {}, size: {}, alignment: {}, padding: {}\n",
                row.label, row.size, row.alignment, row.padding
            )
        })
        .collect()
}

/// The aggregate as C source, fields in the order of `meta`, under a
/// `comment` line.
pub(crate) fn listing(comment: &str, aggregate: &Aggregate, meta: &AggregateMeta) -> Vec<String> {
    let (open, close) = match (aggregate.qualified_name(), &aggregate.typedef) {
        (Some(qualified), _) => (format!("{qualified} {{"), "};".to_owned()),
        (None, Some(typedef)) => (format!("typedef {} {{", aggregate.kind), format!("}} {typedef};")),
        (None, None) => (format!("{} {{", aggregate.kind), "};".to_owned()),
    };

    let mut lines = vec![comment.to_owned(), open];
    for entry in &meta.layout {
        lines.push(format!("    {};", entry.field.to_string().trim_end()));
    }
    lines.push(close);
    lines
}

/// Two listings framed and placed next to each other.
pub(crate) fn side_by_side(left: &[String], right: &[String]) -> String {
    let left = framed(left);
    let right = framed(right);
    let left_width = left.first().map_or(0, |line| line.chars().count());

    let mut out = String::new();
    for row in 0..left.len().max(right.len()) {
        let lhs = left.get(row).map_or("", String::as_str);
        let rhs = right.get(row).map_or("", String::as_str);
        out.push_str(format!("{lhs:<left_width$}  {rhs}").trim_end());
        out.push('\n');
    }
    out
}

fn framed(lines: &[String]) -> Vec<String> {
    let inner = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_LISTING);
    let rule = "─".repeat(inner + 2);

    let mut framed = Vec::with_capacity(lines.len() + 2);
    framed.push(format!("╭{rule}╮"));
    framed.extend(lines.iter().map(|line| format!("│ {line:<inner$} │")));
    framed.push(format!("╰{rule}╯"));
    framed
}

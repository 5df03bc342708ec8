//! Text renderings of recovered tables

use crate::table::ParsedTable;

/// Canonical pipe table with a `---` separator row
///
/// A `|` inside a cell is written as `&#124;`, which Markdown viewers show as
/// a pipe and which does not split the cell when the table is read back.
pub fn to_markdown(table: &ParsedTable) -> String {
    if table.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    push_markdown_row(&mut out, table.header.iter().map(String::as_str));
    push_markdown_row(&mut out, table.header.iter().map(|_| "---"));
    for row in &table.rows {
        push_markdown_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_markdown_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell.replace('|', "&#124;"));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Comma-separated values, quoting fields that need it
pub fn to_csv(table: &ParsedTable) -> String {
    let mut out = String::new();
    if table.is_empty() {
        return out;
    }
    push_csv_row(&mut out, &table.header);
    for row in &table.rows {
        push_csv_row(&mut out, row);
    }
    out
}

fn push_csv_row(out: &mut String, cells: &[String]) {
    let line = cells
        .iter()
        .map(|cell| csv_field(cell))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// `<table>` element with escaped cells
pub fn to_html_table(table: &ParsedTable) -> String {
    let mut out = String::from("<table>\n  <thead>\n    <tr>");
    for cell in &table.header {
        out.push_str(&format!("<th>{}</th>", escape_html(cell)));
    }
    out.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for row in &table.rows {
        out.push_str("    <tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("  </tbody>\n</table>\n");
    out
}

/// Standalone HTML page with the table (when present) and the raw response
pub fn html_report(title: &str, text: &str, table: &ParsedTable) -> String {
    let title = escape_html(title);
    let mut out = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );
    if !table.is_empty() {
        out.push_str(&to_html_table(table));
    }
    out.push_str(&format!(
        "<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(text)
    ));
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

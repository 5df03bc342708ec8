//! Recovery of the first Markdown table from free-form text

use tracing::{debug, instrument};

/// A table recovered from text, with rows aligned to the header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedTable {
    /// Non-empty column names in source order
    pub header: Vec<String>,
    /// Data rows, each exactly `header.len()` cells long
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// True when no table was found
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Cells of the named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.header.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }

    /// Rows as `(column, value)` pairs
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &str)>> + '_ {
        self.rows.iter().map(move |row| {
            self.header
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect()
        })
    }
}

/// Parse the first Markdown-style table found in `text`
///
/// Lines containing `|` form the table; only the first contiguous block of
/// such lines is used. A second row made of dash cells (`---`, `:--:`) is
/// treated as the header separator. Never fails: when nothing usable is found
/// the result is empty.
#[instrument(skip_all, fields(bytes = text.len()))]
pub fn parse_first_table(text: &str) -> ParsedTable {
    let rows: Vec<Vec<&str>> = text
        .lines()
        .skip_while(|line| !line.contains('|'))
        .take_while(|line| line.contains('|'))
        .map(split_row)
        .collect();

    let Some((header_row, rest)) = rows.split_first() else {
        debug!("no table found");
        return ParsedTable::default();
    };

    let data = match rest.split_first() {
        Some((second, data)) if is_separator_row(second) => data,
        _ => rest,
    };

    // positions of non-empty header cells; empty columns are dropped everywhere
    let kept: Vec<usize> = header_row
        .iter()
        .enumerate()
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(index, _)| index)
        .collect();
    if kept.is_empty() {
        debug!("table header has no named columns");
        return ParsedTable::default();
    }

    let header = kept
        .iter()
        .filter_map(|&index| header_row.get(index))
        .map(|cell| (*cell).to_string())
        .collect();
    let rows = data
        .iter()
        .map(|row| {
            kept.iter()
                .map(|&index| row.get(index).map_or_else(String::new, |c| (*c).to_string()))
                .collect()
        })
        .collect();

    let table = ParsedTable { header, rows };
    debug!(
        columns = table.header.len(),
        rows = table.rows.len(),
        "parsed table"
    );
    table
}

/// Split one pipe-delimited line into trimmed cells
fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn is_separator_row(cells: &[&str]) -> bool {
    cells.iter().all(|cell| is_separator_cell(cell))
}

/// Matches `^\s*:?-+:?\s*$`
fn is_separator_cell(cell: &str) -> bool {
    let cell = cell.trim();
    let cell = cell.strip_prefix(':').unwrap_or(cell);
    let cell = cell.strip_suffix(':').unwrap_or(cell);
    !cell.is_empty() && cell.bytes().all(|b| b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_split_row_trims_one_outer_pipe() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a|b"), vec!["a", "b"]);
        assert_eq!(split_row("|| a ||"), vec!["", "a", ""]);
    }

    #[test]
    fn test_separator_cells() {
        for cell in ["---", " --- ", ":--", "--:", ":-:", "-"] {
            assert!(is_separator_cell(cell), "{cell:?}");
        }
        for cell in ["", "::", "- -", "abc", "-x-", "==="] {
            assert!(!is_separator_cell(cell), "{cell:?}");
        }
    }

    #[test]
    fn test_alignment_separator_is_skipped() {
        let table = parse_first_table("| L | C | R |\n|:--|:-:|--:|\n| 1 | 2 | 3 |");
        assert_eq!(table.header, strings(&["L", "C", "R"]));
        assert_eq!(table.rows, vec![strings(&["1", "2", "3"])]);
    }

    #[test]
    fn test_without_separator_second_row_is_data() {
        let table = parse_first_table("Name | Port\nsftp | 22\nftps | 990");
        assert_eq!(table.header, strings(&["Name", "Port"]));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_header_only() {
        let table = parse_first_table("| only | header |");
        assert_eq!(table.header, strings(&["only", "header"]));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_empty_header_columns_dropped_from_rows() {
        let table = parse_first_table("| A |  | C |\n|---|---|---|\n| 1 | 2 | 3 |\n| 4 |");
        assert_eq!(table.header, strings(&["A", "C"]));
        assert_eq!(table.rows, vec![strings(&["1", "3"]), strings(&["4", ""])]);
    }

    #[test]
    fn test_all_empty_header_is_empty_table() {
        assert!(parse_first_table("| | |\n| a | b |").is_empty());
    }

    #[test]
    fn test_long_rows_truncated() {
        let table = parse_first_table("| A | B |\n| 1 | 2 | 3 | 4 |");
        assert_eq!(table.rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_only_first_block_is_parsed() {
        let text = "Intro\n| A | B |\n|---|---|\n| 1 | 2 |\n\nMore text\n| X | Y |\n| 9 | 9 |";
        let table = parse_first_table(text);
        assert_eq!(table.header, strings(&["A", "B"]));
        assert_eq!(table.rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_column_and_records() {
        let table = parse_first_table("| Tool | Protocol |\n|---|---|\n| GoAnywhere | SFTP |");
        assert_eq!(table.column("Protocol"), Some(vec!["SFTP"]));
        assert_eq!(table.column("Missing"), None);
        let records: Vec<_> = table.records().collect();
        assert_eq!(
            records,
            vec![vec![("Tool", "GoAnywhere"), ("Protocol", "SFTP")]]
        );
    }
}

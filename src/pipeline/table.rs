//! Tables: grid detection over positioned text and pipe-table rendering.
//!
//! pdfium has no table API, so grids are inferred from text alignment in the
//! style of Camelot's stream mode: spans are grouped into rows by vertical
//! centre, and a run of consecutive rows with the same number of cells whose
//! columns line up becomes one table. The first row is taken as the header.

use crate::geometry::Rect;
use crate::source::TextSpan;
use tracing::debug;

/// One extracted table: rows of cell strings, header first.
pub type TableGrid = Vec<Vec<String>>;

/// Render a grid as a GitHub-flavoured Markdown pipe table.
///
/// The first row is the header. Data rows shorter than the header are padded
/// with empty cells; longer rows are truncated to the header width. An empty
/// grid renders as an empty string.
pub fn format_table(grid: &[Vec<String>]) -> String {
    let Some((header, rows)) = grid.split_first() else {
        return String::new();
    };
    let width = header.len();

    let mut md = String::new();
    push_row(&mut md, header.iter().map(String::as_str));
    push_row(&mut md, std::iter::repeat("---").take(width));
    for row in rows {
        let cells = row
            .iter()
            .map(String::as_str)
            .chain(std::iter::repeat(""))
            .take(width);
        push_row(&mut md, cells);
    }
    md
}

fn push_row<'a>(md: &mut String, cells: impl Iterator<Item = &'a str>) {
    let cells: Vec<String> = cells.map(escape_cell).collect();
    md.push_str("| ");
    md.push_str(&cells.join(" | "));
    md.push_str(" |\n");
}

fn escape_cell(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ").replace('|', "\\|")
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Max distance (points) between span centres on the same row
    pub row_tolerance: f32,
    /// Horizontal gap (points) that separates two cells
    pub min_column_gap: f32,
    /// Max drift (points) of a column edge between rows
    pub column_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            row_tolerance: 3.0,
            min_column_gap: 15.0,
            column_tolerance: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    rect: Rect,
}

/// Detects tables in a page's text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect table grids, top of page first.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<TableGrid> {
        let rows = self.group_into_rows(spans);
        let mut tables = Vec::new();

        let mut start = 0;
        while start < rows.len() {
            let mut end = start + 1;
            if rows[start].len() >= self.config.min_columns {
                while end < rows.len() && self.aligned(&rows[start], &rows[end]) {
                    end += 1;
                }
            }
            if end - start >= self.config.min_rows && rows[start].len() >= self.config.min_columns {
                debug!(
                    "Table: {} rows x {} columns",
                    end - start,
                    rows[start].len()
                );
                tables.push(
                    rows[start..end]
                        .iter()
                        .map(|row| row.iter().map(|c| c.text.clone()).collect())
                        .collect(),
                );
            }
            start = end;
        }

        tables
    }

    /// Group spans into rows (top to bottom), merging spans closer than the
    /// column gap into a single cell.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<Vec<Cell>> {
        let mut sorted: Vec<&TextSpan> = spans.iter().filter(|s| !s.text.trim().is_empty()).collect();
        sorted.sort_by(|a, b| b.rect.center_y().total_cmp(&a.rect.center_y()));

        let mut rows: Vec<Vec<&TextSpan>> = Vec::new();
        for span in sorted {
            match rows.last_mut() {
                Some(row)
                    if (row[0].rect.center_y() - span.rect.center_y()).abs()
                        <= self.config.row_tolerance =>
                {
                    row.push(span)
                }
                _ => rows.push(vec![span]),
            }
        }

        rows.into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| a.rect.x0().total_cmp(&b.rect.x0()));
                let mut cells: Vec<Cell> = Vec::new();
                for span in row {
                    let text = span.text.trim();
                    match cells.last_mut() {
                        Some(cell) if span.rect.x0() - cell.rect.x1() < self.config.min_column_gap => {
                            cell.text.push(' ');
                            cell.text.push_str(text);
                            cell.rect = Rect::new(
                                cell.rect.x0(),
                                cell.rect.y0().min(span.rect.y0()),
                                cell.rect.x1().max(span.rect.x1()),
                                cell.rect.y1().max(span.rect.y1()),
                            );
                        }
                        _ => cells.push(Cell {
                            text: text.to_string(),
                            rect: span.rect,
                        }),
                    }
                }
                cells
            })
            .collect()
    }

    /// Same cell count and every column aligned on its left edge, right
    /// edge, or centre.
    fn aligned(&self, header: &[Cell], row: &[Cell]) -> bool {
        let tol = self.config.column_tolerance;
        header.len() == row.len()
            && header.iter().zip(row).all(|(a, b)| {
                (a.rect.x0() - b.rect.x0()).abs() <= tol
                    || (a.rect.x1() - b.rect.x1()).abs() <= tol
                    || (a.rect.center_x() - b.rect.center_x()).abs() <= tol
            })
    }
}

//! Template structure dump for template authors placing placeholders.

use std::path::Path;

use crate::docx::WordDocument;
use crate::docx::xml::Element;
use crate::error::Error;
use crate::report::table::cell_text;

/// Describe the body tables of the template at `path`: table count, then for
/// each table its size and the non-empty cells as `(row,col)text`.
pub fn analyze_structure(path: &Path) -> Result<String, Error> {
    let doc = WordDocument::open(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(describe_tables(&name, doc.body()))
}

/// [`analyze_structure`] for display: failures become an `Error: …` line.
pub fn describe_structure(path: &Path) -> String {
    analyze_structure(path).unwrap_or_else(|e| format!("Error: {e}"))
}

fn describe_tables(file_name: &str, body: &Element) -> String {
    let tables: Vec<&Element> = body.w_children("tbl").collect();
    let mut out = vec![format!("File: {file_name}"), format!("Tables: {}", tables.len())];

    for (t_idx, table) in tables.iter().enumerate() {
        let rows: Vec<&Element> = table.w_children("tr").collect();
        let cols = table
            .w_child("tblGrid")
            .map(|g| g.w_children("gridCol").count())
            .unwrap_or(0);
        out.push(format!("\n[Table {t_idx}] {} rows x {cols} cols", rows.len()));

        for (r_idx, row) in rows.iter().enumerate() {
            let mut grid_col = 0usize;
            let mut cells = Vec::new();
            for cell in row.w_children("tc") {
                let text = cell_text(cell).trim().replace('\n', "\\n");
                if !text.is_empty() {
                    cells.push(format!("({r_idx},{grid_col}){text}"));
                }
                grid_col += grid_span(cell);
            }
            if !cells.is_empty() {
                out.push(cells.join(" | "));
            }
        }
    }
    out.join("\n")
}

fn grid_span(cell: &Element) -> usize {
    cell.w_child("tcPr")
        .and_then(|pr| pr.w_child("gridSpan"))
        .and_then(|span| span.attr("w:val"))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

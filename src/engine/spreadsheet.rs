//! Excel (`.xlsx`) extraction via calamine: one Markdown table per sheet.

use super::table::render_markdown_table;
use super::EngineError;
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

/// Render every sheet as `## {sheet}` followed by its used range as a table.
///
/// Fully empty rows are dropped; a sheet with no data keeps its heading so
/// the sheet list stays complete.
pub(crate) fn extract_xlsx(bytes: &[u8]) -> Result<String, EngineError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| EngineError::Spreadsheet(e.to_string()))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sections = Vec::with_capacity(names.len());

    for name in &names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| EngineError::Spreadsheet(format!("sheet '{name}': {e}")))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .collect();

        let table = render_markdown_table(&rows);
        if table.is_empty() {
            sections.push(format!("## {name}"));
        } else {
            sections.push(format!("## {name}\n\n{table}"));
        }
    }

    Ok(sections.join("\n\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

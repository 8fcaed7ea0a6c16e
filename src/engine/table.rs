//! GFM table rendering shared by the docx and spreadsheet extractors.

/// Render rows as a GitHub-flavoured Markdown table.
///
/// The first row becomes the header. Ragged rows are padded with empty cells,
/// pipes are escaped and embedded newlines collapse to spaces. Returns an
/// empty string when there are no rows.
pub(crate) fn render_markdown_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for col in 0..width {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(&escape_cell(cell));
            out.push_str(" |");
        }
        out.push('\n');
        if i == 0 {
            out.push('|');
            for _ in 0..width {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.truncate(out.trim_end().len());
    out
}

fn escape_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

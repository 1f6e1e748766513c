use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::ksis::export::error::{ExportError, Result};

/// Reads a two-column key → value table from the first sheet of a workbook.
///
/// The first row is treated as a header. Rows with a blank key or blank value
/// are skipped, surrounding whitespace is trimmed.
pub fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ExportError::InvalidWorkbook("workbook has no sheets".into()))?;
    let range = read_required_sheet(&mut workbook, &sheet)?;

    if range.width() < 2 && !range.is_empty() {
        return Err(ExportError::InvalidWorkbook(format!(
            "sheet '{sheet}' must have two columns"
        )));
    }

    let mut pairs = Vec::new();
    for row in range.rows().skip(1) {
        let key = cell_to_string(row.first());
        let value = cell_to_string(row.get(1));
        if key.trim().is_empty() || value.trim().is_empty() {
            continue;
        }
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(pairs)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ExportError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ExportError::from)?;
    Ok(range)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

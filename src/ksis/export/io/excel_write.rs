use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook};

use crate::ksis::export::error::Result;
use crate::ksis::export::table::SheetTable;

/// Writes the table as the single sheet of a new workbook at `path`.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.rows.is_empty() && has_table_headers(&table.columns) {
        let columns: Vec<TableColumn> = table
            .columns
            .iter()
            .map(|header| TableColumn::new().set_header(header))
            .collect();
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true).set_columns(&columns);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Like [`write_table`], but the file only appears at `path` once it is
/// completely written.
pub fn replace_table(path: &Path, table: &SheetTable) -> Result<()> {
    let staging = path.with_extension("xlsx.tmp");
    write_table(&staging, table)?;
    fs::rename(&staging, path)?;
    Ok(())
}

/// Excel tables need distinct, non-empty column headers.
fn has_table_headers(columns: &[String]) -> bool {
    !columns.is_empty()
        && columns.iter().enumerate().all(|(idx, header)| {
            !header.trim().is_empty()
                && !columns[..idx]
                    .iter()
                    .any(|earlier| earlier.eq_ignore_ascii_case(header))
        })
}

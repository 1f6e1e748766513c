use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ksis::export::error::Result;
use crate::ksis::export::table::SheetTable;

/// Spreadsheet applications need the byte-order mark to detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the table as comma-separated UTF-8 with a leading BOM.
pub fn write_csv(path: &Path, table: &SheetTable) -> Result<()> {
    let file = File::create(path)?;
    write_csv_to(BufWriter::new(file), table)
}

pub fn write_csv_to<W: Write>(mut writer: W, table: &SheetTable) -> Result<()> {
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use ksis_export::ExportError;
use ksis_export::io::csv_write::{UTF8_BOM, write_csv_to};
use ksis_export::io::{OutputFormat, export_stem, write_export};
use ksis_export::table::{SheetTable, sanitize_sheet_name};
use tempfile::tempdir;

fn results_table() -> SheetTable {
    let mut table = SheetTable::new(
        "Results",
        ["Competition", "Session", "Name", "Club", "YOB", "Score", "Date", "Vault"]
            .iter()
            .map(|column| column.to_string())
            .collect(),
    );
    table.rows = vec![
        vec!["Coupe Québec", "Niveau 3", "Éloïse Tremblay", "Gymnix", "2012", "35,250", "2025-03-08", ""],
        vec!["Coupe Québec", "Niveau 3", "Jane Doe", "Club, Inc.", "", "", "2025-03-08", "13.2"],
    ]
    .into_iter()
    .map(|row| row.into_iter().map(str::to_string).collect())
    .collect();
    table
}

#[test]
fn csv_starts_with_bom_and_quotes_as_needed() {
    let mut buffer = Vec::new();
    write_csv_to(&mut buffer, &results_table()).expect("csv written");

    assert!(buffer.starts_with(UTF8_BOM));
    let text = String::from_utf8(buffer[UTF8_BOM.len()..].to_vec()).expect("csv is UTF-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Competition,Session,Name,Club,YOB,Score,Date,Vault");
    assert_eq!(lines[1], "Coupe Québec,Niveau 3,Éloïse Tremblay,Gymnix,2012,\"35,250\",2025-03-08,");
    assert_eq!(lines[2], "Coupe Québec,Niveau 3,Jane Doe,\"Club, Inc.\",,,2025-03-08,13.2");
}

#[test]
fn xlsx_export_reads_back() {
    let temp_dir = tempdir().expect("temporary directory");

    let path = write_export(temp_dir.path(), "Coupe-202503081200", OutputFormat::Xlsx, &results_table())
        .expect("workbook written");

    assert_eq!(path, temp_dir.path().join("Coupe-202503081200.xlsx"));
    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opens");
    let range = workbook
        .worksheet_range("Results")
        .expect("sheet present")
        .expect("sheet reads");
    assert_eq!(range.get_size(), (3, 8));
    assert_eq!(range.get_value((0, 7)), Some(&DataType::String("Vault".to_string())));
    assert_eq!(
        range.get_value((1, 2)),
        Some(&DataType::String("Éloïse Tremblay".to_string()))
    );
    assert_eq!(range.get_value((2, 7)), Some(&DataType::String("13.2".to_string())));
}

#[test]
fn csv_export_lands_in_the_output_directory() {
    let temp_dir = tempdir().expect("temporary directory");

    let path = write_export(temp_dir.path(), "stem", OutputFormat::Csv, &results_table())
        .expect("csv written");

    assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("csv"));
    let bytes = std::fs::read(&path).expect("csv readable");
    assert!(bytes.starts_with(UTF8_BOM));
}

#[test]
fn missing_output_directory_is_an_error() {
    let temp_dir = tempdir().expect("temporary directory");
    let missing = temp_dir.path().join("nope");

    let error = write_export(&missing, "stem", OutputFormat::Csv, &results_table())
        .expect_err("directory is missing");

    assert!(matches!(error, ExportError::MissingOutputDir(path) if path == missing));
}

#[test]
fn file_stem_uses_competition_name_or_generic_prefix() {
    let now = NaiveDate::from_ymd_opt(2025, 3, 8)
        .and_then(|date| date.and_hms_opt(14, 5, 59))
        .expect("valid timestamp");

    assert_eq!(export_stem(&["Provincial Cup"], now), "Provincial Cup-202503081405");
    assert_eq!(export_stem(&["A/B"], now), "A-B-202503081405");
    assert_eq!(export_stem(&["A", "B"], now), "ksis-export-202503081405");
}

#[test]
fn sheet_names_are_made_valid() {
    assert_eq!(sanitize_sheet_name("Level 3: Session [1]"), "Level 3_ Session _1_");
    assert_eq!(sanitize_sheet_name("   "), "Sheet");
    assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
}

/// A header plus rows of cells, ready to be written as CSV or as a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(sheet_name: &str, columns: Vec<String>) -> Self {
        Self {
            sheet_name: sanitize_sheet_name(sheet_name),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a two-column table from key → value pairs.
    pub fn from_pairs(sheet_name: &str, headers: [&str; 2], pairs: &[(String, String)]) -> Self {
        let mut table = Self::new(sheet_name, headers.iter().map(|h| h.to_string()).collect());
        table.rows = pairs
            .iter()
            .map(|(key, value)| vec![key.clone(), value.clone()])
            .collect();
        table
    }
}

/// Excel rejects sheet names with `: \ / ? * [ ]`, quotes, or more than 31 characters.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return "Sheet".to_string();
    }

    trimmed.chars().take(31).collect()
}

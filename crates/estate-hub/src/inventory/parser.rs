use std::io::Read;

use super::domain::RawTable;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV header row is missing or empty")]
    MissingHeader,
    #[error("CSV header contains duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Reads a header row plus data rows. Cells are trimmed, short rows are padded and blank rows
/// dropped, so every stored row has exactly one cell per column.
pub(crate) fn parse_table<R: Read>(reader: R) -> Result<RawTable, ParseError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.replace(['\u{feff}', '\u{200b}'], "").trim().to_string())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Err(ParseError::MissingHeader);
    }
    for (index, column) in columns.iter().enumerate() {
        if !column.is_empty() && columns[..index].contains(column) {
            return Err(ParseError::DuplicateColumn(column.clone()));
        }
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let mut row: Vec<String> = record
            .iter()
            .take(columns.len())
            .map(str::to_string)
            .collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}

/// Parses spreadsheet numbers such as `1 250 000`, `1,250,000.50` or `12_500`.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|ch| !matches!(ch, ' ' | ',' | '_' | '\u{a0}' | '\u{202f}'))
        .collect();
    if compact.is_empty() {
        return None;
    }

    compact.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn pads_short_rows_and_skips_blank_lines() {
        let table = parse_table(Cursor::new(
            "\u{feff}Building,Unit,Price\nA, 101 ,100000\n,,\nB,202\n",
        ))
        .expect("parses");
        assert_eq!(table.columns, vec!["Building", "Unit", "Price"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["A".to_string(), "101".to_string(), "100000".to_string()],
                vec!["B".to_string(), "202".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn rejects_headerless_input() {
        match parse_table(Cursor::new("")) {
            Err(ParseError::MissingHeader) => {}
            other => panic!("expected missing header, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_columns() {
        match parse_table(Cursor::new("Price,price,Price\n1,2,3\n")) {
            Err(ParseError::DuplicateColumn(column)) => assert_eq!(column, "Price"),
            other => panic!("expected duplicate column, got {other:?}"),
        }
    }

    #[test]
    fn numbers_tolerate_grouping() {
        assert_eq!(parse_number("1 250 000"), Some(1_250_000.0));
        assert_eq!(parse_number("1,250,000.50"), Some(1_250_000.5));
        assert_eq!(parse_number("12_500"), Some(12_500.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("   "), None);
    }
}

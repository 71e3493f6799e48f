use crate::error::{ReportError, Result};
use crate::util::parse_likert_safe;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows with fewer cells than headers; padded with missing cells.
    pub short_rows: usize,
    /// Rows with more cells than headers; extra cells dropped.
    pub long_rows: usize,
    pub duplicate_headers: Vec<String>,
}

/// Survey answers as exported from the spreadsheet, column-major.
///
/// Every column holds exactly `row_count()` cells; blank cells are `None`.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    rows: usize,
}

impl SurveyTable {
    /// Build a table from header names and row-major cells, padding short
    /// rows and truncating long ones.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); width];
        let row_count = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().flatten());
            }
        }
        Self {
            headers,
            columns,
            rows: row_count,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Raw cells of the first column named `header`.
    pub fn column(&self, header: &str) -> Result<&[Option<String>]> {
        self.headers
            .iter()
            .position(|h| h == header)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| ReportError::ColumnNotFound {
                column: header.to_string(),
            })
    }

    /// Raw cells of the column at `position`, whatever its header.
    pub fn column_at(&self, position: usize) -> Result<&[Option<String>]> {
        self.columns
            .get(position)
            .map(Vec::as_slice)
            .ok_or_else(|| ReportError::ColumnNotFound {
                column: format!("#{}", position + 1),
            })
    }

    /// Column parsed as Likert answers; unparseable cells become `None`.
    pub fn responses(&self, header: &str) -> Result<Vec<Option<f64>>> {
        Ok(parse_cells(self.column(header)?))
    }

    pub fn responses_at(&self, position: usize) -> Result<Vec<Option<f64>>> {
        Ok(parse_cells(self.column_at(position)?))
    }
}

fn parse_cells(cells: &[Option<String>]) -> Vec<Option<f64>> {
    cells
        .iter()
        .map(|cell| parse_likert_safe(cell.as_deref()))
        .collect()
}

pub fn load_survey(path: &Path) -> Result<(SurveyTable, LoadReport)> {
    if !path.exists() {
        return Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "loading survey");
    read_survey(file, path)
}

/// Read a survey CSV from any reader; `origin` is only used in errors.
pub fn read_survey<R: Read>(reader: R, origin: &Path) -> Result<(SurveyTable, LoadReport)> {
    let csv_err = |source: csv::Error| ReportError::CsvParse {
        path: origin.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ReportError::EmptyInput {
            path: origin.to_path_buf(),
        });
    }

    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            warn!(header = header.as_str(), "duplicate column header; only the first is addressable by name");
            report.duplicate_headers.push(header.clone());
        }
    }

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        report.total_rows += 1;
        if record.len() < headers.len() {
            report.short_rows += 1;
        } else if record.len() > headers.len() {
            report.long_rows += 1;
        }
        let row = record
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                (!cell.is_empty()).then(|| cell.to_string())
            })
            .collect();
        rows.push(row);
    }

    if report.short_rows > 0 || report.long_rows > 0 {
        debug!(
            short_rows = report.short_rows,
            long_rows = report.long_rows,
            "normalized ragged rows"
        );
    }
    info!(
        rows = report.total_rows,
        columns = headers.len(),
        "survey loaded"
    );

    Ok((SurveyTable::from_rows(headers, rows), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn read(text: &str) -> Result<(SurveyTable, LoadReport)> {
        read_survey(text.as_bytes(), &PathBuf::from("inline.csv"))
    }

    #[test]
    fn reads_columns_and_parses_answers() {
        let (table, report) = read(
            "Carimbo,1.1 Inflação [Imediato (2025)]\n\
             2025-01-01,4\n\
             2025-01-02,-\n\
             2025-01-03,\n",
        )
        .unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(table.row_count(), 3);
        let answers = table.responses("1.1 Inflação [Imediato (2025)]").unwrap();
        assert_eq!(answers, vec![Some(4.0), None, None]);
    }

    #[test]
    fn ragged_rows_are_normalized() {
        let (table, report) = read("a,b\n1\n1,2,3\n").unwrap();
        assert_eq!(report.short_rows, 1);
        assert_eq!(report.long_rows, 1);
        assert_eq!(table.column("b").unwrap(), [None, Some("2".to_string())]);
    }

    #[test]
    fn identical_headers_stay_separate_by_position() {
        let (table, _) = read("x,x\n1,5\n").unwrap();
        assert_eq!(table.responses("x").unwrap(), vec![Some(1.0)]);
        assert_eq!(table.responses_at(1).unwrap(), vec![Some(5.0)]);
        assert!(matches!(
            table.column_at(2),
            Err(ReportError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn missing_column_is_an_error() {
        let (table, _) = read("a\n1\n").unwrap();
        assert!(matches!(
            table.responses("b"),
            Err(ReportError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(read(""), Err(ReportError::EmptyInput { .. })));
    }

    #[test]
    fn duplicate_headers_are_reported() {
        let (_, report) = read("x,x\n1,2\n").unwrap();
        assert_eq!(report.duplicate_headers, vec!["x".to_string()]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_survey(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }
}

use crate::error::{ReportError, Result};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

/// Create the report directory and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write rows as CSV with a header line taken from the serde field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let csv_err = |source: csv::Error| ReportError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for r in rows {
        wtr.serialize(r).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).map_err(|source| ReportError::JsonWrite {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, s).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Markdown table of the first `max_rows` rows.
pub fn render_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table_rows(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditRow;

    fn row(kind: &str) -> AuditRow {
        AuditRow {
            kind: kind.to_string(),
            code: "1.1".to_string(),
            header: "1.1 Inflação".to_string(),
            detail: String::new(),
        }
    }

    #[test]
    fn csv_uses_renamed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        write_csv(&path, &[row("excluded")]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.contains("Code"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.json");
        assert!(matches!(
            write_json(&path, &vec![1, 2]),
            Err(ReportError::Write { .. })
        ));
    }

    #[test]
    fn csv_into_missing_directory_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        assert!(matches!(
            write_csv(&path, &[row("a")]),
            Err(ReportError::CsvWrite { .. })
        ));
    }

    #[test]
    fn ensure_dir_reports_blocking_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        let err = ensure_dir(&file.join("reports")).unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
        assert!(std::error::Error::source(&err).is_some());
        ensure_dir(&dir.path().join("a").join("b")).unwrap();
    }

    #[test]
    fn preview_is_truncated() {
        let rows = vec![row("a"), row("b"), row("c")];
        let rendered = render_table_rows(&rows, 2);
        assert!(rendered.contains("| a"));
        assert!(!rendered.contains("| c"));
        assert_eq!(render_table_rows::<AuditRow>(&[], 2), "(no rows)");
    }
}

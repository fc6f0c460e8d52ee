//! CSV export of forecast tables

use super::summary::{summarize_by_duration, summarize_by_slab};
use crate::error::{ForecastError, Result};
use crate::projection::ForecastOutput;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const COHORTS_FILE: &str = "cohorts.csv";
pub const LIFECYCLE_FILE: &str = "lifecycle.csv";
pub const RETURNS_FILE: &str = "returns_log.csv";
pub const MONTHLY_FILE: &str = "monthly_summary.csv";
pub const YEARLY_FILE: &str = "yearly_summary.csv";
pub const BY_DURATION_FILE: &str = "by_duration.csv";
pub const BY_SLAB_FILE: &str = "by_slab.csv";

/// Write rows as CSV with a header taken from the serde field names
pub fn write_table<T: Serialize, W: Write>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write rows to a CSV file, creating or truncating it
pub fn write_table_to_path<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|e| ForecastError::io(path, e))?;
    write_table(file, rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write every table of a forecast into `dir`, returning the files written
pub fn write_forecast(dir: &Path, output: &ForecastOutput) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ForecastError::io(dir, e))?;

    let tables: [(&str, Box<dyn Fn(&Path) -> Result<()> + '_>); 7] = [
        (COHORTS_FILE, Box::new(|p: &Path| write_table_to_path(p, &output.cohorts))),
        (LIFECYCLE_FILE, Box::new(|p: &Path| write_table_to_path(p, &output.lifecycle.rows))),
        (RETURNS_FILE, Box::new(|p: &Path| write_table_to_path(p, &output.lifecycle.return_log))),
        (MONTHLY_FILE, Box::new(|p: &Path| write_table_to_path(p, &output.monthly))),
        (YEARLY_FILE, Box::new(|p: &Path| write_table_to_path(p, &output.yearly))),
        (BY_DURATION_FILE, Box::new(|p: &Path| {
            write_table_to_path(p, &summarize_by_duration(&output.cohorts))
        })),
        (BY_SLAB_FILE, Box::new(|p: &Path| {
            write_table_to_path(p, &summarize_by_slab(&output.cohorts))
        })),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, write) in &tables {
        let path = dir.join(name);
        write(&path)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{LifecycleRow, ReturnLogRow};

    #[test]
    fn test_header_uses_column_names() {
        let rows = vec![ReturnLogRow {
            source_month: 1,
            duration: 3,
            cohort_users: 100,
            returning_users: 76,
            churned_users: 24,
            return_month: 5,
            materialized: true,
        }];
        let mut buf = Vec::new();
        write_table(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Source Month,Duration,Cohort Users,Returning Users,Churned Users,Return Month,Materialized")
        );
        assert_eq!(lines.next(), Some("1,3,100,76,24,5,true"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let rows: Vec<LifecycleRow> = Vec::new();
        let mut buf = Vec::new();
        write_table(&mut buf, &rows).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_forecast_creates_all_files() {
        let config = crate::config::ForecastConfig::default();
        let output = crate::projection::run_forecast(&config).unwrap();

        let dir = std::env::temp_dir().join(format!("rosca_export_{}", std::process::id()));
        let written = write_forecast(&dir, &output).unwrap();
        assert_eq!(written.len(), 7);
        for path in &written {
            assert!(path.exists(), "missing {}", path.display());
        }

        let yearly = fs::read_to_string(dir.join(YEARLY_FILE)).unwrap();
        assert!(yearly.starts_with("Year,New Users"));
        assert_eq!(yearly.lines().count(), 6);

        fs::remove_dir_all(&dir).unwrap();
    }
}

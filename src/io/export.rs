//! Export a dataset (or a date slice of it) to CSV.
//!
//! The file is meant to open cleanly in spreadsheets: UTF-8 with a BOM, a
//! header row, the date column first, then the remaining columns in the order
//! the API returned them.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::domain::{Dataset, DateGranularity, Row, SourceId};
use crate::error::AppError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default export file name: `<source>_raw_<min>_<max>.csv`.
pub fn default_export_name(source: SourceId, dataset: &Dataset) -> PathBuf {
    let span = dataset
        .span()
        .map(|s| format!("{}_{}", s.min, s.max))
        .unwrap_or_else(|| "empty".to_string());
    PathBuf::from(format!("{}_raw_{span}.csv", source.slug().replace('-', "_")))
}

/// Write `rows` (all rows or a slice of `dataset`) to `path`.
pub fn write_dataset_csv(
    path: &Path,
    dataset: &Dataset,
    rows: &[Row],
    granularity: DateGranularity,
) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    file.write_all(UTF8_BOM)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    write_rows(file, dataset, rows, granularity)?;

    info!(path = %path.display(), rows = rows.len(), "exported csv");
    Ok(())
}

/// Write header + rows to any writer (no BOM).
pub fn write_rows<W: Write>(
    writer: W,
    dataset: &Dataset,
    rows: &[Row],
    granularity: DateGranularity,
) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(dataset.columns().len() + 1);
    header.push(dataset.date_column());
    header.extend(dataset.columns().iter().map(String::as_str));
    out.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(granularity.format(&row.date));
        record.extend(row.values.iter().map(format_cell));
        out.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

pub(crate) fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::io::normalize::normalize;

    fn dataset(field: &str, dates: &[&str]) -> Dataset {
        let records: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let mut rec = crate::domain::RawRecord::new();
                rec.insert(field.to_string(), json!(d));
                rec.insert("ir_1m".to_string(), json!(4.0 + i as f64 * 0.5));
                rec.insert("note".to_string(), if i == 0 { json!(null) } else { json!("x, y") });
                rec
            })
            .collect();
        normalize(
            &records,
            &[field],
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
        .unwrap()
        .dataset
    }

    #[test]
    fn daily_rows_use_full_dates() {
        let ds = dataset("end_of_day", &["2023-01-03", "2023-01-04"]);
        let mut buf = Vec::new();
        write_rows(&mut buf, &ds, ds.rows(), DateGranularity::Daily).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "end_of_day,ir_1m,note\n2023-01-03,4.0,\n2023-01-04,4.5,\"x, y\"\n"
        );
    }

    #[test]
    fn monthly_rows_use_year_month() {
        let ds = dataset("end_of_month", &["2023-02", "2023-03"]);
        let mut buf = Vec::new();
        write_rows(&mut buf, &ds, &ds.rows()[1..], DateGranularity::Monthly).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("end_of_month,ir_1m,note\n2023-03,"), "{text}");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn file_starts_with_bom_and_has_default_name() {
        let ds = dataset("end_of_day", &["2023-01-03", "2023-02-10"]);
        let name = default_export_name(SourceId::Hibor, &ds);
        assert_eq!(name, PathBuf::from("hibor_raw_2023-01-03_2023-02-10.csv"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        write_dataset_csv(&path, &ds, ds.rows(), DateGranularity::Daily).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
    }
}

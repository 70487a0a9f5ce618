//! Variable metadata table (`variable,label,unit`).
//!
//! A missing file is not an error: charts and the classifier fall back to the
//! raw variable codes. A file that exists but lacks the required columns is.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{VariableInfo, VariableMeta};
use crate::error::MetaError;

const REQUIRED: [&str; 3] = ["variable", "label", "unit"];

/// Load metadata from `path`, or an empty table when the file does not exist.
pub fn load_variable_meta(path: &Path) -> Result<VariableMeta, MetaError> {
    if !path.exists() {
        warn!(path = %path.display(), "variable metadata not found, using raw codes");
        return Ok(VariableMeta::empty());
    }

    let file = File::open(path).map_err(|e| MetaError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let meta = read_variable_meta(file, &path.display().to_string())?;
    info!(path = %path.display(), entries = meta.len(), "loaded variable metadata");
    Ok(meta)
}

/// Parse metadata from any reader. `origin` is only used in error messages.
pub fn read_variable_meta<R: std::io::Read>(reader: R, origin: &str) -> Result<VariableMeta, MetaError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| MetaError::Read {
            path: origin.to_string(),
            message: e.to_string(),
        })?
        .clone();
    let header_map = build_header_map(&headers);

    for column in REQUIRED {
        if !header_map.contains_key(column) {
            return Err(MetaError::MissingColumn {
                path: origin.to_string(),
                column,
            });
        }
    }

    let mut meta = VariableMeta::empty();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                // +2: header line plus 1-based numbering.
                warn!(line = idx + 2, error = %e, "skipping malformed metadata row");
                continue;
            }
        };

        let Some(code) = field(&record, &header_map, "variable").filter(|s| !s.is_empty()) else {
            continue;
        };
        let info = VariableInfo {
            label: field(&record, &header_map, "label")
                .filter(|s| !s.is_empty())
                .unwrap_or(code)
                .to_string(),
            unit: field(&record, &header_map, "unit").unwrap_or("").to_string(),
        };
        meta.insert_first(code, info);
    }

    Ok(meta)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn field<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_wins_and_bom_is_ignored() {
        let data = "\u{feff}Variable,Label,Unit\n\
                    ir_1m,HIBOR 1-month,% p.a.\n\
                    m1,Money supply M1,HK$ million\n\
                    ir_1m,Duplicate,bp\n";
        let meta = read_variable_meta(data.as_bytes(), "inline").unwrap();
        assert_eq!(meta.len(), 2);
        let info = meta.lookup("ir_1m");
        assert_eq!(info.label, "HIBOR 1-month");
        assert_eq!(info.unit, "% p.a.");
    }

    #[test]
    fn blank_label_falls_back_to_code() {
        let data = "variable,label,unit\nm2,,HK$ million\n";
        let meta = read_variable_meta(data.as_bytes(), "inline").unwrap();
        assert_eq!(meta.lookup("m2").label, "m2");
        assert_eq!(meta.lookup("m2").unit, "HK$ million");
    }

    #[test]
    fn missing_unit_column_is_rejected() {
        let data = "variable,label\nm1,Money\n";
        let err = read_variable_meta(data.as_bytes(), "inline").unwrap_err();
        assert_eq!(
            err,
            MetaError::MissingColumn {
                path: "inline".to_string(),
                column: "unit"
            }
        );
    }

    #[test]
    fn missing_file_is_empty_meta() {
        let dir = tempfile::tempdir().unwrap();
        let meta = load_variable_meta(&dir.path().join("nope.csv")).unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.csv");
        std::fs::write(&path, "variable,label,unit\nir_3m,HIBOR 3-month,%\n").unwrap();
        let meta = load_variable_meta(&path).unwrap();
        assert_eq!(meta.lookup("ir_3m").unit, "%");
    }
}

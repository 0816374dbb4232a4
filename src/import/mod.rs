use crate::error::{ImportError, Result};
use crate::models::{DailyRecord, RawDailyRecord};
use std::collections::BTreeMap;
use std::path::Path;

pub mod csv;
pub mod json;

/// Trait for reading day-series from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read raw records from the file, in file order
    fn import_file(&self, file_path: &Path) -> Result<Vec<RawDailyRecord>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Coordinates the format importers and turns raw rows into a clean series
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    /// Import a day-series file, auto-detecting the format.
    ///
    /// The result is normalized and sorted ascending by date.
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<DailyRecord>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<none>".to_string()),
            })?;

        tracing::debug!(
            path = %file_path.display(),
            format = importer.get_format_name(),
            "Importing day-series"
        );

        let raw = importer.import_file(file_path)?;
        let records = normalize_series(&raw)?;

        tracing::info!(
            path = %file_path.display(),
            days = records.len(),
            "Imported day-series"
        );

        Ok(records)
    }

    /// Check if any importer handles this file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers
            .iter()
            .any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize raw rows and order them by date.
///
/// Fails on a row without a date or on two rows for the same day.
pub fn normalize_series(raw: &[RawDailyRecord]) -> Result<Vec<DailyRecord>> {
    let mut by_date = BTreeMap::new();

    for (index, row) in raw.iter().enumerate() {
        let record = row
            .normalize()
            .ok_or(ImportError::MissingDate { index })?;

        if by_date.contains_key(&record.date) {
            return Err(ImportError::DuplicateDate {
                date: record.date.to_string(),
            }
            .into());
        }
        by_date.insert(record.date, record);
    }

    Ok(by_date.into_values().collect())
}

fn has_extension(file_path: &Path, extensions: &[&str]) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NutriRsError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn raw(date: Option<&str>, calories: Option<f64>) -> RawDailyRecord {
        RawDailyRecord {
            date: date.map(|d| d.parse().unwrap()),
            calories,
            ..RawDailyRecord::default()
        }
    }

    #[test]
    fn test_normalize_series_sorts_by_date() {
        let rows = vec![
            raw(Some("2024-03-03"), Some(1800.0)),
            raw(Some("2024-03-01"), None),
            raw(Some("2024-03-02"), Some(f64::NAN)),
        ];

        let records = normalize_series(&rows).unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
        assert_eq!(records[0].calories, dec!(0));
        assert_eq!(records[1].calories, dec!(0));
        assert_eq!(records[2].calories, dec!(1800));
    }

    #[test]
    fn test_duplicate_date_rejected() {
        let rows = vec![raw(Some("2024-03-01"), None), raw(Some("2024-03-01"), None)];
        let err = normalize_series(&rows).unwrap_err();
        assert!(matches!(
            err,
            NutriRsError::Import(ImportError::DuplicateDate { .. })
        ));
    }

    #[test]
    fn test_missing_date_rejected() {
        let rows = vec![raw(Some("2024-03-01"), None), raw(None, Some(100.0))];
        let err = normalize_series(&rows).unwrap_err();
        assert!(matches!(
            err,
            NutriRsError::Import(ImportError::MissingDate { index: 1 })
        ));
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ImportManager::new();

        let xml = temp_dir.path().join("week.xml");
        fs::write(&xml, "<days/>").unwrap();
        assert!(!manager.can_import_file(&xml));
        assert!(matches!(
            manager.import_file(&xml).unwrap_err(),
            NutriRsError::Import(ImportError::UnsupportedFormat { .. })
        ));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            manager.import_file(&missing).unwrap_err(),
            NutriRsError::Import(ImportError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_import_detects_format() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ImportManager::new();

        let json_path = temp_dir.path().join("week.JSON");
        fs::write(
            &json_path,
            r#"[{"date": "2024-03-02", "calories": 2100}, {"date": "2024-03-01", "protein": 90}]"#,
        )
        .unwrap();
        let records = manager.import_file(&json_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let csv_path = temp_dir.path().join("week.csv");
        fs::write(
            &csv_path,
            "date,calories,protein,carbs,fat,fiber,workouts_completed,workouts_planned\n\
             2024-03-01,2000,150,250,65,30,1,1\n",
        )
        .unwrap();
        let records = manager.import_file(&csv_path).unwrap();
        assert_eq!(records[0].workouts_completed, 1);
    }
}

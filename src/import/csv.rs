use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::RawDailyRecord;

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "date", &["date", "day", "logged_on"]);
        Self::add_mapping(
            &mut column_mapping,
            "calories",
            &["calories", "kcal", "energy", "energy_kcal"],
        );
        Self::add_mapping(&mut column_mapping, "protein", &["protein", "protein_g"]);
        Self::add_mapping(
            &mut column_mapping,
            "carbs",
            &["carbs", "carbs_g", "carbohydrates"],
        );
        Self::add_mapping(&mut column_mapping, "fat", &["fat", "fat_g", "fats"]);
        Self::add_mapping(&mut column_mapping, "fiber", &["fiber", "fiber_g", "fibre"]);
        Self::add_mapping(
            &mut column_mapping,
            "workouts_completed",
            &["workouts_completed", "workouts", "completed"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "workouts_planned",
            &["workouts_planned", "planned"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        ["%Y-%m-%d", "%Y/%m/%d"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }

    /// Read day records from any CSV source with a header row
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<RawDailyRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(parse_error)?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        if !headers.iter().any(|h| h == "date") {
            return Err(ImportError::ParseError {
                format: "CSV".to_string(),
                reason: "missing date column".to_string(),
            }
            .into());
        }

        let mut days = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(parse_error)?;
            days.push(Self::parse_row(&headers, &row, index + 2)?);
        }

        tracing::debug!(rows = days.len(), "Parsed CSV day-series");
        Ok(days)
    }

    fn parse_row(headers: &[String], row: &StringRecord, line: usize) -> Result<RawDailyRecord> {
        let mut day = RawDailyRecord::default();

        for (column, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }

            if column == "date" {
                day.date = Some(Self::parse_date(cell).ok_or_else(|| ImportError::ParseError {
                    format: "CSV".to_string(),
                    reason: format!("line {}: invalid date {:?}", line, cell),
                })?);
                continue;
            }

            let slot = match column.as_str() {
                "calories" => &mut day.calories,
                "protein" => &mut day.protein,
                "carbs" => &mut day.carbs,
                "fat" => &mut day.fat,
                "fiber" => &mut day.fiber,
                "workouts_completed" => &mut day.workouts_completed,
                "workouts_planned" => &mut day.workouts_planned,
                _ => continue,
            };

            *slot = Some(cell.parse::<f64>().map_err(|_| ImportError::ParseError {
                format: "CSV".to_string(),
                reason: format!("line {}: {} is not a number: {:?}", line, column, cell),
            })?);
        }

        Ok(day)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, &["csv"])
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<RawDailyRecord>> {
        let file = std::fs::File::open(file_path)?;
        self.parse_reader(file)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

fn parse_error(e: csv::Error) -> ImportError {
    ImportError::ParseError {
        format: "CSV".to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NutriRsError;

    #[test]
    fn test_standard_header() {
        let data = "date,calories,protein,carbs,fat,fiber,workouts_completed,workouts_planned\n\
                    2024-04-01,2100,140.5,260,70,32,1,1\n\
                    2024-04-02,,,,,,,\n";
        let days = CsvImporter::new().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].protein, Some(140.5));
        assert_eq!(days[0].workouts_planned, Some(1.0));
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 4, 2));
        assert_eq!(days[1].calories, None);
    }

    #[test]
    fn test_column_aliases_and_missing_columns() {
        let data = "Day, kcal ,Protein G\n2024/04/03,1800,95\n";
        let days = CsvImporter::new().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 4, 3));
        assert_eq!(days[0].calories, Some(1800.0));
        assert_eq!(days[0].protein, Some(95.0));
        assert_eq!(days[0].fiber, None);
    }

    #[test]
    fn test_bad_cells_are_parse_errors() {
        let importer = CsvImporter::new();

        let bad_number = "date,calories\n2024-04-01,lots\n";
        assert!(matches!(
            importer.parse_reader(bad_number.as_bytes()).unwrap_err(),
            NutriRsError::Import(ImportError::ParseError { .. })
        ));

        let bad_date = "date,calories\n01.04.2024,2000\n";
        assert!(importer.parse_reader(bad_date.as_bytes()).is_err());

        let no_date = "calories,protein\n2000,100\n";
        assert!(importer.parse_reader(no_date.as_bytes()).is_err());
    }
}

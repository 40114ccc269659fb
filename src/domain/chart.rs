// Chart table domain model - pivoted rows consumed by the rendering layer
use chrono::DateTime;
use chrono::format::{Item, StrftimeItems};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// One row per time-axis instant.
///
/// `values` holds a key for every sensor type present in the window; a missing
/// observation is `None` (serialized as `null`), never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub t: i64,
    pub index: usize,
    pub display_time: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl ChartRow {
    pub fn value(&self, sensor_type: &str) -> Option<f64> {
        self.values.get(sensor_type).copied().flatten()
    }

    pub fn has_column(&self, sensor_type: &str) -> bool {
        self.values.contains_key(sensor_type)
    }
}

/// Output of one pivot pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartTable {
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl ChartTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of the table keeping only the given columns, in the table's column order.
    pub fn restrict_to(&self, visible: &BTreeSet<String>) -> ChartTable {
        let columns: Vec<String> = self
            .columns
            .iter()
            .filter(|c| visible.contains(*c))
            .cloned()
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| ChartRow {
                t: row.t,
                index: row.index,
                display_time: row.display_time.clone(),
                values: row
                    .values
                    .iter()
                    .filter(|(key, _)| visible.contains(*key))
                    .map(|(key, value)| (key.clone(), *value))
                    .collect(),
            })
            .collect();

        ChartTable { columns, rows }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid display time format: {0:?}")]
pub struct InvalidTimeFormat(pub String);

/// Renders axis instants as the row's display time (UTC).
#[derive(Debug, Clone)]
pub struct TimeFormatter {
    pattern: String,
}

impl TimeFormatter {
    pub fn new(pattern: impl Into<String>) -> Result<Self, InvalidTimeFormat> {
        let pattern = pattern.into();
        // chrono panics when rendering an unknown specifier
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(InvalidTimeFormat(pattern));
        }
        Ok(Self { pattern })
    }

    pub fn format(&self, epoch_ms: i64) -> String {
        DateTime::from_timestamp_millis(epoch_ms)
            .map(|dt| dt.format(&self.pattern).to_string())
            .unwrap_or_default()
    }
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self {
            pattern: "%H:%M:%S".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: i64, index: usize, values: &[(&str, Option<f64>)]) -> ChartRow {
        ChartRow {
            t,
            index,
            display_time: String::new(),
            values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_row_serializes_flat_with_nulls() {
        let r = ChartRow {
            t: 1000,
            index: 0,
            display_time: "00:00:01".to_string(),
            values: [("pressure".to_string(), None), ("temp".to_string(), Some(20.0))]
                .into_iter()
                .collect(),
        };

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "t": 1000,
                "index": 0,
                "displayTime": "00:00:01",
                "pressure": null,
                "temp": 20.0
            })
        );
    }

    #[test]
    fn test_restrict_to_keeps_rows_and_drops_hidden_columns() {
        let table = ChartTable {
            columns: vec!["pH".to_string(), "temp".to_string()],
            rows: vec![
                row(1000, 0, &[("pH", Some(7.4)), ("temp", None)]),
                row(2000, 1, &[("pH", None), ("temp", Some(21.0))]),
            ],
        };

        let visible: BTreeSet<String> = ["temp".to_string()].into_iter().collect();
        let restricted = table.restrict_to(&visible);

        assert_eq!(restricted.columns, vec!["temp".to_string()]);
        assert_eq!(restricted.rows.len(), 2);
        assert!(!restricted.rows[0].has_column("pH"));
        assert!(restricted.rows[0].has_column("temp"));
        assert_eq!(restricted.rows[1].value("temp"), Some(21.0));
    }

    #[test]
    fn test_time_formatter() {
        let formatter = TimeFormatter::default();
        assert_eq!(formatter.format(3_723_000), "01:02:03");

        let formatter = TimeFormatter::new("%Y-%m-%d %H:%M:%S%.3f").unwrap();
        assert_eq!(formatter.format(1_500), "1970-01-01 00:00:01.500");

        assert!(TimeFormatter::new("%Q").is_err());
    }
}

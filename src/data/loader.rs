use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{EntityId, Year, YearDomain};
use crate::foundation::error::{DataJoinError, DataJoinResult};

/// A metric cell after numeric coercion.
///
/// Empty or non-numeric cells are kept as [`MetricValue::Missing`] so they can be excluded
/// explicitly instead of turning into NaN.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MetricValue {
    Number(f64),
    Missing { raw: String },
}

impl MetricValue {
    /// Coerce a raw cell.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && !s.is_empty() => Self::Number(v),
            _ => Self::Missing { raw: s.to_owned() },
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Missing { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub entity_id: EntityId,
    pub year: Year,
    pub metrics: BTreeMap<String, MetricValue>,
}

impl Record {
    pub fn new(entity_id: impl Into<EntityId>, year: Year) -> Self {
        Self {
            entity_id: entity_id.into(),
            year,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        let v = if value.is_finite() {
            MetricValue::Number(value)
        } else {
            MetricValue::Missing {
                raw: value.to_string(),
            }
        };
        self.metrics.insert(name.to_owned(), v);
        self
    }

    /// Numeric value of `name`, or `None` when absent or flagged missing.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(MetricValue::as_f64)
    }
}

/// Column mapping for CSV datasets.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub id_column: String,
    pub year_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            id_column: "name".to_owned(),
            year_column: "year".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// What the loader had to drop or flag while reading a dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped: Vec<SkippedRow>,
    pub missing_values: usize,
}

/// Records indexed by year and by entity.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    by_year: BTreeMap<Year, Vec<Record>>,
    by_entity: BTreeMap<EntityId, Vec<Record>>,
    metric_names: Vec<String>,
    report: LoadReport,
}

impl DataSet {
    /// Index already-typed records. Per-entity lists are sorted chronologically.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut by_year = BTreeMap::<Year, Vec<Record>>::new();
        let mut by_entity = BTreeMap::<EntityId, Vec<Record>>::new();
        let mut metric_names = Vec::<String>::new();
        let mut rows = 0usize;
        let mut missing_values = 0usize;

        for rec in records {
            rows += 1;
            for (name, v) in &rec.metrics {
                if !metric_names.iter().any(|m| m == name) {
                    metric_names.push(name.clone());
                }
                if matches!(v, MetricValue::Missing { .. }) {
                    missing_values += 1;
                }
            }
            by_entity
                .entry(rec.entity_id.clone())
                .or_default()
                .push(rec.clone());
            by_year.entry(rec.year).or_default().push(rec);
        }
        for list in by_entity.values_mut() {
            list.sort_by_key(|r| r.year);
        }

        Self {
            by_year,
            by_entity,
            metric_names,
            report: LoadReport {
                rows,
                skipped: Vec::new(),
                missing_values,
            },
        }
    }

    #[tracing::instrument(skip(path, opts), fields(path = %path.display()))]
    pub fn from_path(path: &Path, opts: &LoadOptions) -> DataJoinResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open dataset '{}'", path.display()))?;
        Self::from_reader(std::io::BufReader::new(f), opts)
    }

    /// Parse CSV with a header row. Unusable rows are skipped and reported, never fatal.
    pub fn from_reader<R: Read>(reader: R, opts: &LoadOptions) -> DataJoinResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("read csv header")?.clone();
        let col = |name: &str| -> DataJoinResult<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                DataJoinError::validation(format!("dataset has no '{name}' column"))
            })
        };
        let id_idx = col(&opts.id_column)?;
        let year_idx = col(&opts.year_column)?;

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            // Header is line 1.
            let line = i as u64 + 2;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    skipped.push(SkippedRow {
                        line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let id = row.get(id_idx).unwrap_or_default();
            if id.is_empty() {
                skipped.push(SkippedRow {
                    line,
                    reason: format!("empty '{}'", opts.id_column),
                });
                continue;
            }
            let raw_year = row.get(year_idx).unwrap_or_default();
            let Ok(year) = raw_year.parse::<i32>() else {
                skipped.push(SkippedRow {
                    line,
                    reason: format!("non-integer year '{raw_year}'"),
                });
                continue;
            };

            let mut rec = Record::new(id, Year(year));
            for (idx, (name, cell)) in headers.iter().zip(row.iter()).enumerate() {
                if idx == id_idx || idx == year_idx {
                    continue;
                }
                rec.metrics.insert(name.to_owned(), MetricValue::parse(cell));
            }
            records.push(rec);
        }

        if records.is_empty() {
            return Err(DataJoinError::data("dataset contains no usable rows"));
        }

        for s in &skipped {
            tracing::warn!(line = s.line, reason = %s.reason, "skipped dataset row");
        }

        let mut ds = Self::from_records(records);
        ds.report.skipped = skipped;
        tracing::debug!(
            rows = ds.report.rows,
            years = ds.by_year.len(),
            entities = ds.by_entity.len(),
            "loaded dataset"
        );
        Ok(ds)
    }

    /// Records for `year`, in file order. Empty when the year has no data.
    pub fn year(&self, year: Year) -> &[Record] {
        self.by_year.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records of one entity, chronologically.
    pub fn entity(&self, id: &EntityId) -> &[Record] {
        self.by_entity.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entities(&self) -> impl Iterator<Item = (&EntityId, &[Record])> {
        self.by_entity.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Smallest domain covering every year present.
    pub fn domain(&self) -> Option<YearDomain> {
        let min = *self.by_year.keys().next()?;
        let max = *self.by_year.keys().next_back()?;
        YearDomain::new(min, max).ok()
    }

    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// `(min, max)` over every numeric value of `metric`.
    pub fn metric_extent(&self, metric: &str) -> Option<(f64, f64)> {
        self.by_year
            .values()
            .flatten()
            .filter_map(|r| r.metric(metric))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/loader.rs"]
mod tests;

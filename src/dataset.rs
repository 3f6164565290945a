use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::config::DatasetColumns;
use crate::error::DatasetError;
use crate::resolver::normalize;

/// One row of the historical dataset
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub region: String,
    pub year: i32,
    pub annual: f64,
}

impl RegionRecord {
    pub fn new(region: impl Into<String>, year: i32, annual: f64) -> Self {
        RegionRecord {
            region: region.into(),
            year,
            annual,
        }
    }
}

/// Annual aggregate for one year of a region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualValue {
    pub year: i32,
    pub value: f64,
}

/// Read-only annual rainfall history keyed by normalized region name.
///
/// Region names are normalized on the way in, so the keys double as the
/// canonical catalog. Each region's history is sorted by year ascending and
/// holds at most one value per year.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    regions: BTreeMap<String, Vec<AnnualValue>>,
}

impl HistoricalDataset {
    /// Build from in-memory records. Names need not be normalized.
    pub fn from_records<I>(records: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        let mut regions: BTreeMap<String, BTreeMap<i32, f64>> = BTreeMap::new();

        for record in records {
            let region = normalize(&record.region);
            let years = regions.entry(region.clone()).or_default();
            match years.entry(record.year) {
                Entry::Occupied(_) => {
                    return Err(DatasetError::DuplicateYear {
                        region,
                        year: record.year,
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(record.annual);
                }
            }
        }

        let regions = regions
            .into_iter()
            .map(|(region, years)| {
                let history = years
                    .into_iter()
                    .map(|(year, value)| AnnualValue { year, value })
                    .collect();
                (region, history)
            })
            .collect();

        Ok(HistoricalDataset { regions })
    }

    /// Load a headered CSV file.
    ///
    /// Rows whose annual value is empty, `NA` or not a finite number are
    /// skipped; that year is simply absent from the region's history.
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &DatasetColumns) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines.next().ok_or(DatasetError::Empty)??;
        let headers: Vec<String> = split_csv_line(&header_line)
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let region_idx = column_index(&headers, &columns.region)?;
        let year_idx = column_index(&headers, &columns.year)?;
        let value_idx = column_index(&headers, &columns.value)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (offset, line) in lines.enumerate() {
            let line = line?;
            let line_no = offset + 2;
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_csv_line(&line);
            let region = field(&fields, region_idx, line_no)?;
            let year_text = field(&fields, year_idx, line_no)?;
            let year: i32 = year_text.parse().map_err(|_| DatasetError::Parse {
                line: line_no,
                message: format!("invalid year '{}'", year_text),
            })?;

            let value_text = field(&fields, value_idx, line_no)?;
            match parse_value(value_text) {
                Some(annual) => records.push(RegionRecord::new(region, year, annual)),
                None => {
                    debug!(line = line_no, region, year, value = value_text, "skipping row without annual value");
                    skipped += 1;
                }
            }
        }

        let dataset = Self::from_records(records)?;
        info!(
            path = %path.display(),
            regions = dataset.region_count(),
            records = dataset.record_count(),
            skipped,
            "loaded historical dataset"
        );
        Ok(dataset)
    }

    /// Canonical region names in ascending order.
    pub fn catalog(&self) -> impl Iterator<Item = &str> + '_ {
        self.regions.keys().map(String::as_str)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Year-ordered history of a canonical region; empty if unknown.
    pub fn history(&self, region: &str) -> &[AnnualValue] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The last `len` annual values of `region`, oldest first, or `None` when
    /// fewer than `len` years are recorded.
    pub fn trailing_window(&self, region: &str, len: usize) -> Option<Vec<f64>> {
        let history = self.history(region);
        if history.len() < len {
            return None;
        }
        Some(history[history.len() - len..].iter().map(|v| v.value).collect())
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn record_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn column_index(headers: &[String], column: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column.trim()))
        .ok_or_else(|| DatasetError::MissingColumn {
            column: column.to_string(),
        })
}

fn field(fields: &[String], idx: usize, line: usize) -> Result<&str, DatasetError> {
    fields.get(idx).map(|f| f.trim()).ok_or_else(|| DatasetError::Parse {
        line,
        message: format!("expected at least {} fields, found {}", idx + 1, fields.len()),
    })
}

fn parse_value(text: &str) -> Option<f64> {
    if text.is_empty() || text.eq_ignore_ascii_case("na") {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split one CSV line, honouring double-quoted fields and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

//! Zip-code keyed demographic statistics
//!
//! Loaded once (at training or service startup) and read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use super::{load_csv, require_column, ZIPCODE_COLUMN};
use crate::error::{RealtyError, Result};

/// Canonical string form of a zip code: parse as a float, truncate to an
/// integer, render as decimal text. `"98103"`, `"98103.0"` and `" 98103 "`
/// all map to `"98103"`.
pub fn canonical_zipcode(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    canonical_zipcode_from_f64(value)
}

pub(crate) fn canonical_zipcode_from_f64(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    if truncated.abs() >= i64::MAX as f64 {
        return None;
    }
    Some((truncated as i64).to_string())
}

/// Borrowed view of the statistics for one zip code
#[derive(Debug, Clone, Copy)]
pub struct DemographicsRecord<'a> {
    names: &'a [String],
    values: &'a [f64],
}

impl<'a> DemographicsRecord<'a> {
    /// Statistic name/value pairs, in the column order of the source table
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let names = self.names;
        let values = self.values;
        names.iter().map(String::as_str).zip(values.iter().copied())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Lookup table from canonical zip code to its demographic statistics
#[derive(Debug, Clone, Default)]
pub struct DemographicsIndex {
    attribute_names: Vec<String>,
    records: HashMap<String, Vec<f64>>,
}

impl DemographicsIndex {
    /// Build an index from `(zipcode, values)` pairs. Every value vector must
    /// line up with `attribute_names`.
    pub fn from_records<I, Z>(attribute_names: Vec<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Z, Vec<f64>)>,
        Z: AsRef<str>,
    {
        let mut index = Self {
            attribute_names,
            records: HashMap::new(),
        };
        for (zipcode, values) in records {
            index.insert(zipcode.as_ref(), values)?;
        }
        Ok(index)
    }

    /// Build an index from a demographics table with a `zipcode` column.
    /// Every other column is a statistic; nulls become 0.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        require_column(df, ZIPCODE_COLUMN)?;

        let zip_column = df.column(ZIPCODE_COLUMN)?.cast(&DataType::String)?;
        let zipcodes: Vec<Option<&str>> = zip_column.str()?.into_iter().collect();

        let stat_columns: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != ZIPCODE_COLUMN)
            .collect();

        let attribute_names: Vec<String> =
            stat_columns.iter().map(|c| c.name().to_string()).collect();

        let stat_values: Vec<Vec<f64>> = stat_columns
            .iter()
            .map(|column| -> Result<Vec<f64>> {
                let values = column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut index = Self {
            attribute_names,
            records: HashMap::with_capacity(df.height()),
        };

        for (row, zipcode) in zipcodes.iter().enumerate() {
            let Some(zipcode) = zipcode else { continue };
            let values = stat_values.iter().map(|col| col[row]).collect();
            index.insert(zipcode, values)?;
        }

        Ok(index)
    }

    /// Load and index a demographics CSV
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let df = load_csv(path)?;
        let index = Self::from_dataframe(&df)?;
        info!(
            path = %path.display(),
            zipcodes = index.len(),
            attributes = index.attribute_names.len(),
            "Loaded demographics"
        );
        Ok(index)
    }

    fn insert(&mut self, zipcode: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.attribute_names.len() {
            return Err(RealtyError::ShapeError {
                expected: format!("{} demographic values", self.attribute_names.len()),
                actual: format!("{} for zipcode {}", values.len(), zipcode),
            });
        }
        let key = canonical_zipcode(zipcode)
            .ok_or_else(|| RealtyError::DataError(format!("Unparseable zipcode in demographics: {zipcode}")))?;
        if self.records.insert(key.clone(), values).is_some() {
            return Err(RealtyError::DuplicateZipcode(key));
        }
        Ok(())
    }

    /// Statistics for a zip code, or `None` if the zip code is unknown
    pub fn lookup(&self, zipcode: &str) -> Option<DemographicsRecord<'_>> {
        let values = match self.records.get(zipcode) {
            Some(values) => values,
            None => self.records.get(&canonical_zipcode(zipcode)?)?,
        };
        Some(DemographicsRecord {
            names: &self.attribute_names,
            values,
        })
    }

    pub fn contains(&self, zipcode: &str) -> bool {
        self.lookup(zipcode).is_some()
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

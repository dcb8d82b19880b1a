//! Raw data loading and the training-side feature schema
//!
//! - [`demographics`] - zip-code keyed demographic lookup
//! - [`schema`] - sales/demographics merge and the ordered feature schema

pub mod demographics;
pub mod schema;

pub use demographics::{canonical_zipcode, DemographicsIndex, DemographicsRecord};
pub use schema::{FeatureSchema, SchemaBuilder, TrainingFrame};

use crate::error::{RealtyError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;

/// Join key shared by the sales and demographics tables
pub const ZIPCODE_COLUMN: &str = "zipcode";

/// Training target
pub const TARGET_COLUMN: &str = "price";

/// Columns taken from the raw sales table
pub const SALES_COLUMN_SELECTION: [&str; 9] = [
    "price",
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "sqft_above",
    "sqft_basement",
    "zipcode",
];

/// House attributes a client must supply to the simple prediction variant
pub const CORE_HOUSE_FEATURES: [&str; 8] = [
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "sqft_above",
    "sqft_basement",
    "zipcode",
];

/// Load a CSV file with a header row. Types are inferred over the whole file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RealtyError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let df = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Fail with [`RealtyError::MissingColumn`] unless `df` has a column called `name`.
pub fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(RealtyError::MissingColumn(name.to_string()))
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Replace the zipcode column with its canonical string form (see [`canonical_zipcode`]).
/// Values that cannot be interpreted as a zip code become null.
pub fn canonicalize_zipcodes(df: &mut DataFrame) -> Result<()> {
    require_column(df, ZIPCODE_COLUMN)?;

    let raw = df.column(ZIPCODE_COLUMN)?.cast(&DataType::String)?;
    let canonical: StringChunked = raw
        .str()?
        .into_iter()
        .map(|v| v.and_then(canonical_zipcode))
        .collect();

    df.with_column(canonical.with_name(ZIPCODE_COLUMN.into()).into_series())?;
    Ok(())
}

/// Extract a single column as `f64`. Nulls and values that do not cast become 0.
pub fn column_to_array1(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = df
        .column(name)
        .map_err(|_| RealtyError::MissingColumn(name.to_string()))?;
    let values: Array1<f64> = column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

/// Extract named columns into a row-major `Array2<f64>`, nulls filled with 0.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Array1<f64>> = col_names
        .iter()
        .map(|name| column_to_array1(df, name))
        .collect::<Result<Vec<_>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_integer_zipcodes() {
        let mut df = df!(
            "zipcode" => &[98103i64, 98004],
            "price" => &[1.0, 2.0]
        )
        .unwrap();
        canonicalize_zipcodes(&mut df).unwrap();

        let zips: Vec<Option<&str>> = df.column("zipcode").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(zips, vec![Some("98103"), Some("98004")]);
    }

    #[test]
    fn test_canonicalize_float_and_text_zipcodes() {
        let mut df = df!("zipcode" => &["98103.0", " 98004 ", "n/a"]).unwrap();
        canonicalize_zipcodes(&mut df).unwrap();

        let zips: Vec<Option<&str>> = df.column("zipcode").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(zips, vec![Some("98103"), Some("98004"), None]);
    }

    #[test]
    fn test_columns_to_array2_fills_nulls() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(3.0)],
            "b" => &[4i64, 5, 6]
        )
        .unwrap();

        let x = columns_to_array2(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[0, 0]], 4.0);
        assert_eq!(x[[1, 1]], 0.0);
        assert_eq!(x[[2, 1]], 3.0);
    }

    #[test]
    fn test_require_column() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(require_column(&df, "a").is_ok());
        assert!(matches!(
            require_column(&df, "zipcode"),
            Err(RealtyError::MissingColumn(c)) if c == "zipcode"
        ));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, RealtyError::IoError(_)));
    }
}

//! Shared fixtures: small synthetic sales and demographics tables on disk

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use sound_realty::server::{AppState, ServerConfig};
use sound_realty::training::{run_training, ModelType, TrainingConfig, TrainingOutcome};
use tempfile::TempDir;

/// zipcode, population, median income, median house value
pub const ZIPCODES: [(i64, f64, f64, f64); 4] = [
    (98103, 45_000.0, 80_000.0, 400_000.0),
    (98004, 30_000.0, 150_000.0, 900_000.0),
    (98115, 50_000.0, 90_000.0, 450_000.0),
    (98042, 40_000.0, 70_000.0, 300_000.0),
];

/// Present in sales, absent from demographics
pub const UNKNOWN_ZIPCODE: i64 = 98999;

pub const N_SALES: usize = 200;

pub struct Fixture {
    pub dir: TempDir,
    pub sales: PathBuf,
    pub demographics: PathBuf,
    pub model_dir: PathBuf,
}

impl Fixture {
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::new(&self.sales, &self.demographics).with_output_dir(&self.model_dir)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            model_dir: self.model_dir.clone(),
            demographics_path: self.demographics.clone(),
        }
    }
}

/// Price is linear in living area, bathrooms and the zip's house value
pub fn sale_price(sqft_living: f64, bathrooms: f64, house_value: f64) -> f64 {
    150.0 * sqft_living + 20_000.0 * bathrooms + 0.5 * house_value
}

pub fn demographics_csv() -> String {
    let mut csv = String::from("ppltn_qty,medn_hshld_incm_amt,hous_val_amt,zipcode\n");
    for (zip, population, income, value) in ZIPCODES {
        let _ = writeln!(csv, "{population},{income},{value},{zip}");
    }
    csv
}

pub fn sales_csv() -> String {
    let mut csv = String::from(
        "id,date,price,bedrooms,bathrooms,sqft_living,sqft_lot,floors,waterfront,sqft_above,sqft_basement,zipcode\n",
    );
    for i in 0..N_SALES {
        let (zip, house_value) = if i % 50 == 49 {
            (UNKNOWN_ZIPCODE, 0.0)
        } else {
            let (zip, _, _, value) = ZIPCODES[i % ZIPCODES.len()];
            (zip, value)
        };
        let bedrooms = 2 + (i / 7) % 4;
        let bathrooms = 1.0 + (i % 3) as f64 * 0.5;
        let sqft_living = 800 + (i * 37) % 3000;
        let sqft_lot = 4000 + (i * 53) % 6000;
        let floors = 1 + (i / 3) % 2;
        let sqft_basement = if i % 3 == 0 { 400 } else { 0 };
        // not an exact identity, so the linear fit stays well conditioned
        let sqft_above = sqft_living - sqft_basement - (i % 5) * 20;
        let price = sale_price(sqft_living as f64, bathrooms, house_value);
        let _ = writeln!(
            csv,
            "{id},20140502T000000,{price},{bedrooms},{bathrooms},{sqft_living},{sqft_lot},{floors},0,{sqft_above},{sqft_basement},{zip}",
            id = 1000 + i,
        );
    }
    csv
}

pub fn write_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    let sales = data_dir.join("kc_house_data.csv");
    let demographics = data_dir.join("zipcode_demographics.csv");
    std::fs::write(&sales, sales_csv()).unwrap();
    std::fs::write(&demographics, demographics_csv()).unwrap();

    let model_dir = dir.path().join("model");
    Fixture { dir, sales, demographics, model_dir }
}

pub fn train_fixture(fixture: &Fixture, model_type: ModelType) -> TrainingOutcome {
    run_training(&fixture.training_config().with_model(model_type)).unwrap()
}

/// Trained default model loaded into server state
pub fn trained_state() -> (Fixture, Arc<AppState>) {
    let fixture = write_fixture();
    train_fixture(&fixture, ModelType::KNN);
    let state = AppState::load(fixture.server_config()).unwrap();
    (fixture, Arc::new(state))
}

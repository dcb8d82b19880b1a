//! Sound Realty - house price estimation
//!
//! This crate trains a regression model on house sales joined with zip-code
//! demographics and serves price predictions over HTTP.
//!
//! # Modules
//!
//! ## Training
//! - [`data`] - CSV loading, demographics index, feature schema
//! - [`preprocessing`] - Feature scaling and correlation analysis
//! - [`training`] - Estimators, seeded split, evaluation, artifacts
//!
//! ## Serving
//! - [`inference`] - Feature preparation and prediction orchestration
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;

pub mod server;
pub mod cli;

pub use error::{RealtyError, Result};


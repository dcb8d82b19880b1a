//! Sound Realty CLI Module
//!
//! Command-line interface for training, serving and feature analysis.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::load_csv;
use crate::preprocessing::{FeatureRanker, ScalerType};
use crate::training::{
    run_training, DistanceMetric, FitStatus, ModelType, TrainingConfig, WeightScheme,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

/// `$1,234,567` style, rounded to whole dollars
fn format_money(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sound-realty")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "House price estimation: model training and prediction service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// House sales CSV
    #[arg(long, default_value = "data/kc_house_data.csv")]
    pub sales: PathBuf,

    /// Zip-code demographics CSV
    #[arg(long, default_value = "data/zipcode_demographics.csv")]
    pub demographics: PathBuf,

    /// Artifact output directory
    #[arg(short, long, default_value = "model")]
    pub output: PathBuf,

    /// Model type (knn, linear)
    #[arg(short, long, default_value = "knn")]
    pub model: String,

    /// Feature scaler (standard, minmax, robust, none)
    #[arg(long, default_value = "robust")]
    pub scaler: String,

    /// Neighbours for knn
    #[arg(short = 'k', long, default_value = "5")]
    pub neighbors: usize,

    /// Distance metric for knn (euclidean, manhattan)
    #[arg(long, default_value = "euclidean")]
    pub metric: String,

    /// Neighbour weighting for knn (uniform, distance)
    #[arg(long, default_value = "uniform")]
    pub weights: String,

    /// Held-out fraction
    #[arg(long, default_value = "0.25")]
    pub test_size: f64,

    /// Split seed
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

impl TrainArgs {
    pub fn to_config(&self) -> crate::Result<TrainingConfig> {
        let model_type: ModelType = self.model.parse()?;
        let scaler: ScalerType = self.scaler.parse()?;
        let metric: DistanceMetric = self.metric.parse()?;
        let weights: WeightScheme = self.weights.parse()?;

        Ok(TrainingConfig::new(&self.sales, &self.demographics)
            .with_output_dir(&self.output)
            .with_model(model_type)
            .with_scaler(scaler)
            .with_n_neighbors(self.neighbors)
            .with_metric(metric)
            .with_weights(weights)
            .with_test_size(self.test_size)
            .with_random_state(self.seed))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a price model and write its artifacts
    Train(TrainArgs),

    /// Start the prediction server
    Serve {
        /// Server port [env: API_PORT, default 5005]
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host [env: API_HOST, default 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Model artifact directory [env: MODEL_DIR]
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Zip-code demographics CSV [env: DEMOGRAPHICS_PATH]
        #[arg(long)]
        demographics: Option<PathBuf>,
    },

    /// Rank unused sales attributes by correlation with price
    RecommendFeatures {
        /// House sales CSV
        #[arg(long, default_value = "data/kc_house_data.csv")]
        sales: PathBuf,

        /// CSV whose columns are available at prediction time
        #[arg(long, default_value = "data/future_unseen_examples.csv")]
        future: PathBuf,

        /// Output JSON file
        #[arg(short, long, default_value = "feature_recommendations.json")]
        output: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");

    let config = args.to_config()?;

    step_run(&format!(
        "Training {} {}",
        args.model.cyan(),
        dim(&format!("({} scaling)", args.scaler))
    ));
    let start = Instant::now();
    let outcome = run_training(&config)?;
    step_done(&format!(
        "{} train / {} test rows in {:?}",
        outcome.n_train,
        outcome.n_test,
        start.elapsed()
    ));

    let report = &outcome.report;
    section("Evaluation");
    println!("  {:<24} {}", muted("Train R²"), format!("{:.4}", report.train_r2_score).white());
    println!("  {:<24} {}", muted("Test R²"), format!("{:.4}", report.test_r2_score).white().bold());
    println!("  {:<24} {}", muted("Mean absolute error"), format_money(report.mean_absolute_error).white());
    println!("  {:<24} {}", muted("Root mean squared error"), format_money(report.root_mean_squared_error).white());
    println!("  {:<24} {}", muted("Mean actual price"), format_money(report.mean_actual_price).white());
    println!("  {:<24} {}", muted("Mean predicted price"), format_money(report.mean_predicted_price).white());

    let status = report.fit_status.to_string();
    let status = match report.fit_status {
        FitStatus::GoodFit => ok(&status),
        FitStatus::Overfitted | FitStatus::Underfitted => status.yellow(),
    };
    println!("  {:<24} {}", muted("Fit status"), status.bold());

    match report.fit_status {
        FitStatus::Overfitted => tracing::warn!(
            gap = report.generalization_gap(),
            "Model is overfitted: train R² exceeds test R² by more than 0.1"
        ),
        FitStatus::Underfitted => tracing::warn!(
            test_r2 = report.test_r2_score,
            "Model is underfitted: test R² below 0.6"
        ),
        FitStatus::GoodFit => {}
    }

    println!();
    println!("  {} {}", muted("Artifacts"), outcome.output_dir.display().to_string().white());
    println!();
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model_dir: Option<PathBuf>,
    demographics: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::{has_model, run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }
    if let Some(path) = demographics {
        config.demographics_path = path;
    }

    if !has_model(&config.model_dir) {
        anyhow::bail!(
            "No trained model in {}. Run `sound-realty train` first.",
            config.model_dir.display()
        );
    }

    let (host, port) = (config.host.clone(), config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Sound Realty Price API".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict ", &format!("http://{}:{}/predict", host, port)));
    line_box(&kv("Simple  ", &format!("http://{}:{}/predict/simple", host, port)));
    line_box(&kv("Health  ", &format!("http://{}:{}/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

pub fn cmd_recommend_features(sales: PathBuf, future: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    section("Feature evaluation");

    step_run("Loading sales");
    let sales_df = load_csv(&sales)?;
    step_done(&format!("{} rows × {} cols", sales_df.height(), sales_df.width()));

    let ranker = FeatureRanker::new();
    let correlations = ranker.correlations(&sales_df)?;

    section("Current model features");
    for c in ranker.current_feature_correlations(&correlations) {
        println!("  {:<20} {}", muted(&c.feature), format!("{:.3}", c.correlation).white());
    }

    let available: Vec<String> = load_csv(&future)?
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let ranked = ranker.rank_unused(&correlations, &available);

    section("Best unused features");
    for (i, c) in ranked.iter().take(5).enumerate() {
        println!("  {}. {:<18} {}", i + 1, muted(&c.feature), format!("{:.3}", c.correlation).white());
    }

    let recommendations = ranker.recommend(&ranked, 3);
    section("Recommendations");
    println!("  Add these {} features to improve the model:", recommendations.top_3_features.len());
    for (i, feature) in recommendations.top_3_features.iter().enumerate() {
        let corr = recommendations
            .correlations
            .get(feature)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);
        println!("  {}. {} {}", i + 1, accent(feature), dim(&format!("(correlation: {corr:.3})")));
    }

    recommendations.save(&output)?;
    println!();
    println!("  {} {}", muted("Results saved to"), output.display().to_string().white());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.4), "$999");
        assert_eq!(format_money(1000.0), "$1,000");
        assert_eq!(format_money(1234567.89), "$1,234,568");
        assert_eq!(format_money(-45000.0), "-$45,000");
    }

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "hi".green());
        assert_eq!(strip_ansi(&colored), "hi");
    }

    #[test]
    fn test_cli_parses_train_defaults() {
        let cli = Cli::try_parse_from(["sound-realty", "train"]).unwrap();
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.model, "knn");
                assert_eq!(args.neighbors, 5);
                assert_eq!(args.test_size, 0.25);
                assert_eq!(args.seed, 42);

                let config = args.to_config().unwrap();
                assert_eq!(config.scaler, ScalerType::Robust);
                assert_eq!(config.metric, DistanceMetric::Euclidean);
                assert_eq!(config.weights, WeightScheme::Uniform);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_train_options_reach_config() {
        let cli = Cli::try_parse_from([
            "sound-realty", "train", "--scaler", "minmax", "--metric", "manhattan",
            "--weights", "distance", "-k", "9", "-o", "out",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.scaler, ScalerType::MinMax);
        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.weights, WeightScheme::Distance);
        assert_eq!(config.n_neighbors, 9);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_unknown_train_option_value_rejected() {
        let cli = Cli::try_parse_from(["sound-realty", "train", "--metric", "cosine"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert!(args.to_config().is_err());
    }
}

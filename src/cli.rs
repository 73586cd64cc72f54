//! Командная строка: serve / train / predict

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use crate::api;
use crate::config::{LogFormat, ServerConfig};
use crate::models::ForestParams;
use crate::pipeline::{PredictionService, TrainingConfig, TrainingPipeline, DEFAULT_TARGET_COLUMN};
use crate::types::{PredictionResponse, RawSpecRecord};

/// Оценка цены телефона по характеристикам
#[derive(Parser, Debug)]
#[command(name = "mobile-price", version, about, long_about = None)]
pub struct Cli {
    #[arg(long, global = true, env = "MOBILE_PRICE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Запустить HTTP API
    Serve(ServeArgs),
    /// Обучить модель и сохранить артефакты
    Train(TrainArgs),
    /// Одно предсказание по JSON записи
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "MOBILE_PRICE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "MOBILE_PRICE_PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, env = "MOBILE_PRICE_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV датасет
    #[arg(long, env = "MOBILE_PRICE_DATASET", default_value = "data/Mobiles Dataset (2025).csv")]
    pub data: PathBuf,

    #[arg(long, env = "MOBILE_PRICE_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_TARGET_COLUMN)]
    pub target_column: String,

    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    #[arg(long, default_value_t = 1)]
    pub min_samples_leaf: usize,

    #[arg(long)]
    pub max_features: Option<usize>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Доля строк для оценки качества (0 = без оценки)
    #[arg(long, default_value_t = 0.2)]
    pub holdout: f64,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, env = "MOBILE_PRICE_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// JSON запись или путь к файлу с ней
    #[arg(long)]
    pub input: String,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            artifacts_dir: args.artifacts_dir,
        }
    }
}

impl From<TrainArgs> for TrainingConfig {
    fn from(args: TrainArgs) -> Self {
        Self {
            dataset_path: args.data,
            artifacts_dir: args.artifacts_dir,
            target_column: args.target_column,
            forest: ForestParams {
                n_trees: args.trees,
                max_depth: args.max_depth,
                min_samples_split: args.min_samples_split,
                min_samples_leaf: args.min_samples_leaf,
                max_features: args.max_features,
                bootstrap: true,
                seed: args.seed,
            },
            holdout_fraction: args.holdout,
        }
    }
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let service = Arc::new(PredictionService::load(&config.artifacts_dir));
    if !service.is_ready() {
        tracing::warn!("Model not loaded, /predict will answer 503");
    }

    let app = api::router(service);
    let addr = config
        .socket_addr()
        .with_context(|| format!("Invalid host: {}", config.host))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn train(config: TrainingConfig) -> Result<()> {
    let report = TrainingPipeline::new(config)
        .run()
        .context("Training failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn predict(args: PredictArgs) -> Result<()> {
    let raw = if args.input.trim_start().starts_with('{') {
        args.input
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("Failed to read input file {}", args.input))?
    };
    let record: RawSpecRecord = serde_json::from_str(&raw).context("Input is not a JSON record")?;

    let service = PredictionService::load(&args.artifacts_dir);
    let prediction = service.predict(&record)?;
    println!("{}", serde_json::to_string(&PredictionResponse { prediction })?);
    Ok(())
}

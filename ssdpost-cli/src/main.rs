use clap::Parser;
use serde::{Deserialize, Serialize};
use ssdpost::{
    denormalize, detect, predict, BoxTable, Detection, DetectConfig, ImageShape, PredictConfig,
    PredictionView, PriorBox, PriorBoxes, ScaleFactors, SsdPostResult,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "SSD post-processing CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    #[default]
    Detect,
    Predict,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    confidence_threshold: f32,
    iou_threshold: f32,
    scale_factors: [f32; 4],
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            confidence_threshold: cfg.confidence_threshold,
            iou_threshold: cfg.iou_threshold,
            scale_factors: cfg.scale_factors.to_array(),
            parallel: cfg.parallel,
        }
    }
}

impl From<&DetectConfigJson> for DetectConfig {
    fn from(value: &DetectConfigJson) -> Self {
        Self {
            confidence_threshold: value.confidence_threshold,
            iou_threshold: value.iou_threshold,
            scale_factors: ScaleFactors::from_array(value.scale_factors),
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PredictConfigJson {
    num_classes: Option<usize>,
    class_threshold: f32,
    iou_threshold: f32,
    background_index: usize,
    scale_factors: [f32; 4],
    parallel: bool,
}

impl Default for PredictConfigJson {
    fn default() -> Self {
        let cfg = PredictConfig::default();
        Self {
            num_classes: None,
            class_threshold: cfg.class_threshold,
            iou_threshold: cfg.iou_threshold,
            background_index: cfg.background_index,
            scale_factors: cfg.scale_factors.to_array(),
            parallel: cfg.parallel,
        }
    }
}

impl PredictConfigJson {
    fn to_config(&self, score_columns: usize) -> PredictConfig {
        PredictConfig {
            num_classes: self.num_classes.unwrap_or(score_columns),
            class_threshold: self.class_threshold,
            iou_threshold: self.iou_threshold,
            background_index: self.background_index,
            scale_factors: ScaleFactors::from_array(self.scale_factors),
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    predictions_path: String,
    priors_path: String,
    output_path: Option<String>,
    mode: ModeConfig,
    /// `[height, width]` of the source image; boxes stay normalized if unset.
    original_shape: Option<[usize; 2]>,
    class_names: Vec<String>,
    detect: DetectConfigJson,
    predict: PredictConfigJson,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
    class_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,
    score: f32,
}

impl DetectionRecord {
    fn new(det: Detection, class_names: &[String]) -> Self {
        Self {
            x_min: det.corners.x_min,
            y_min: det.corners.y_min,
            x_max: det.corners.x_max,
            y_max: det.corners.y_max,
            class_id: det.class_id,
            class_name: class_names.get(det.class_id).cloned(),
            score: det.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<DetectionRecord>,
}

fn flatten_rows(rows: &[Vec<f32>], what: &str) -> Result<(Vec<f32>, usize), String> {
    let row_len = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|row| row.len() != row_len) {
        return Err(format!("{what}: all rows must have the same length"));
    }
    Ok((rows.iter().flatten().copied().collect(), row_len))
}

impl Config {
    /// Validated source image shape, if one is configured.
    fn image_shape(&self) -> SsdPostResult<Option<ImageShape>> {
        self.original_shape
            .map(|[height, width]| {
                let shape = ImageShape::new(height, width);
                shape.validate().map(|()| shape)
            })
            .transpose()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("ssdpost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.predictions_path.is_empty() || config.priors_path.is_empty() {
        return Err("predictions_path and priors_path must be set in the config".into());
    }

    let prior_rows: Vec<[f32; 4]> =
        serde_json::from_str(&fs::read_to_string(&config.priors_path)?)?;
    let priors: PriorBoxes = prior_rows
        .iter()
        .map(|p| PriorBox::new(p[0], p[1], p[2], p[3]))
        .collect();

    let prediction_rows: Vec<Vec<f32>> =
        serde_json::from_str(&fs::read_to_string(&config.predictions_path)?)?;
    let (flat, row_len) = flatten_rows(&prediction_rows, "predictions")?;
    let view = PredictionView::from_slice(&flat, row_len)?;
    let shape = config.image_shape()?;

    let boxes: Option<BoxTable> = match config.mode {
        ModeConfig::Detect => {
            let found = detect(view, &priors, &DetectConfig::from(&config.detect))?;
            match shape {
                Some(shape) => found.map(|boxes| denormalize(&boxes, shape)),
                None => found,
            }
        }
        ModeConfig::Predict => {
            let cfg = config.predict.to_config(view.num_classes());
            predict(view, &priors, shape.unwrap_or(ImageShape::new(1, 1)), &cfg)?
        }
    };

    let detections = boxes
        .as_ref()
        .map(|boxes| {
            boxes
                .detections()
                .map(|det| DetectionRecord::new(det, &config.class_names))
                .collect()
        })
        .unwrap_or_default();
    let output = Output { detections };
    tracing::info!(count = output.detections.len(), "detections written");
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

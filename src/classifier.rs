//! Human-vs-AI image classifier.
//!
//! The network is a ResNet50V2 binary classifier exported to ONNX. It takes an
//! NHWC `[1, size, size, 3]` float tensor and emits a single sigmoid value,
//! the probability that the image is AI-generated.

use anyhow::{anyhow, Context};
use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::prediction::PredictionResult;

pub trait Classifier: Send + Sync {
    fn descriptor(&self) -> &ModelDescriptor;

    fn classify(&self, image: &DynamicImage) -> anyhow::Result<PredictionResult>;
}

#[derive(Clone, Debug, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub input_size: u32,
    pub darkening_factor: f32,
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self {
            name: "ResNet50V2-AIvsHumanGenImages".to_string(),
            path: PathBuf::from("network.onnx"),
            input_size: default_input_size(),
            darkening_factor: default_darkening_factor(),
        }
    }
}

/// Verdict labels are fixed (`Manusia` / `AI`), so any other key, including a
/// label override, is rejected.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    pub name: String,
    #[serde(default = "default_file")]
    pub file: String,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_darkening_factor")]
    pub darkening_factor: f32,
}

fn default_file() -> String {
    "network.onnx".to_string()
}

fn default_input_size() -> u32 {
    512
}

fn default_darkening_factor() -> f32 {
    0.6
}

impl ModelDescriptor {
    /// Reads `model.toml` from `models_dir`. Without one, the defaults are
    /// used and the network is expected at `models_dir/network.onnx`.
    pub fn load(models_dir: &Path) -> anyhow::Result<Self> {
        let toml_path = models_dir.join("model.toml");
        if !toml_path.exists() {
            let mut descriptor = Self::default();
            descriptor.path = models_dir.join(&descriptor.path);
            return Ok(descriptor);
        }

        let contents = std::fs::read_to_string(&toml_path)
            .with_context(|| format!("Failed to read {:?}", toml_path))?;
        let parsed: ModelToml = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {:?}", toml_path))?;

        if parsed.input_size == 0 {
            return Err(anyhow!("input_size must be > 0 in {:?}", toml_path));
        }

        Ok(Self {
            name: parsed.name,
            path: models_dir.join(parsed.file),
            input_size: parsed.input_size,
            darkening_factor: parsed.darkening_factor,
        })
    }
}

pub fn decode_image(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    image::load_from_memory(bytes).context("Failed to decode image")
}

/// Converts to RGB, resizes to `size`x`size`, scales channels into [0, 1] and
/// multiplies by `darkening`. Output is laid out NHWC without the batch axis.
pub fn preprocess(image: &DynamicImage, size: u32, darkening: f32) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::CatmullRom);
    resized
        .into_raw()
        .into_iter()
        .map(|v| (v as f32 / 255.0) * darkening)
        .collect()
}

pub struct OnnxClassifier {
    descriptor: ModelDescriptor,
    // `run` needs `&mut Session`.
    session: Mutex<Session>,
}

impl OnnxClassifier {
    pub fn load(descriptor: ModelDescriptor) -> anyhow::Result<Self> {
        if !descriptor.path.exists() {
            return Err(anyhow!("ONNX file not found: {:?}", descriptor.path));
        }

        let session = Session::builder()
            .map_err(|e| anyhow!("Failed to create session builder: {}", e))?
            .with_intra_threads(2)
            .map_err(|e| anyhow!("Failed to configure session: {}", e))?
            .commit_from_file(&descriptor.path)
            .map_err(|e| anyhow!("Failed to load {:?}: {}", descriptor.path, e))?;

        info!(
            "[ai-or-human] Loaded model {} from {:?} (input {}x{})",
            descriptor.name, descriptor.path, descriptor.input_size, descriptor.input_size
        );

        Ok(Self {
            descriptor,
            session: Mutex::new(session),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    fn classify(&self, image: &DynamicImage) -> anyhow::Result<PredictionResult> {
        let size = self.descriptor.input_size;
        let input = preprocess(image, size, self.descriptor.darkening_factor);

        let tensor = Tensor::from_array((vec![1i64, size as i64, size as i64, 3], input))
            .map_err(|e| anyhow!("tensor creation error: {}", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| anyhow!("inference failed: {}", e))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("model produced no output tensor"))?;

        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("tensor extraction failed: {}", e))?;

        let prob_ai = *data
            .first()
            .ok_or_else(|| anyhow!("model output tensor is empty"))? as f64;

        debug!("[ai-or-human] raw model output: {}", prob_ai);

        Ok(PredictionResult::from_prob_ai(prob_ai))
    }
}

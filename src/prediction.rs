use serde::{Deserialize, Serialize};

/// Label the model uses for human-made images.
pub const HUMAN_LABEL: &str = "Manusia";
pub const AI_LABEL: &str = "AI";

/// One classification, as produced by the backend for a single request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub prediction: String,
    pub confidence: f64,
    pub prob_human: f64,
    pub prob_ai: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl PredictionResult {
    /// Derives the verdict from the model's AI probability. The image is
    /// called human only when `prob_human` strictly exceeds `prob_ai`.
    pub fn from_prob_ai(prob_ai: f64) -> Self {
        let prob_ai = prob_ai.clamp(0.0, 1.0);
        let prob_human = 1.0 - prob_ai;
        let prediction = if prob_human > prob_ai {
            HUMAN_LABEL
        } else {
            AI_LABEL
        };
        Self {
            prediction: prediction.to_string(),
            confidence: prob_human.max(prob_ai),
            prob_human,
            prob_ai,
            image_data: None,
        }
    }

    pub fn is_human(&self) -> bool {
        self.prediction == HUMAN_LABEL
    }
}

/// Response body as seen by the page. Every field is optional so that an
/// error-only body and a full result both deserialize.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PredictionPayload {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub prob_human: Option<f64>,
    #[serde(default)]
    pub prob_ai: Option<f64>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What a response amounts to once the `error` field has been checked.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Reported(String),
    Classified(PredictionResult),
}

impl PredictionPayload {
    /// A non-empty `error` wins over any result fields. Missing numeric
    /// fields read as zero.
    pub fn into_outcome(self) -> Outcome {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Outcome::Reported(error);
        }
        Outcome::Classified(PredictionResult {
            prediction: self.prediction.unwrap_or_default(),
            confidence: self.confidence.unwrap_or(0.0),
            prob_human: self.prob_human.unwrap_or(0.0),
            prob_ai: self.prob_ai.unwrap_or(0.0),
            image_data: self.image_data,
        })
    }
}

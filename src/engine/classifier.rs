//! Leaf disease classifier abstraction
//!
//! Both model variants sit behind [`Classifier`] so request handlers never
//! know which one is active. The variant is picked from configuration and
//! loaded once at startup.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::cnn::CnnClassifier;
use super::pipeline::PipelineClassifier;
use crate::config::ClassifierConfig;

/// Labels of the classical pipeline, in model output order
pub const PIPELINE_LABELS: [&str; 4] = ["blast", "blight", "tungro", "normal"];

/// Labels of the convolutional network, in model output order
pub const CNN_LABELS: [&str; 10] = [
    "bacterial_leaf_blight",
    "bacterial_leaf_streak",
    "bacterial_panicle_blight",
    "blast",
    "brown_spot",
    "dead_heart",
    "downy_mildew",
    "hispa",
    "normal",
    "tungro",
];

/// Which model variant is serving predictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Flattened 150x150 pixels into a linear scikit-learn model
    Pipeline,
    /// 224x224 NHWC batch into a convolutional network
    Cnn,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Pipeline => "pipeline",
            ClassifierKind::Cnn => "cnn",
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            ClassifierKind::Pipeline => &PIPELINE_LABELS,
            ClassifierKind::Cnn => &CNN_LABELS,
        }
    }
}

/// Predicted label with its confidence as a percentage in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    /// Pick the most probable label from a probability vector aligned with `labels`
    pub fn from_probabilities(labels: &[&str], probabilities: &[f32]) -> Result<Self> {
        if probabilities.len() != labels.len() {
            bail!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                labels.len()
            );
        }

        let (idx, max_prob) = crate::utils::math::argmax(probabilities)
            .context("model produced no usable scores")?;

        Ok(Self {
            label: labels[idx].to_string(),
            confidence: (f64::from(max_prob) * 100.0).clamp(0.0, 100.0),
        })
    }
}

/// A loaded, immutable leaf classifier
pub trait Classifier: Send + Sync {
    fn kind(&self) -> ClassifierKind;

    /// Label set the classifier can produce
    fn labels(&self) -> &'static [&'static str] {
        self.kind().labels()
    }

    /// Preprocess and classify a decoded image. Blocking.
    fn classify(&self, image: &DynamicImage) -> Result<Prediction>;
}

/// Load the configured classifier. Failure here is fatal for the process.
pub fn load_classifier(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    info!(
        "Loading {} classifier from {}",
        config.kind.as_str(),
        config.model.display()
    );
    let start = Instant::now();

    let classifier: Arc<dyn Classifier> = match config.kind {
        ClassifierKind::Pipeline => Arc::new(PipelineClassifier::load(&config.model)?),
        ClassifierKind::Cnn => Arc::new(CnnClassifier::load(&config.model, &config.device)?),
    };

    info!("Classifier ready in {:?}", start.elapsed());
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(ClassifierKind::Pipeline.as_str(), "pipeline");
        assert_eq!(ClassifierKind::Cnn.as_str(), "cnn");
    }

    #[test]
    fn test_label_sets() {
        assert_eq!(ClassifierKind::Pipeline.labels().len(), 4);
        assert_eq!(ClassifierKind::Cnn.labels().len(), 10);
        assert!(ClassifierKind::Cnn.labels().contains(&"blast"));
    }

    #[test]
    fn test_prediction_from_probabilities() {
        let prediction =
            Prediction::from_probabilities(&PIPELINE_LABELS, &[0.1, 0.2, 0.6, 0.1]).unwrap();

        assert_eq!(prediction.label, "tungro");
        assert!((prediction.confidence - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_prediction_rejects_wrong_length() {
        assert!(Prediction::from_probabilities(&PIPELINE_LABELS, &[0.5, 0.5]).is_err());
        assert!(Prediction::from_probabilities(&[], &[]).is_err());
    }

    #[test]
    fn test_load_missing_model_fails() {
        let config = ClassifierConfig {
            kind: ClassifierKind::Pipeline,
            model: PathBuf::from("does/not/exist.json"),
            device: "CPU".to_string(),
        };

        assert!(load_classifier(&config).is_err());
    }
}

//! Classical pipeline classifier
//!
//! Serves a multinomial linear model (optionally preceded by a standard
//! scaler) exported from scikit-learn as JSON:
//!
//! ```json
//! { "scaler": { "mean": [...], "scale": [...] },
//!   "coef": [[...], ...],
//!   "intercept": [...] }
//! ```
//!
//! `coef` holds one row of 67500 weights per label, in label order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::DynamicImage;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{Classifier, ClassifierKind, Prediction, PIPELINE_LABELS};
use super::preprocess::{preprocess_for_pipeline, PIPELINE_FEATURE_LEN};
use crate::utils::math::softmax;

/// On-disk pipeline model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineWeights {
    #[serde(default)]
    pub scaler: Option<ScalerWeights>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerWeights {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl PipelineWeights {
    /// All-zero weights with the given intercepts; the prediction then
    /// depends only on the intercepts
    pub fn with_intercept(intercept: Vec<f32>) -> Self {
        Self {
            scaler: None,
            coef: vec![vec![0.0; PIPELINE_FEATURE_LEN]; intercept.len()],
            intercept,
        }
    }
}

struct Scaler {
    mean: Array1<f32>,
    scale: Array1<f32>,
}

/// Linear classifier over flattened 150x150 RGB pixels
pub struct PipelineClassifier {
    coef: Array2<f32>,
    intercept: Array1<f32>,
    scaler: Option<Scaler>,
}

impl PipelineClassifier {
    /// Load weights from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open pipeline model {}", path.display()))?;
        let weights: PipelineWeights = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse pipeline model {}", path.display()))?;

        Self::from_weights(weights)
    }

    /// Validate weight shapes against the fixed label set and input size
    pub fn from_weights(weights: PipelineWeights) -> Result<Self> {
        let n_classes = PIPELINE_LABELS.len();

        ensure!(
            weights.coef.len() == n_classes && weights.intercept.len() == n_classes,
            "pipeline model has {} coefficient rows and {} intercepts, expected {}",
            weights.coef.len(),
            weights.intercept.len(),
            n_classes
        );
        for (idx, row) in weights.coef.iter().enumerate() {
            ensure!(
                row.len() == PIPELINE_FEATURE_LEN,
                "coefficient row {} has {} features, expected {}",
                idx,
                row.len(),
                PIPELINE_FEATURE_LEN
            );
        }

        let scaler = match weights.scaler {
            Some(s) => {
                ensure!(
                    s.mean.len() == PIPELINE_FEATURE_LEN && s.scale.len() == PIPELINE_FEATURE_LEN,
                    "scaler expects {} features",
                    PIPELINE_FEATURE_LEN
                );
                // Zero-variance features keep a unit scale, as in scikit-learn
                let scale = s
                    .scale
                    .into_iter()
                    .map(|v| if v == 0.0 { 1.0 } else { v })
                    .collect::<Vec<_>>();
                Some(Scaler {
                    mean: Array1::from_vec(s.mean),
                    scale: Array1::from_vec(scale),
                })
            }
            None => None,
        };

        let flat: Vec<f32> = weights.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((n_classes, PIPELINE_FEATURE_LEN), flat)?;

        Ok(Self {
            coef,
            intercept: Array1::from_vec(weights.intercept),
            scaler,
        })
    }

    /// Class probabilities for one feature row of shape (1, 67500)
    pub fn predict_proba(&self, features: &Array2<f32>) -> Result<Vec<f32>> {
        ensure!(
            features.shape() == [1, PIPELINE_FEATURE_LEN],
            "expected features of shape [1, {}], got {:?}",
            PIPELINE_FEATURE_LEN,
            features.shape()
        );

        let row = features.row(0);
        let x = match &self.scaler {
            Some(scaler) => (&row - &scaler.mean) / &scaler.scale,
            None => row.to_owned(),
        };

        let scores = self.coef.dot(&x) + &self.intercept;
        debug!("Pipeline decision scores: {:?}", scores);

        Ok(softmax(&scores.to_vec()))
    }
}

impl Classifier for PipelineClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Pipeline
    }

    fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let features = preprocess_for_pipeline(image);
        let probabilities = self.predict_proba(&features)?;
        Prediction::from_probabilities(&PIPELINE_LABELS, &probabilities)
    }
}



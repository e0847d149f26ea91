//! Convolutional network classifier
//!
//! Runs a Keras-trained network exported to ONNX or OpenVINO IR. The network
//! takes a `[1, 224, 224, 3]` NHWC batch scaled to [0, 1] and emits one score
//! per label.

use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, info};

use super::classifier::{Classifier, ClassifierKind, Prediction, CNN_LABELS};
use super::preprocess::{preprocess_for_cnn, CNN_INPUT_SIZE};
use super::runtime::CompiledNetwork;
use crate::utils::math::{is_probability_distribution, softmax};

/// Tolerance when deciding whether the network already applied softmax
const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

pub struct CnnClassifier {
    network: CompiledNetwork,
}

impl CnnClassifier {
    pub fn load(path: &Path, device: &str) -> Result<Self> {
        let network = CompiledNetwork::load(path, device)?;
        info!("CNN classifier running on {}", network.device());
        Ok(Self { network })
    }
}

impl Classifier for CnnClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Cnn
    }

    fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let (target_w, target_h) = CNN_INPUT_SIZE;
        let tensor = preprocess_for_cnn(image);
        let input = tensor
            .as_slice()
            .context("CNN input tensor is not contiguous")?;

        let output = self
            .network
            .infer(input, &[1, target_h as i64, target_w as i64, 3])?;
        debug!("CNN raw output: {:?}", output);

        Prediction::from_probabilities(&CNN_LABELS, &output_probabilities(&output))
    }
}

/// Networks exported without their final softmax emit logits
fn output_probabilities(output: &[f32]) -> Vec<f32> {
    if is_probability_distribution(output, DISTRIBUTION_TOLERANCE) {
        output.to_vec()
    } else {
        debug!("CNN output is not a distribution, applying softmax");
        softmax(output)
    }
}



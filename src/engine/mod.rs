//! Inference engine module
//!
//! Provides the leaf classifiers behind a single [`Classifier`] trait:
//! - Linear pipeline exported from scikit-learn (JSON weights)
//! - Convolutional network compiled with OpenVINO

pub mod classifier;
pub mod cnn;
pub mod pipeline;
pub mod preprocess;
pub mod runtime;

pub use classifier::{load_classifier, Classifier, ClassifierKind, Prediction};
pub use cnn::CnnClassifier;
pub use pipeline::{PipelineClassifier, PipelineWeights};

pub mod pipeline;
pub mod types;

pub use pipeline::ClassifyPipeline;
pub use types::{Label, Prediction, PredictionResponse, Probabilities};

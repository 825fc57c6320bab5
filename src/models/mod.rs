pub mod backbone;
pub mod head;
pub mod manager;

pub use backbone::{ClipBackbone, FeatureExtractor};
pub use head::ClassifierHead;
pub use manager::{ModelManager, ModelStats};

mod utils;
mod error;
pub mod data;
pub mod detection_runners;
pub mod common;

pub use crate::common::{ClassNames, Detection, DetectionBox, GridConfig};
pub use crate::data::{GridTensor, GridTensorView, TensorLayout};
pub use crate::detection_runners::{decode, DecodeReport, DetectionDecoder, DetectionPipeline, InferenceEngine};
pub use crate::error::DecodeError;

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

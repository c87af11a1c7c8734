pub mod activations;
pub mod detection_worker;
pub mod grid_decoder;
pub mod image_ops;
pub mod inference_process;
pub mod nms;

pub use detection_worker::*;
pub use grid_decoder::*;
pub use inference_process::*;

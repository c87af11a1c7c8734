mod grid_tensor;
mod preprocess_config;
mod time_calc;
pub mod send_channels;

pub use grid_tensor::*;
pub use preprocess_config::*;
pub use time_calc::TimeCalc;

mod class_names;
mod detection;
mod detection_box;
mod grid_config;

pub use class_names::*;
pub use detection::*;
pub use detection_box::*;
pub use grid_config::*;

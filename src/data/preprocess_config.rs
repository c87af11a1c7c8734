use serde::{Deserialize, Serialize};

/// How a frame whose size differs from the model input is brought to that size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFit {
    /// Keep the top-left `width x height` region.
    #[default]
    Crop,
    /// Bilinear resize of the whole frame.
    Resize,
}

/// Input preparation for a model expecting `[1, height, width, 3]` floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub width: u32,
    pub height: u32,
    pub fit: FrameFit,
    pub mean: f32,
    pub std: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: 416,
            height: 416,
            fit: FrameFit::Crop,
            mean: 0.,
            std: 1.,
        }
    }
}

impl PreprocessConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fit(mut self, fit: FrameFit) -> Self {
        self.fit = fit;
        self
    }

    /// Channel values become `(v - mean) / std`.
    pub fn with_normalization(mut self, mean: f32, std: f32) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Model input size must be positive, got {}x{}", self.width, self.height);
        }
        if !self.std.is_finite() || self.std == 0. {
            anyhow::bail!("Normalization std must be finite and non-zero, got {}", self.std);
        }
        Ok(())
    }
}

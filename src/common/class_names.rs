use std::path::Path;
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::utils;

/// Pascal VOC classes, in the index order the tiny-YOLO-v2 VOC head predicts them.
pub const VOC_CLASSES: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Ordered class names, indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassNames(Vec<String>);

impl Default for ClassNames {
    fn default() -> Self {
        Self::voc()
    }
}

impl From<Vec<String>> for ClassNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for ClassNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|x| x.to_string()).collect())
    }
}

impl std::ops::Deref for ClassNames {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ClassNames {
    pub fn voc() -> Self {
        Self::from(&VOC_CLASSES[..])
    }

    /// Placeholder names `# 0`, `# 1`, ... for models shipped without labels.
    pub fn generated(n: usize) -> Self {
        Self((0..n).map(|x| format!("# {}", x)).collect())
    }

    /// Reads one class name per line, skipping blank lines.
    pub fn from_labels_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let lines = utils::file_to_vec(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        let names: Vec<String> = lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        if names.is_empty() {
            anyhow::bail!("Labels file {} contains no class names", path.display());
        }
        Ok(Self(names))
    }

    /// Parses class names out of model metadata.
    ///
    /// String format: `{0: 'person', 1: 'bicycle', 2: 'sports ball', ..., 27: "yellow_lady's_slipper"}`
    pub fn from_metadata(metadata: &str) -> anyhow::Result<Self> {
        let re = Regex::new(r#"(['"])([-()\w '"]+)(['"])"#)?;
        let names: Vec<String> = re
            .captures_iter(metadata)
            .map(|caps| {
                let (_, [_, name, _]) = caps.extract();
                name.to_string()
            })
            .collect();

        if names.is_empty() {
            anyhow::bail!("No class names found in model metadata");
        }
        Ok(Self(names))
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.0.get(class_id).map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

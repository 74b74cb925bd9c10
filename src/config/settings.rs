use std::path::Path;

use serde::{Deserialize, Serialize};

/// Resolution strategy the inpaint service applies to large crops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HdStrategy {
    /// Process the crop at its native resolution.
    #[default]
    Original,
    /// Downscale before inpainting, upscale the result.
    Resize,
    /// Let the service tile the crop internally.
    Crop,
}

impl HdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HdStrategy::Original => "Original",
            HdStrategy::Resize => "Resize",
            HdStrategy::Crop => "Crop",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Inpaint service endpoint.
    pub inpaint_api_url: String,
    /// Padding added around each OCR box before it becomes a mask rectangle.
    pub box_padding_px: u32,
    /// Padding added around the mask bounding box when cropping the request.
    pub crop_padding_px: u32,
    /// Gaussian sigma for the feathered blend at the mask edge.
    pub feather_sigma: f32,
    /// Inpaint quality/speed tradeoff, passed through to the service.
    pub steps: u32,
    pub strategy: HdStrategy,
    /// Bounded wait for one service call, seconds.
    pub request_timeout_secs: u64,
    /// Maximum length of the undo timeline.
    pub history_limit: usize,
    /// Worker threads for batch jobs; 0 lets rayon decide.
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            inpaint_api_url: "http://127.0.0.1:8080/api/v1/inpaint".to_string(),
            box_padding_px: 6,
            crop_padding_px: 128,
            feather_sigma: 3.0,
            steps: 25,
            strategy: HdStrategy::Original,
            request_timeout_secs: 60,
            history_limit: 50,
            parallel_workers: 0,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::RetouchError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

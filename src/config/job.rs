use serde::Deserialize;

use crate::config::settings::{HdStrategy, Settings};
use crate::geometry::Rect;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// One batch regeneration job: a set of page images and the regions to
/// repair in each, written to an output directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub output: String,
    pub pages: Vec<JobPage>,
    // Per-job overrides over settings.yaml
    pub inpaint_api_url: Option<String>,
    pub box_padding_px: Option<u32>,
    pub crop_padding_px: Option<u32>,
    pub feather_sigma: Option<f32>,
    pub steps: Option<u32>,
    pub strategy: Option<HdStrategy>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPage {
    pub input: String,
    /// Regions to repair, each `[x, y, width, height]`.
    #[serde(default)]
    pub regions: Vec<[u32; 4]>,
}

impl JobPage {
    pub fn region_rects(&self) -> Vec<Rect> {
        self.regions
            .iter()
            .map(|&[x, y, w, h]| Rect::new(x, y, w, h))
            .collect()
    }
}

impl Job {
    /// Merge per-job overrides over the base settings.
    pub fn merged(&self, base: &Settings) -> Settings {
        let mut s = base.clone();
        if let Some(url) = &self.inpaint_api_url {
            s.inpaint_api_url = url.clone();
        }
        if let Some(v) = self.box_padding_px {
            s.box_padding_px = v;
        }
        if let Some(v) = self.crop_padding_px {
            s.crop_padding_px = v;
        }
        if let Some(v) = self.feather_sigma {
            s.feather_sigma = v;
        }
        if let Some(v) = self.steps {
            s.steps = v;
        }
        if let Some(v) = self.strategy {
            s.strategy = v;
        }
        if let Some(v) = self.request_timeout_secs {
            s.request_timeout_secs = v;
        }
        s
    }
}

pub mod client;
pub mod orchestrator;

pub use client::{HttpInpaintClient, InpaintBackend, InpaintOptions};
pub use orchestrator::{BlendedCrop, RegenJob, prepare};

// ジョブ単位: 画像読込 -> 並列ページ再生成 -> 出力書き込み

use std::path::PathBuf;

use rayon::prelude::*;

use crate::config::settings::Settings;
use crate::error::RetouchError;
use crate::geometry::Rect;
use crate::inpaint::client::HttpInpaintClient;
use crate::pipeline::page_processor::process_page;

/// One resolved batch job: page inputs with their repair regions, an
/// output directory, and the merged settings.
pub struct ResolvedJob {
    pub pages: Vec<ResolvedPage>,
    pub output_dir: PathBuf,
    pub settings: Settings,
}

pub struct ResolvedPage {
    pub input: PathBuf,
    pub regions: Vec<Rect>,
}

/// Result of processing a single job.
pub struct JobResult {
    pub output_dir: PathBuf,
    pub pages_processed: usize,
}

/// Run a single batch job through three phases.
///
/// Phase A: load page images (sequential)
/// Phase B: mask + regeneration (rayon parallel)
/// Phase C: write outputs (sequential)
pub fn run_job(job: &ResolvedJob) -> crate::error::Result<JobResult> {
    if job.pages.is_empty() {
        return Err(RetouchError::job("job has no pages"));
    }

    let client = HttpInpaintClient::from_settings(&job.settings)?;

    // --- Phase A: load (sequential) ---
    let mut loaded = Vec::with_capacity(job.pages.len());
    for page in &job.pages {
        let image = image::open(&page.input)
            .map_err(|e| {
                RetouchError::job(format!("failed to load {}: {e}", page.input.display()))
            })?
            .to_rgba8();
        loaded.push((page, image));
    }

    // --- Phase B: regeneration (rayon parallel) ---
    let run = || -> Vec<crate::error::Result<(PathBuf, image::RgbaImage)>> {
        loaded
            .into_par_iter()
            .map(|(page, image)| {
                // Pages without regions are copied through untouched.
                if page.regions.is_empty() {
                    return Ok((page.input.clone(), image));
                }
                let repaired = process_page(image, &page.regions, &job.settings, &client)?;
                Ok((page.input.clone(), repaired))
            })
            .collect()
    };
    let results = if job.settings.parallel_workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(job.settings.parallel_workers)
            .build()
            .map_err(|e| RetouchError::job(format!("failed to build worker pool: {e}")))?;
        pool.install(run)
    } else {
        run()
    };

    // --- Phase C: write outputs (sequential) ---
    std::fs::create_dir_all(&job.output_dir)?;
    let mut pages_processed = 0;
    for result in results {
        let (input, repaired) = result?;
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page");
        let out_path = job.output_dir.join(format!("{stem}_retouched.png"));
        repaired.save(&out_path)?;
        tracing::info!(input = %input.display(), output = %out_path.display(), "page written");
        pages_processed += 1;
    }

    Ok(JobResult {
        output_dir: job.output_dir.clone(),
        pages_processed,
    })
}

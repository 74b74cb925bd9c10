// 全ジョブ実行

use crate::pipeline::job_runner::{JobResult, ResolvedJob, run_job};

/// Run multiple jobs, collecting results.
/// One job failure does NOT prevent other jobs from running.
pub fn run_all_jobs(jobs: &[ResolvedJob]) -> Vec<crate::error::Result<JobResult>> {
    jobs.iter().map(run_job).collect()
}

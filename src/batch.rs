//! Parallel fan-out of independent synthesis calls over scenarios and start dates.

use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalogue::NodeCatalogue;
use crate::config::GenerationParameters;
use crate::error::{GenerationError, Result};
use crate::generator::generate;
use crate::pattern::IrradiancePattern;

/// File listing the seed of every job.
pub const SEEDS_FILE: &str = "seeds_info.json";
/// File listing the error of every failed job.
pub const ERRORS_FILE: &str = "errors.json";

/// One synthesis call of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// `<start_date>_<scenario_id>`.
    pub key: String,
    pub scenario_id: String,
    pub start_date: NaiveDateTime,
    pub seed: u64,
}

impl BatchJob {
    /// Output directory of this job under `root`.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(self.start_date.format("%Y-%m-%d").to_string())
            .join(&self.scenario_id)
    }
}

/// Outcome of one job, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub key: String,
    pub scenario_id: String,
    pub start_date: String,
    pub seed: u64,
    /// `"ok"` or `"error"`.
    pub status: String,
    pub error: Option<String>,
    pub output: String,
}

/// Content of [`SEEDS_FILE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedsInfo {
    pub master_seed: u64,
    pub jobs: BTreeMap<String, u64>,
}

/// Counts and records of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub seeds_path: PathBuf,
    /// Set when at least one job failed.
    pub errors_path: Option<PathBuf>,
    pub jobs: Vec<BatchJobRecord>,
}

/// Scenario identifier zero-padded to the width of the scenario count.
pub fn scenario_id(index: usize, count: usize) -> String {
    let width = count.saturating_sub(1).to_string().len();
    format!("Scenario_{index:0width$}")
}

/// Lists the jobs of a batch and derives their seeds from `master_seed`.
///
/// Seeds are drawn scenario-major, then by start date, so the same master
/// seed and configuration always yield the same plan.
///
/// # Errors
///
/// Returns a configuration error if a batch start date is invalid.
pub fn plan_jobs(params: &GenerationParameters, master_seed: u64) -> Result<Vec<BatchJob>> {
    let dates = params.batch_start_dates()?;
    let count = params.batch.scenarios;
    let mut rng = StdRng::seed_from_u64(master_seed);
    let mut jobs = Vec::with_capacity(count * dates.len());
    for i in 0..count {
        let id = scenario_id(i, count);
        for start in &dates {
            jobs.push(BatchJob {
                key: format!("{}_{id}", start.format("%Y-%m-%d")),
                scenario_id: id.clone(),
                start_date: *start,
                seed: rng.random(),
            });
        }
    }
    Ok(jobs)
}

/// Runs every planned job on a worker pool and writes them under `output_root`.
///
/// Each job gets the configured window length shifted to its start date and
/// its own seed. A failing or panicking job does not stop the others; its
/// error is recorded under its key in [`ERRORS_FILE`].
///
/// # Errors
///
/// Returns an error only if the plan, the pool, the output root or the
/// summary files cannot be set up.
pub fn run_batch(
    params: &GenerationParameters,
    catalogue: &NodeCatalogue,
    pattern: &IrradiancePattern,
    master_seed: u64,
    output_root: &Path,
) -> Result<BatchSummary> {
    let jobs = plan_jobs(params, master_seed)?;
    fs::create_dir_all(output_root).map_err(|e| GenerationError::io(output_root, e))?;

    let seeds = SeedsInfo {
        master_seed,
        jobs: jobs.iter().map(|j| (j.key.clone(), j.seed)).collect(),
    };
    let seeds_path = output_root.join(SEEDS_FILE);
    write_json(&seeds_path, &seeds)?;

    let pool = ThreadPoolBuilder::new()
        .num_threads(params.batch.threads)
        .build()?;
    info!(
        jobs = jobs.len(),
        threads = pool.current_num_threads(),
        "starting batch"
    );

    let records: Vec<BatchJobRecord> = pool.install(|| {
        jobs.par_iter()
            .map(|job| run_job(job, params, catalogue, pattern, output_root))
            .collect()
    });

    let errors: BTreeMap<&str, &str> = records
        .iter()
        .filter_map(|r| r.error.as_deref().map(|e| (r.key.as_str(), e)))
        .collect();
    let failure = errors.len();
    let success = records.len() - failure;
    let errors_path = if errors.is_empty() {
        None
    } else {
        let path = output_root.join(ERRORS_FILE);
        write_json(&path, &errors)?;
        Some(path)
    };

    info!(success, failure, "batch finished");
    Ok(BatchSummary {
        success,
        failure,
        seeds_path,
        errors_path,
        jobs: records,
    })
}

fn run_job(
    job: &BatchJob,
    params: &GenerationParameters,
    catalogue: &NodeCatalogue,
    pattern: &IrradiancePattern,
    output_root: &Path,
) -> BatchJobRecord {
    let dir = job.output_dir(output_root);
    let mut job_params = params.clone();
    let window = params.time.end_date - params.time.start_date;
    job_params.time.start_date = job.start_date;
    job_params.time.end_date = job.start_date + window;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        generate(&job_params, catalogue, pattern, job.seed, Some(dir.as_path()))
    }));
    let error = match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };
    if let Some(e) = &error {
        warn!(job = %job.key, error = %e, "batch job failed");
    }

    BatchJobRecord {
        key: job.key.clone(),
        scenario_id: job.scenario_id.clone(),
        start_date: job.start_date.to_string(),
        seed: job.seed,
        status: if error.is_none() { "ok" } else { "error" }.to_string(),
        error,
        output: dir.display().to_string(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| GenerationError::io(path, e))
}

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::{FileManager, JobWorkspace};
use crate::render::{EncodePath, FfmpegToolchain, MediaToolchain, RenderOutcome, Renderer};
use crate::storage::{HttpStorage, Storage};

// @module: Job runner tying storage and rendering together

/// One burn-in request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSpec {
    /// Caller-chosen identifier; generated when absent
    #[serde(default)]
    pub job_id: Option<String>,

    /// Source video URL or path
    #[serde(default)]
    pub video_url: Option<String>,

    /// SRT captions URL or path
    #[serde(default)]
    pub srt_url: Option<String>,

    /// Where to write the render; the configured output directory otherwise
    #[serde(default)]
    pub output_url: Option<String>,
}

// Queue events wrap the spec in `input`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobEnvelope {
    Event { input: JobSpec },
    Bare(JobSpec),
}

impl JobSpec {
    /// Parse either a bare spec or a `{"input": {...}}` event
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: JobEnvelope = serde_json::from_str(json).context("Failed to parse job JSON")?;
        Ok(match envelope {
            JobEnvelope::Event { input } => input,
            JobEnvelope::Bare(spec) => spec,
        })
    }
}

/// Result record returned for every job, successful or not
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode_path: Option<EncodePath>,
    pub upscaled: bool,
}

/// Main application controller for burn-in jobs
#[derive(Debug, Clone)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    renderer: Renderer,
    storage: Arc<dyn Storage>,
}

impl Controller {
    // @method: Create a controller backed by ffmpeg and HTTP storage
    pub fn with_config(config: Config) -> Result<Self> {
        let toolchain = Arc::new(FfmpegToolchain::new(&config.encoder));
        let storage = Arc::new(
            HttpStorage::new(config.storage.clone()).context("Failed to initialise storage")?,
        );
        Self::with_collaborators(config, toolchain, storage)
    }

    /// Create a controller with explicit toolchain and storage implementations.
    ///
    /// Fails when the configuration does not validate.
    pub fn with_collaborators(
        config: Config,
        toolchain: Arc<dyn MediaToolchain>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let renderer = Renderer::new(&config, toolchain);
        Ok(Self {
            config,
            renderer,
            storage,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one job to completion.
    ///
    /// Never returns an error: every failure is reported as `ok: false`.
    pub async fn run_job(&self, spec: JobSpec) -> JobResult {
        let start_time = Instant::now();
        let job_id = spec
            .job_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let result = self.execute(&job_id, &spec).await;
        let duration_seconds = start_time.elapsed().as_secs_f64();

        match result {
            Ok((reference, outcome)) => {
                info!(
                    "Job {} finished in {} via {} path",
                    job_id,
                    Self::format_duration(duration_seconds),
                    outcome.encode_path
                );
                JobResult {
                    job_id,
                    ok: true,
                    output_reference: Some(reference),
                    error: None,
                    duration_seconds,
                    encode_path: Some(outcome.encode_path),
                    upscaled: outcome.job.upscaled,
                }
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                JobResult {
                    job_id,
                    ok: false,
                    output_reference: None,
                    error: Some(e.to_string()),
                    duration_seconds,
                    encode_path: None,
                    upscaled: false,
                }
            }
        }
    }

    /// Run jobs concurrently, at most `jobs.max_concurrent_jobs` at a time.
    ///
    /// Results are returned in input order.
    pub async fn run_batch(&self, specs: Vec<JobSpec>) -> Vec<JobResult> {
        let limit = self.config.jobs.max_concurrent_jobs.max(1);
        info!("Running {} job(s), {} at a time", specs.len(), limit);

        stream::iter(specs)
            .map(|spec| self.run_job(spec))
            .buffered(limit)
            .collect()
            .await
    }

    async fn execute(&self, job_id: &str, spec: &JobSpec) -> Result<(String, RenderOutcome), AppError> {
        let (video_location, srt_location) = match (non_empty(&spec.video_url), non_empty(&spec.srt_url)) {
            (Some(video), Some(srt)) => (video, srt),
            _ => return Err(AppError::InvalidJob("video_url and srt_url are required".to_string())),
        };
        if !is_safe_job_id(job_id) {
            return Err(AppError::InvalidJob(format!(
                "job_id '{}' may only contain letters, digits, '-' and '_'",
                job_id
            )));
        }

        // Dropped on every exit path, taking all job artifacts with it
        let workspace = JobWorkspace::create(&self.config.render.work_root, job_id)?;

        let video_path = workspace.input_video_path(&FileManager::extension_from_location(video_location, "mp4"));
        let caption_path = workspace.caption_path();

        self.storage.fetch(video_location, &video_path).await?;
        self.storage.fetch(srt_location, &caption_path).await?;

        let outcome = self.renderer.render(&workspace, &video_path, &caption_path).await?;

        if outcome.skipped_blocks > 0 {
            warn!("Job {}: {} caption block(s) skipped", job_id, outcome.skipped_blocks);
        }

        let output = &outcome.job.output_video_path;
        match self.storage.store(output, job_id, non_empty(&spec.output_url)).await {
            Ok(reference) => Ok((reference, outcome)),
            // The upload error is reported whether or not the render survives
            Err(source) => match self.keep_failed_artifact(output, &workspace) {
                Ok(kept_at) => Err(AppError::UploadFailedArtifactKept { source, kept_at }),
                Err(e) => {
                    error!("Job {}: render could not be kept: {:#}", job_id, e);
                    Err(AppError::UploadFailedArtifactLost {
                        source,
                        keep_error: format!("{:#}", e),
                    })
                }
            },
        }
    }

    // Move the render out of the workspace before it is deleted
    fn keep_failed_artifact(&self, artifact: &Path, workspace: &JobWorkspace) -> Result<PathBuf> {
        let kept_at = self
            .config
            .render
            .work_root
            .join("failed")
            .join(workspace.kept_artifact_name());
        FileManager::move_file(artifact, &kept_at)?;
        warn!("Job {}: render kept at {:?} for manual recovery", workspace.job_id(), kept_at);
        Ok(kept_at)
    }

    /// Format a duration in seconds as a human-readable string
    pub fn format_duration(seconds: f64) -> String {
        let total = seconds.max(0.0) as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let secs = total % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, secs)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, secs)
        } else {
            format!("{:.1}s", seconds.max(0.0))
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn is_safe_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= 128
        && job_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

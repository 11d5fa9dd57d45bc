/*!
 * Render orchestration.
 *
 * A render probes the source, decides the working resolution, transcodes the
 * captions for that canvas and burns them in. The encode is attempted on the
 * accelerated path first and retried exactly once on the software path:
 *
 * 1. probe (fatal on failure)
 * 2. working resolution (upscale below `min_height`)
 * 3. transcode SRT -> ASS into the job workspace
 * 4. accelerated encode
 * 5. software encode, only if 4 failed or was unavailable
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::app_config::{Config, EncoderConfig, RenderConfig};
use crate::errors::RenderError;
use crate::file_utils::{FileManager, JobWorkspace};
use crate::style_resolver::{LayoutParams, StyleResolver};
use crate::subtitle_processor;

pub mod encoder;
pub mod mock;
pub mod resolution;
pub mod toolchain;

pub use encoder::EncodeRequest;
pub use resolution::{Resolution, working_resolution};
pub use toolchain::{FfmpegToolchain, MediaToolchain};

/// The two encoder configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodePath {
    /// Hardware codec, opportunistic
    Accelerated,
    /// Portable fallback
    Software,
}

impl fmt::Display for EncodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accelerated => write!(f, "accelerated"),
            Self::Software => write!(f, "software"),
        }
    }
}

/// Paths and geometry of one render
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub input_video_path: PathBuf,
    pub input_caption_path: PathBuf,
    pub output_video_path: PathBuf,
    pub native_resolution: Resolution,
    pub working_resolution: Resolution,
    pub upscaled: bool,
}

/// What a successful render produced
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub job: RenderJob,
    pub layout: LayoutParams,
    /// Path that produced the output
    pub encode_path: EncodePath,
    pub cue_count: usize,
    pub skipped_blocks: usize,
}

/// Drives probe, transcode and encode for jobs.
///
/// Cloning is cheap; clones share the toolchain and the hardware encoder
/// permits, so concurrent jobs on one host never exceed `hardware_slots`
/// accelerated encodes.
#[derive(Debug, Clone)]
pub struct Renderer {
    toolchain: Arc<dyn MediaToolchain>,
    style: StyleResolver,
    render: RenderConfig,
    encoder: EncoderConfig,
    hardware_permits: Arc<Semaphore>,
}

impl Renderer {
    /// `hardware_slots` is clamped to what a semaphore can hold; zero becomes one
    pub fn new(config: &Config, toolchain: Arc<dyn MediaToolchain>) -> Self {
        let slots = config.encoder.hardware_slots.clamp(1, Semaphore::MAX_PERMITS);
        if slots != config.encoder.hardware_slots {
            warn!(
                "encoder.hardware_slots {} out of range, using {}",
                config.encoder.hardware_slots, slots
            );
        }

        Self {
            toolchain,
            style: StyleResolver::new(config.style.clone()),
            render: config.render.clone(),
            encoder: config.encoder.clone(),
            hardware_permits: Arc::new(Semaphore::new(slots)),
        }
    }

    /// Probe the source and decide the working resolution
    pub async fn plan(&self, workspace: &JobWorkspace, video: &Path, captions: &Path) -> Result<RenderJob, RenderError> {
        let native = self.toolchain.probe_dimensions(video).await?;
        let (working, upscaled) = working_resolution(native, self.render.min_height);

        if upscaled {
            info!(
                "Job {}: source {} is below {}p, upscaling to {}",
                workspace.job_id(), native, self.render.min_height, working
            );
        } else {
            debug!("Job {}: rendering at native {}", workspace.job_id(), native);
        }

        Ok(RenderJob {
            input_video_path: video.to_path_buf(),
            input_caption_path: captions.to_path_buf(),
            output_video_path: workspace.output_path(),
            native_resolution: native,
            working_resolution: working,
            upscaled,
        })
    }

    /// Run a full render inside `workspace`
    pub async fn render(&self, workspace: &JobWorkspace, video: &Path, captions: &Path) -> Result<RenderOutcome, RenderError> {
        let job = self.plan(workspace, video, captions).await?;

        let layout = self.style.resolve(job.working_resolution.width, job.working_resolution.height);

        let srt = String::from_utf8_lossy(&tokio::fs::read(&job.input_caption_path).await?).into_owned();
        let document = subtitle_processor::transcode(&srt, &layout, self.style.config());
        if document.cue_count == 0 {
            warn!("Job {}: no usable cues, the output will carry no captions", workspace.job_id());
        }
        let subtitle_path = workspace.styled_subtitle_path();
        tokio::fs::write(&subtitle_path, &document.content).await?;

        self.stage_fonts(workspace);

        let request = EncodeRequest {
            path: EncodePath::Accelerated,
            profile: self.encoder.accelerated.clone(),
            input: job.input_video_path.clone(),
            output: job.output_video_path.clone(),
            subtitle_path,
            fonts_dir: workspace.fonts_dir(),
            scale_to: job.upscaled.then_some(job.working_resolution),
        };

        let encode_path = self.encode_with_fallback(&request).await?;

        Ok(RenderOutcome {
            job,
            layout,
            encode_path,
            cue_count: document.cue_count,
            skipped_blocks: document.skipped.len(),
        })
    }

    // A missing font is not fatal, libass falls back to system fonts
    fn stage_fonts(&self, workspace: &JobWorkspace) {
        let Some(font_path) = &self.style.config().font_path else {
            return;
        };
        match FileManager::stage_fonts(font_path, workspace.fonts_dir()) {
            Ok(count) => debug!("Job {}: staged {} font file(s)", workspace.job_id(), count),
            Err(e) => warn!("Job {}: could not stage fonts: {:#}", workspace.job_id(), e),
        }
    }

    /// Accelerated attempt, then at most one software attempt
    async fn encode_with_fallback(&self, base: &EncodeRequest) -> Result<EncodePath, RenderError> {
        if self.accelerated_usable().await {
            let request = base.with_path(EncodePath::Accelerated, &self.encoder.accelerated);

            match self.hardware_permits.acquire().await {
                Ok(_permit) => {
                    info!("{} encoding {:?}", request.log_tag(), request.output);
                    match self.attempt(&request).await {
                        Ok(()) => return Ok(EncodePath::Accelerated),
                        Err(e) => warn!("{} failed, falling back to software: {}", request.log_tag(), e),
                    }
                }
                Err(e) => warn!("{} unavailable: {}", request.log_tag(), e),
            }
        }

        let request = base.with_path(EncodePath::Software, &self.encoder.software);
        info!("{} encoding {:?}", request.log_tag(), request.output);

        match self.attempt(&request).await {
            Ok(()) => Ok(EncodePath::Software),
            Err(e) => {
                warn!("{} failed: {}", request.log_tag(), e);
                Err(match e {
                    RenderError::EncodeFailed { .. } => e,
                    other => RenderError::EncodeFailed {
                        path: EncodePath::Software,
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    async fn accelerated_usable(&self) -> bool {
        if !self.encoder.prefer_hardware {
            debug!("Accelerated path disabled by configuration");
            return false;
        }
        if self.encoder.detect_hardware && !self.toolchain.has_encoder(&self.encoder.accelerated.codec).await {
            info!(
                "Encoder {} not available, using software path directly",
                self.encoder.accelerated.codec
            );
            return false;
        }
        true
    }

    // One attempt; partial output is removed on failure
    async fn attempt(&self, request: &EncodeRequest) -> Result<(), RenderError> {
        let result = match self.toolchain.encode(request).await {
            Ok(()) if output_is_present(&request.output).await => Ok(()),
            Ok(()) => Err(RenderError::EncodeFailed {
                path: request.path,
                message: "encoder reported success but produced no output".to_string(),
            }),
            Err(e) => Err(e),
        };

        if result.is_err() {
            match tokio::fs::remove_file(&request.output).await {
                Ok(()) => debug!("Removed partial output {:?}", request.output),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove partial output {:?}: {}", request.output, e),
            }
        }

        result
    }
}

async fn output_is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/*!
 * Capability interface over the external media tools.
 *
 * The orchestrator only talks to [`MediaToolchain`], so its fallback logic can
 * be exercised with [`crate::render::mock::FakeToolchain`] instead of spawning
 * real processes. [`FfmpegToolchain`] is the production implementation.
 */

use std::fmt::Debug;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;
use tokio::process::Command;

use crate::app_config::EncoderConfig;
use crate::errors::RenderError;
use crate::render::encoder::EncodeRequest;
use crate::render::resolution::Resolution;

/// Prober and encoder operations used by a render
#[async_trait]
pub trait MediaToolchain: Send + Sync + Debug {
    /// Native width and height of the first video stream
    async fn probe_dimensions(&self, path: &Path) -> Result<Resolution, RenderError>;

    /// Whether the encoder binary was built with `codec`
    async fn has_encoder(&self, codec: &str) -> bool;

    /// Run one encode attempt; any unsuccessful exit is an error
    async fn encode(&self, request: &EncodeRequest) -> Result<(), RenderError>;
}

/// Spawns `ffprobe` and `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegToolchain {
    ffmpeg: String,
    ffprobe: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

impl FfmpegToolchain {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            timeout: config.process_timeout_secs.map(Duration::from_secs),
        }
    }

    // Dropping the returned future kills the child process
    async fn run(&self, tool: &str, command: &mut Command) -> Result<Output, RenderError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let future = command.output();

        let output = match self.timeout {
            Some(limit) => tokio::select! {
                result = future => result?,
                _ = tokio::time::sleep(limit) => {
                    return Err(RenderError::Timeout {
                        tool: tool.to_string(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => future.await?,
        };

        Ok(output)
    }

    /// Filter ffmpeg stderr to only show meaningful error lines, stripping the
    /// version banner, build configuration, and stream metadata noise.
    pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let noise_prefixes = [
            "ffmpeg version",
            "built with",
            "configuration:",
            "lib",
            "Input #",
            "Metadata:",
            "Duration:",
            "Stream #",
            "Output #",
            "Stream mapping:",
            "Press [q]",
            "frame=",
            "size=",
        ];

        let meaningful: Vec<&str> = stderr
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
            })
            .collect();

        if meaningful.is_empty() {
            "unknown ffmpeg error (stderr was empty after filtering)".to_string()
        } else {
            // Keep the tail, that is where ffmpeg reports the failure
            let skip = meaningful.len().saturating_sub(12);
            meaningful[skip..].join("\n")
        }
    }

    fn parse_probe_output(stdout: &str) -> Result<Resolution, RenderError> {
        let parsed: ProbeOutput = serde_json::from_str(stdout)
            .map_err(|e| RenderError::ProbeFailed(format!("unreadable ffprobe output: {}", e)))?;

        let stream = parsed
            .streams
            .first()
            .ok_or_else(|| RenderError::ProbeFailed("no video stream found".to_string()))?;

        match (stream.width, stream.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Ok(Resolution::new(width, height)),
            _ => Err(RenderError::ProbeFailed(format!(
                "video stream has no usable dimensions ({:?}x{:?})",
                stream.width, stream.height
            ))),
        }
    }

    fn encoder_list_contains(listing: &str, codec: &str) -> bool {
        listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(codec))
    }
}

#[async_trait]
impl MediaToolchain for FfmpegToolchain {
    async fn probe_dimensions(&self, path: &Path) -> Result<Resolution, RenderError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args([
                "-v", "error",
                "-select_streams", "v:0",
                "-show_entries", "stream=width,height",
                "-of", "json",
            ])
            .arg(path);

        let output = self.run("ffprobe", &mut command).await.map_err(|e| match e {
            RenderError::Io(io) => RenderError::ProbeFailed(format!("failed to execute ffprobe: {}", io)),
            RenderError::Timeout { .. } => RenderError::ProbeFailed(e.to_string()),
            other => other,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffprobe failed: {}", stderr.trim());
            return Err(RenderError::ProbeFailed(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn has_encoder(&self, codec: &str) -> bool {
        let mut command = Command::new(&self.ffmpeg);
        command.args(["-hide_banner", "-encoders"]);

        match self.run("ffmpeg", &mut command).await {
            Ok(output) if output.status.success() => {
                Self::encoder_list_contains(&String::from_utf8_lossy(&output.stdout), codec)
            }
            Ok(output) => {
                debug!("ffmpeg -encoders exited with {}", output.status);
                false
            }
            Err(e) => {
                debug!("Could not list ffmpeg encoders: {}", e);
                false
            }
        }
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), RenderError> {
        let args = request.ffmpeg_args();
        debug!("{} {} {}", request.log_tag(), self.ffmpeg, args.join(" "));

        let mut command = Command::new(&self.ffmpeg);
        command.args(&args);

        let output = self
            .run("ffmpeg", &mut command)
            .await
            .map_err(|e| RenderError::EncodeFailed {
                path: request.path,
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let filtered = Self::filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
            return Err(RenderError::EncodeFailed {
                path: request.path,
                message: format!("ffmpeg exited with {}: {}", output.status, filtered),
            });
        }

        Ok(())
    }
}

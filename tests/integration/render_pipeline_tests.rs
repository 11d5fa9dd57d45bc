/*!
 * Integration tests for the render orchestrator with a scripted toolchain
 */

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use subburn::app_config::Config;
use subburn::file_utils::JobWorkspace;
use subburn::render::mock::FakeToolchain;
use subburn::render::{EncodePath, Renderer, Resolution};
use crate::common;

fn prepare(ws: &JobWorkspace) -> Result<(PathBuf, PathBuf)> {
    let video = ws.input_video_path("mp4");
    std::fs::write(&video, b"source video")?;
    let captions = common::create_test_subtitle(ws.root(), "sub_input.srt")?;
    Ok((video, captions))
}

/// Disabling hardware skips the accelerated attempt entirely
#[tokio::test]
async fn test_render_withSoftwareOnlyConfig_shouldNeverTryHardware() -> Result<()> {
    let root = common::create_temp_dir()?;
    let ws = JobWorkspace::create(root.path(), "sw")?;
    let (video, captions) = prepare(&ws)?;

    let mut config = Config::default();
    config.encoder.prefer_hardware = false;
    let fake = FakeToolchain::new(Resolution::new(1920, 1080));
    let renderer = Renderer::new(&config, Arc::new(fake.clone()));

    let outcome = renderer.render(&ws, &video, &captions).await?;

    assert_eq!(outcome.encode_path, EncodePath::Software);
    assert_eq!(fake.attempted_paths(), vec![EncodePath::Software]);
    Ok(())
}

/// The retry swaps only the codec settings
#[tokio::test]
async fn test_render_withFallback_shouldReuseFilterChainAndAudioCopy() -> Result<()> {
    let root = common::create_temp_dir()?;
    let ws = JobWorkspace::create(root.path(), "fb")?;
    let (video, captions) = prepare(&ws)?;

    let fake = FakeToolchain::new(Resolution::new(640, 360)).failing_accelerated();
    let renderer = Renderer::new(&Config::default(), Arc::new(fake.clone()));

    renderer.render(&ws, &video, &captions).await?;

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    let first = requests[0].ffmpeg_args();
    let second = requests[1].ffmpeg_args();

    assert!(first.windows(2).any(|w| w == ["-c:v", "h264_nvenc"]));
    assert!(second.windows(2).any(|w| w == ["-c:v", "libx264"]));
    assert!(second.windows(2).any(|w| w == ["-crf", "23"]));
    for args in [&first, &second] {
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
    }
    assert_eq!(requests[0].video_filter(), requests[1].video_filter());
    assert!(requests[1].video_filter().starts_with("scale=1280:720:flags=lanczos,subtitles=filename="));
    Ok(())
}

/// Portrait sources are upscaled on height and captions laid out for the new canvas
#[tokio::test]
async fn test_render_withPortraitSource_shouldKeepAspectAndEvenDimensions() -> Result<()> {
    let root = common::create_temp_dir()?;
    let ws = JobWorkspace::create(root.path(), "pt")?;
    let (video, captions) = prepare(&ws)?;

    let fake = FakeToolchain::new(Resolution::new(360, 640)).without_hardware();
    let renderer = Renderer::new(&Config::default(), Arc::new(fake.clone()));

    let outcome = renderer.render(&ws, &video, &captions).await?;

    // 640 is below 720, so the height is raised and the width follows
    assert!(outcome.job.upscaled);
    assert_eq!(outcome.job.working_resolution, Resolution::new(406, 720));
    assert_eq!(outcome.layout.canvas_width, 406);
    assert_eq!(outcome.layout.font_size, 40);
    assert_eq!(outcome.cue_count, 3);

    let ass = std::fs::read_to_string(ws.styled_subtitle_path())?;
    assert!(ass.contains("PlayResX: 406\nPlayResY: 720\n"));
    Ok(())
}

/// Plans report native geometry without encoding
#[tokio::test]
async fn test_plan_withHdSource_shouldNotUpscale() -> Result<()> {
    let root = common::create_temp_dir()?;
    let ws = JobWorkspace::create(root.path(), "pl")?;
    let (video, captions) = prepare(&ws)?;

    let fake = FakeToolchain::new(Resolution::new(1280, 720));
    let renderer = Renderer::new(&Config::default(), Arc::new(fake.clone()));

    let job = renderer.plan(&ws, &video, &captions).await?;

    assert!(!job.upscaled);
    assert_eq!(job.native_resolution, job.working_resolution);
    assert_eq!(job.output_video_path, ws.output_path());
    assert!(fake.requests().is_empty());
    Ok(())
}

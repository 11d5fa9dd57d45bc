/*!
 * Tests for file utilities and job workspaces
 */

use anyhow::Result;
use subburn::file_utils::{FileManager, JobWorkspace};
use crate::common;

/// Workspace paths are named after the job and removed on drop
#[test]
fn test_job_workspace_shouldNameArtifactsAndCleanUp() -> Result<()> {
    let root = common::create_temp_dir()?;

    let ws_root = {
        let ws = JobWorkspace::create(root.path(), "abc123")?;
        assert!(ws.fonts_dir().is_dir());
        assert!(ws.root().starts_with(root.path()));
        assert!(ws.input_video_path("mkv").ends_with("in_abc123.mkv"));
        assert!(ws.caption_path().ends_with("sub_abc123.srt"));
        assert!(ws.styled_subtitle_path().ends_with("sub_abc123.ass"));
        assert!(ws.output_path().ends_with("out_abc123.mp4"));
        std::fs::write(ws.output_path(), b"data")?;
        ws.root().to_path_buf()
    };

    assert!(!ws_root.exists());
    Ok(())
}

/// Two jobs never share a workspace, even with the same id
#[test]
fn test_job_workspace_withSameId_shouldBeDistinct() -> Result<()> {
    let root = common::create_temp_dir()?;
    let a = JobWorkspace::create(root.path(), "dup")?;
    let b = JobWorkspace::create(root.path(), "dup")?;
    assert_ne!(a.root(), b.root());
    Ok(())
}

/// Kept render names start with the job id and differ per workspace
#[test]
fn test_kept_artifact_name_withSameId_shouldBeDistinct() -> Result<()> {
    let root = common::create_temp_dir()?;
    let a = JobWorkspace::create(root.path(), "dup")?;
    let b = JobWorkspace::create(root.path(), "dup")?;

    let name_a = a.kept_artifact_name();
    assert!(name_a.starts_with("dup_") && name_a.ends_with(".mp4"), "got {}", name_a);
    assert_ne!(name_a, b.kept_artifact_name());
    Ok(())
}

/// A file in the way of a directory is an error, not a silent success
#[test]
fn test_ensure_dir_withFileInTheWay_shouldFail() -> Result<()> {
    let root = common::create_temp_dir()?;
    let blocker = common::create_test_file(root.path(), "failed", "x")?;
    assert!(FileManager::ensure_dir(&blocker).is_err());
    assert!(FileManager::move_file(root.path().join("missing"), blocker.join("a.mp4")).is_err());
    Ok(())
}

/// Fonts are staged from a directory, ignoring other files
#[test]
fn test_stage_fonts_withDirectory_shouldCopyFontFilesOnly() -> Result<()> {
    let src = common::create_temp_dir()?;
    common::create_test_file(src.path(), "Inter.ttf", "font")?;
    common::create_test_file(src.path(), "Mono.OTF", "font")?;
    common::create_test_file(src.path(), "README.txt", "not a font")?;
    let dest = common::create_temp_dir()?;

    let count = FileManager::stage_fonts(src.path(), dest.path())?;

    assert_eq!(count, 2);
    assert!(dest.path().join("Inter.ttf").exists());
    assert!(!dest.path().join("README.txt").exists());
    Ok(())
}

/// A missing font source is an error the caller can downgrade
#[test]
fn test_stage_fonts_withMissingSource_shouldFail() -> Result<()> {
    let dest = common::create_temp_dir()?;
    assert!(FileManager::stage_fonts("/no/such/font.ttf", dest.path()).is_err());
    Ok(())
}

/// Extensions come from the URL path, not the query string
#[test]
fn test_extension_from_location_withVariousInputs_shouldGuess() {
    let cases = [
        ("https://cdn.test/videos/clip.MOV?sig=abc.def", "mov"),
        ("https://cdn.test/videos/clip", "mp4"),
        ("/data/in/movie.mkv", "mkv"),
        ("file:///data/in/movie.webm", "webm"),
        ("relative.name.avi", "avi"),
    ];
    for (location, expected) in cases {
        assert_eq!(
            FileManager::extension_from_location(location, "mp4"),
            expected,
            "Failed for location: {}",
            location
        );
    }
}

/// Moving creates the target directory
#[test]
fn test_move_file_shouldCreateParentDirectories() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let from = common::create_test_file(dir.path(), "a.mp4", "video")?;
    let to = dir.path().join("failed").join("nested").join("a.mp4");

    FileManager::move_file(&from, &to)?;

    assert!(!from.exists());
    assert_eq!(std::fs::read_to_string(&to)?, "video");
    Ok(())
}

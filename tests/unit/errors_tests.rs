/*!
 * Tests for error types
 */

use std::path::PathBuf;
use subburn::errors::{AppError, RenderError, StorageError, SubtitleError, TimecodeError};
use subburn::render::EncodePath;

/// Encode failures name the path that failed
#[test]
fn test_render_error_display_shouldNamePath() {
    let err = RenderError::EncodeFailed {
        path: EncodePath::Software,
        message: "exit status 1".to_string(),
    };
    assert_eq!(err.to_string(), "Encode failed on software path: exit status 1");
}

/// Timestamp errors convert into block skip reasons
#[test]
fn test_subtitle_error_from_timecode_shouldWrap() {
    let err: SubtitleError = TimecodeError::MalformedTimestamp("1:2:3".to_string()).into();
    assert_eq!(err.to_string(), "Malformed timestamp: '1:2:3'");
}

/// Kept artifacts are mentioned in the job error
#[test]
fn test_upload_failed_artifact_kept_display_shouldIncludePath() {
    let err = AppError::UploadFailedArtifactKept {
        source: StorageError::UploadFailed("403 Forbidden".to_string()),
        kept_at: PathBuf::from("/work/failed/job1.mp4"),
    };
    assert_eq!(
        err.to_string(),
        "Upload failed: 403 Forbidden (render kept at /work/failed/job1.mp4)"
    );
}

/// A lost artifact still reports the upload error first
#[test]
fn test_upload_failed_artifact_lost_display_shouldKeepUploadError() {
    let err = AppError::UploadFailedArtifactLost {
        source: StorageError::UploadFailed("503 Service Unavailable".to_string()),
        keep_error: "Not a directory".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Upload failed: 503 Service Unavailable (render could not be kept: Not a directory)"
    );
}

/// Render and storage errors pass through transparently
#[test]
fn test_app_error_from_component_errors_shouldBeTransparent() {
    let err: AppError = RenderError::ProbeFailed("no video stream found".to_string()).into();
    assert_eq!(err.to_string(), "Probe failed: no video stream found");

    let err: AppError = StorageError::FetchFailed {
        location: "https://x.test/v.mp4".to_string(),
        message: "404".to_string(),
    }
    .into();
    assert_eq!(err.to_string(), "Failed to fetch 'https://x.test/v.mp4': 404");
}

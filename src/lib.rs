/*!
 * # subburn - burn SRT captions into video
 *
 * A Rust library for rendering timed captions permanently into video frames.
 *
 * ## Features
 *
 * - SRT to ASS transcoding with malformed blocks skipped, not fatal
 * - Typography that scales with the working resolution
 * - Balanced two-line wrapping with a controllable line gap
 * - Upscaling of low-resolution sources before burn-in
 * - Hardware encode with a single deterministic software retry
 * - Job runner that fetches inputs and publishes the render
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: SRT to ASS timestamp conversion
 * - `line_wrapper`: Balanced line breaking with ASS markup
 * - `style_resolver`: Layout parameters for a canvas size
 * - `subtitle_processor`: SRT parsing and ASS document generation
 * - `render`: Probe, resolution decision and encode fallback:
 *   - `render::toolchain`: ffprobe/ffmpeg behind the `MediaToolchain` trait
 *   - `render::encoder`: Encoder argument construction
 *   - `render::resolution`: Working resolution rules
 *   - `render::mock`: Scriptable toolchain for tests
 * - `storage`: Input fetching and output publishing
 * - `file_utils`: File system operations and job workspaces
 * - `app_controller`: Job runner
 * - `app_config`: Configuration management
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod line_wrapper;
pub mod render;
pub mod storage;
pub mod style_resolver;
pub mod subtitle_processor;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, JobResult, JobSpec};
pub use errors::{AppError, RenderError, StorageError, SubtitleError, TimecodeError};
pub use render::{EncodePath, Renderer, Resolution};
pub use storage::{HttpStorage, Storage};
pub use style_resolver::{LayoutParams, StyleResolver};
pub use subtitle_processor::{Caption, Cue, StyledDocument};

// @module: Encoder invocation building

use std::path::PathBuf;

use crate::app_config::CodecProfile;
use crate::render::EncodePath;
use crate::render::resolution::Resolution;

/// Everything the external encoder needs for one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    /// Accelerated or software configuration
    pub path: EncodePath,
    /// Codec and rate-control settings for `path`
    pub profile: CodecProfile,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Styled subtitle document to burn in
    pub subtitle_path: PathBuf,
    /// Directory searched for fonts before system fonts
    pub fonts_dir: PathBuf,
    /// Present when the source is upscaled before burn-in
    pub scale_to: Option<Resolution>,
}

impl EncodeRequest {
    /// Same request for a different encode path
    pub fn with_path(&self, path: EncodePath, profile: &CodecProfile) -> Self {
        Self {
            path,
            profile: profile.clone(),
            ..self.clone()
        }
    }

    /// Tag used in logs, e.g. `[software:libx264]`
    pub fn log_tag(&self) -> String {
        format!("[{}:{}]", self.path, self.profile.codec)
    }

    /// Filter chain: optional upscale, then subtitle burn-in with the job's font directory
    pub fn video_filter(&self) -> String {
        let mut filters = Vec::with_capacity(2);

        if let Some(target) = self.scale_to {
            filters.push(format!("scale={}:{}:flags=lanczos", target.width, target.height));
        }

        // Option values are escaped first, then the whole argument string for the graph parser
        let options = format!(
            "filename={}:fontsdir={}",
            escape_option_value(&self.subtitle_path.to_string_lossy()),
            escape_option_value(&self.fonts_dir.to_string_lossy()),
        );
        filters.push(format!("subtitles={}", escape_graph_args(&options)));

        filters.join(",")
    }

    /// Full ffmpeg argument list (without the binary)
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            self.input.to_string_lossy().into_owned(),
            "-vf".into(),
            self.video_filter(),
            "-c:v".into(),
            self.profile.codec.clone(),
        ];
        args.extend(self.profile.args.iter().cloned());
        // Audio is passed through untouched on both paths
        args.extend(["-c:a".to_string(), "copy".to_string()]);
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Escape a filter option value.
///
/// The option parser splits `key=value` pairs on `:` and strips one level of
/// backslash escaping, so `\\`, `'` and `:` must be escaped.
pub fn escape_option_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape a filter's argument string for the filtergraph parser.
///
/// The graph parser runs before the option parser and treats `[ ] , ;` as
/// structure, also stripping one level of backslash escaping.
pub fn escape_graph_args(args: &str) -> String {
    escape_chars(args, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

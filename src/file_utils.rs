use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// @module: File, font and per-job workspace utilities

// @const: Font file extensions libass can load
const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(());
        }
        if path.exists() {
            return Err(anyhow::anyhow!("Not a directory: {:?}", path));
        }
        fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        Ok(())
    }

    /// Find files with any of the given extensions below a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;

        Ok(())
    }

    /// Move a file, falling back to copy + delete across filesystems
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_err() {
            Self::copy_file(from, to)?;
            fs::remove_file(from).with_context(|| format!("Failed to remove {:?}", from))?;
        }

        Ok(())
    }

    /// Copy a font file, or every font file inside a directory, into `fonts_dir`.
    ///
    /// Returns the number of font files staged.
    pub fn stage_fonts<P1: AsRef<Path>, P2: AsRef<Path>>(source: P1, fonts_dir: P2) -> Result<usize> {
        let source = source.as_ref();
        let fonts_dir = fonts_dir.as_ref();

        let fonts = if source.is_dir() {
            Self::find_files(source, &FONT_EXTENSIONS)?
        } else if source.is_file() {
            vec![source.to_path_buf()]
        } else {
            return Err(anyhow::anyhow!("Font path does not exist: {:?}", source));
        };

        if fonts.is_empty() {
            warn!("No font files found in {:?}", source);
        }

        for font in &fonts {
            let Some(name) = font.file_name() else {
                continue;
            };
            Self::copy_file(font, fonts_dir.join(name))?;
        }

        Ok(fonts.len())
    }

    /// Guess a file extension from a URL or path, ignoring query strings
    pub fn extension_from_location(location: &str, fallback: &str) -> String {
        let path_part = match url::Url::parse(location) {
            Ok(url) if url.scheme().len() > 1 => url.path().to_string(),
            _ => location.to_string(),
        };

        Path::new(&path_part)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Temporary directory owning every artifact of one job.
///
/// The directory and its content are deleted when the workspace is dropped,
/// whichever way the job ends.
#[derive(Debug)]
pub struct JobWorkspace {
    job_id: String,
    dir: TempDir,
}

impl JobWorkspace {
    /// Create `<root>/job_<id>_XXXX/` with an empty `fonts/` subdirectory
    pub fn create<P: AsRef<Path>>(root: P, job_id: &str) -> Result<Self> {
        let root = root.as_ref();
        FileManager::ensure_dir(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("job_{}_", job_id))
            .tempdir_in(root)
            .with_context(|| format!("Failed to create job workspace in {:?}", root))?;

        let workspace = Self {
            job_id: job_id.to_string(),
            dir,
        };
        FileManager::ensure_dir(workspace.fonts_dir())?;

        debug!("Created workspace {:?}", workspace.root());
        Ok(workspace)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Downloaded source video
    pub fn input_video_path(&self, extension: &str) -> PathBuf {
        self.root().join(format!("in_{}.{}", self.job_id, extension))
    }

    /// Downloaded SRT captions
    pub fn caption_path(&self) -> PathBuf {
        self.root().join(format!("sub_{}.srt", self.job_id))
    }

    /// Transcoded ASS document
    pub fn styled_subtitle_path(&self) -> PathBuf {
        self.root().join(format!("sub_{}.ass", self.job_id))
    }

    /// Rendered video before it is handed to storage
    pub fn output_path(&self) -> PathBuf {
        self.root().join(format!("out_{}.mp4", self.job_id))
    }

    /// File name for a render that has to outlive this workspace.
    ///
    /// `<job_id>_<timestamp>_<suffix>.mp4`, where the suffix is the random part
    /// of the workspace directory, so repeated failures of one job id never collide.
    pub fn kept_artifact_name(&self) -> String {
        let dir_name = self
            .root()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = format!("job_{}_", self.job_id);
        let suffix = dir_name.strip_prefix(&prefix).unwrap_or(&dir_name);

        format!(
            "{}_{}_{}.mp4",
            self.job_id,
            chrono::Utc::now().format("%Y%m%dT%H%M%S"),
            suffix
        )
    }

    /// Directory passed to the subtitles filter as `fontsdir`
    pub fn fonts_dir(&self) -> PathBuf {
        self.root().join("fonts")
    }
}

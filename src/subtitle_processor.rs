use std::fmt;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::app_config::StyleConfig;
use crate::errors::SubtitleError;
use crate::line_wrapper;
use crate::style_resolver::LayoutParams;
use crate::timecode::Timecode;

// @module: SRT parsing and ASS document generation

// @const: SRT timing line, `start --> end`
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+?)\s*-->\s*(\S+)").unwrap()
});

// @const: SRT toggle tags with a direct ASS override (`<i>`, `</b>`, ...)
static STYLE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(/?)\s*([bius])\s*>").unwrap()
});

// @const: SRT font opening tag with its attributes
static FONT_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*font\b([^>]*)>").unwrap()
});

static FONT_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/\s*font\s*>").unwrap()
});

// @const: `color="#RRGGBB"` inside a font tag
static FONT_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)color\s*=\s*["']?#?([0-9a-f]{6})\b"#).unwrap()
});

/// Name of the single style every event references
pub const STYLE_NAME: &str = "Default";

// @struct: Single timed caption
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Sequence number as written in the source (1-based block position if absent)
    pub index: usize,

    // @field: Start time
    pub start: Timecode,

    // @field: End time, never before start
    pub end: Timecode,

    // @field: Text lines joined by single spaces
    pub text: String,
}

impl Cue {
    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(index: usize, start: Timecode, end: Timecode, text: &str) -> Result<Self, SubtitleError> {
        if end < start {
            return Err(SubtitleError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubtitleError::EmptyText);
        }

        Ok(Cue {
            index,
            start,
            end,
            text: trimmed.to_string(),
        })
    }

    /// Render as an ASS `Dialogue:` event, wrapping with `layout`
    pub fn to_event_line(&self, layout: &LayoutParams) -> String {
        let text = line_wrapper::wrap(
            &srt_markup_to_ass(&self.text),
            layout.max_line_chars,
            layout.spacer_size,
            layout.font_size,
        );
        format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}",
            self.start, self.end, STYLE_NAME, text
        )
    }
}

/// Convert SRT inline markup to ASS override blocks.
///
/// Literal braces are escaped first so they render as text instead of
/// opening an override block. `<i>`, `<b>`, `<u>` and `<s>` map to their
/// toggles, `<font color="#RRGGBB">` to a primary colour override (ASS
/// colours are BGR) and `</font>` back to the style colour. Font tags
/// without a colour are dropped; any other tag is left as text.
pub fn srt_markup_to_ass(text: &str) -> String {
    let escaped = text.replace('{', "\\{").replace('}', "\\}");

    let toggled = STYLE_TAG_REGEX.replace_all(&escaped, |caps: &Captures| {
        let state = if caps[1].is_empty() { 1 } else { 0 };
        format!("{{\\{}{}}}", caps[2].to_ascii_lowercase(), state)
    });

    let coloured = FONT_OPEN_REGEX.replace_all(&toggled, |caps: &Captures| {
        match FONT_COLOR_REGEX.captures(&caps[1]) {
            Some(colour) => {
                let rgb = colour[1].to_ascii_uppercase();
                format!("{{\\c&H{}{}{}&}}", &rgb[4..6], &rgb[2..4], &rgb[0..2])
            }
            None => String::new(),
        }
    });

    FONT_CLOSE_REGEX.replace_all(&coloured, "{\\c}").into_owned()
}

/// A source block that did not become a cue
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBlock {
    /// 1-based position of the block in the source
    pub block_number: usize,
    /// Why it was dropped
    pub reason: SubtitleError,
}

/// Ordered cues parsed from an SRT document
#[derive(Debug, Clone, Default)]
pub struct Caption {
    /// Cues in playback (source) order
    pub cues: Vec<Cue>,
    /// Blocks dropped during parsing
    pub skipped: Vec<SkippedBlock>,
}

impl Caption {
    /// Parse SRT content leniently.
    ///
    /// Malformed blocks are logged and recorded in `skipped`; they never
    /// fail the whole document. Cues keep source order.
    pub fn parse_srt(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut caption = Caption::default();

        for (i, block) in split_blocks(content).into_iter().enumerate() {
            let block_number = i + 1;
            match parse_block(&block, block_number) {
                Ok(cue) => caption.cues.push(cue),
                Err(reason) => {
                    warn!("Skipping subtitle block {}: {}", block_number, reason);
                    caption.skipped.push(SkippedBlock { block_number, reason });
                }
            }
        }

        debug!(
            "Parsed {} cue(s), skipped {} block(s)",
            caption.cues.len(),
            caption.skipped.len()
        );

        caption
    }

    /// Parse an SRT file from disk
    pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read caption file: {}", path.display()))?;
        Ok(Self::parse_srt(&String::from_utf8_lossy(&bytes)))
    }
}

// Blocks are runs of non-blank lines
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end_matches('\r'));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str], block_number: usize) -> Result<Cue, SubtitleError> {
    if lines.len() < 3 {
        return Err(SubtitleError::BlockTooShort { lines: lines.len() });
    }

    let caps = TIMING_LINE_REGEX
        .captures(lines[1])
        .ok_or_else(|| SubtitleError::MissingTimingLine(lines[1].trim().to_string()))?;

    let start: Timecode = caps[1].parse()?;
    let end: Timecode = caps[2].parse()?;

    let index = lines[0].trim().parse().unwrap_or(block_number);

    let text = lines[2..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Cue::new_validated(index, start, end, &text)
}

/// A complete ASS document ready to be written to the job workspace
#[derive(Debug, Clone)]
pub struct StyledDocument {
    /// Serialized document
    pub content: String,
    /// Number of `Dialogue:` events
    pub cue_count: usize,
    /// Blocks dropped from the source
    pub skipped: Vec<SkippedBlock>,
}

impl StyledDocument {
    /// Write the document to `path`
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.content)
            .with_context(|| format!("Failed to write styled subtitle file: {}", path.display()))
    }
}

impl fmt::Display for StyledDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Convert SRT content into a styled ASS document laid out for `layout`.
///
/// The canvas in the header is the layout's working resolution, which may be
/// larger than the source video.
pub fn transcode(srt: &str, layout: &LayoutParams, style: &StyleConfig) -> StyledDocument {
    let caption = Caption::parse_srt(srt);
    render_document(&caption, layout, style)
}

/// Serialize already-parsed cues
pub fn render_document(caption: &Caption, layout: &LayoutParams, style: &StyleConfig) -> StyledDocument {
    let mut content = String::with_capacity(1024 + caption.cues.len() * 96);

    // Writing to a String cannot fail
    let _ = write!(
        content,
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         WrapStyle: 2\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: {name},{font},{size},{primary},&H000000FF,{outline_colour},{back},0,0,0,0,100,100,0,0,1,{outline},{shadow},2,{margin_h},{margin_h},{margin_v},1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        width = layout.canvas_width,
        height = layout.canvas_height,
        name = STYLE_NAME,
        font = style.font_name,
        size = layout.font_size,
        primary = style.primary_colour,
        outline_colour = style.outline_colour,
        back = style.back_colour,
        outline = layout.outline_width,
        shadow = layout.shadow,
        margin_h = layout.margin_horizontal,
        margin_v = layout.margin_vertical,
    );

    for cue in &caption.cues {
        content.push_str(&cue.to_event_line(layout));
        content.push('\n');
    }

    StyledDocument {
        content,
        cue_count: caption.cues.len(),
        skipped: caption.skipped.clone(),
    }
}

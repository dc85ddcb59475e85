use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    media::{path_arg, MediaProcessor, ThumbnailRenderer},
    types::Thumbnail,
};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];

/// Rough advance of a bold glyph relative to the font size
const GLYPH_WIDTH_RATIO: f64 = 0.55;
const SHADOW_OFFSET: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub text: Rgb,
    pub accent: Rgb,
    pub font_size: u32,
    pub line_height: u32,
    pub max_lines: usize,
}

impl Default for ThumbnailStyle {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: Rgb(20, 25, 35),
            text: Rgb(255, 255, 255),
            accent: Rgb(249, 115, 22),
            font_size: 80,
            line_height: 100,
            max_lines: 3,
        }
    }
}

impl ThumbnailStyle {
    /// Characters that fit in 85% of the card width
    fn chars_per_line(&self) -> usize {
        let usable = self.width as f64 * 0.85;
        ((usable / (self.font_size as f64 * GLYPH_WIDTH_RATIO)) as usize).max(1)
    }

    /// Vertical blend from the background towards the accent colour
    fn gradient(&self) -> String {
        let channel = |from: u8, to: u8| format!("{from}+({to}-{from})*0.3*Y/H");
        format!(
            "geq=r='{}':g='{}':b='{}'",
            channel(self.background.0, self.accent.0),
            channel(self.background.1, self.accent.1),
            channel(self.background.2, self.accent.2),
        )
    }
}

/// Greedy word wrap. A word longer than a line gets a line of its own.
pub fn wrap_title(title: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(max_lines);
    lines
}

fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Renders title cards with ffmpeg's `drawtext`
pub struct FfmpegThumbnailer<F: MediaProcessor> {
    ffmpeg: F,
    font: Option<PathBuf>,
}

impl<F: MediaProcessor> FfmpegThumbnailer<F> {
    /// Uses the first bold system font found, or ffmpeg's default
    pub fn new(ffmpeg: F) -> Self {
        let font = FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file());
        if font.is_none() {
            tracing::warn!("No TrueType font found, falling back to ffmpeg's default");
        }
        Self { ffmpeg, font }
    }

    pub fn with_font(mut self, font: impl Into<PathBuf>) -> Self {
        self.font = Some(font.into());
        self
    }

    fn drawtext(
        &self,
        textfile: &Path,
        style: &ThumbnailStyle,
        color: &str,
        x: String,
        y: u32,
    ) -> String {
        let mut filter = String::from("drawtext=");
        if let Some(font) = &self.font {
            filter.push_str(&format!("fontfile='{}':", escape_filter_value(&path_arg(font))));
        }
        filter.push_str(&format!(
            "textfile='{}':expansion=none:fontsize={}:fontcolor={color}:x={x}:y={y}",
            escape_filter_value(&path_arg(textfile)),
            style.font_size,
        ));
        filter
    }

    fn filter_graph(&self, line_files: &[PathBuf], style: &ThumbnailStyle) -> String {
        let mut filters = vec!["format=rgb24".to_string(), style.gradient()];

        let total_height = line_files.len() as u32 * style.line_height;
        let mut y = style.height.saturating_sub(total_height) / 2;
        for file in line_files {
            filters.push(self.drawtext(
                file,
                style,
                "black@0.7",
                format!("(w-text_w)/2+{SHADOW_OFFSET}"),
                y + SHADOW_OFFSET,
            ));
            filters.push(self.drawtext(
                file,
                style,
                &style.text.hex(),
                "(w-text_w)/2".into(),
                y,
            ));
            y += style.line_height;
        }

        filters.push(format!(
            "drawbox=x={}:y={}:w={}:h=8:color={}:t=fill",
            style.width / 10,
            style.height.saturating_sub(60),
            style.width * 8 / 10,
            style.accent.hex(),
        ));
        filters.push("eq=contrast=1.2:saturation=1.1".into());

        filters.join(",")
    }

    fn render_in(
        &self,
        work_dir: &Path,
        lines: &[String],
        style: &ThumbnailStyle,
        dest: &Path,
    ) -> Result<(), ServiceError> {
        let line_files = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let file = work_dir.join(format!("line_{idx}.txt"));
                std::fs::write(&file, line)?;
                Ok(file)
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let args = vec![
            "-f".to_string(),
            "lavfi".into(),
            "-i".into(),
            format!("color=c={}:s={}x{}", style.background.hex(), style.width, style.height),
            "-vf".into(),
            self.filter_graph(&line_files, style),
            "-frames:v".into(),
            "1".into(),
            "-q:v".into(),
            "2".into(),
            path_arg(dest),
        ];

        self.ffmpeg
            .run(&args)
            .map_err(|e| ServiceError::Render(e.to_string()))
    }
}

impl<F: MediaProcessor> ThumbnailRenderer for FfmpegThumbnailer<F> {
    #[tracing::instrument(skip(self, style, dest), fields(dest = %dest.display()))]
    fn render(
        &self,
        title: &str,
        style: &ThumbnailStyle,
        dest: &Path,
    ) -> Result<Thumbnail, ServiceError> {
        let lines = wrap_title(title, style.chars_per_line(), style.max_lines);
        if lines.is_empty() {
            return Err(ServiceError::Render("Thumbnail title is empty".into()));
        }

        let work_dir = dest.with_extension("text");
        std::fs::create_dir_all(&work_dir)?;

        let rendered = self.render_in(&work_dir, &lines, style, dest);

        if let Err(e) = std::fs::remove_dir_all(&work_dir) {
            tracing::warn!(error = %e, dir = %work_dir.display(), "Failed to clean up work dir");
        }
        rendered?;

        tracing::info!(lines = lines.len(), "Thumbnail rendered");

        Ok(Thumbnail {
            path: dest.to_path_buf(),
            title: title.to_string(),
        })
    }
}

//! Reading card: a 1200×630 PNG summarising what is being read.
//!
//! Building a card is two steps. [`CardContent::compose`] decides the text
//! (title, meta line, stat chips, prompt) from a [`Snapshot`] and optional
//! local stats; [`render`] draws it with plotters. Cards are never stored.

mod draw;

pub use draw::render;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::Result;
use crate::share::Snapshot;
use crate::stats::ReadingStats;
use crate::storage::CardConfig;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

pub const DEFAULT_TITLE: &str = "A slow little reading session";
pub const FOOTER: &str = "Sloth Reading Nest";
pub const PROMPT_LABEL: &str = "cozy prompt";

/// Everything the card shows, already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub title: String,
    pub meta: String,
    pub chips: Vec<String>,
    pub prompt: Option<String>,
    pub footer: String,
    /// Small print under the footer.
    pub link: Option<String>,
}

impl CardContent {
    /// Decide the card text.
    ///
    /// With `stats` the three stat chips come from the local history; without
    /// (viewing someone's snapshot) only the snapshot's 7-day minutes are
    /// shown.
    pub fn compose(snapshot: &Snapshot, stats: Option<&ReadingStats>, options: &CardConfig) -> Self {
        let title = snapshot
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let meta = crate::shelf::meta_line(snapshot.author.as_deref(), snapshot.pages);

        let mut chips = Vec::new();
        if options.include_stats {
            match stats {
                Some(stats) => {
                    chips.push(format!("7d minutes: {}", stats.minutes_last_7_days));
                    chips.push(format!("today: {} min", stats.minutes_today));
                    chips.push(format!("sessions: {}", stats.session_count));
                }
                None => {
                    if let Some(m7) = snapshot.m7 {
                        chips.push(format!("7d minutes: {m7}"));
                    }
                }
            }
        }
        if let Some(status) = snapshot.status.as_deref().filter(|s| !s.is_empty()) {
            chips.push(format!("status: {status}"));
        }

        let prompt = if options.include_prompt {
            snapshot.prompt.clone().filter(|p| !p.trim().is_empty())
        } else {
            None
        };

        Self {
            title,
            meta,
            chips,
            prompt,
            footer: FOOTER.to_string(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Greedy word wrap to at most `max_lines` lines of `max_chars` characters.
///
/// Words longer than a line are split. Text that does not fit ends in `…`.
pub fn wrap_text(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }
    wrap_with(text, max_lines, |line| line.chars().count() <= max_chars)
}

/// Greedy word wrap where `fits` decides whether a line is short enough.
pub fn wrap_with(text: &str, max_lines: usize, fits: impl Fn(&str) -> bool) -> Vec<String> {
    if max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let joined = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if fits(&joined) {
            line = joined;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        for c in word.chars() {
            line.push(c);
            if !fits(&line) && line.chars().count() > 1 {
                line.pop();
                lines.push(std::mem::take(&mut line));
                line.push(c);
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let mut kept = last.trim_end().to_string();
            loop {
                let candidate = format!("{kept}…");
                if kept.is_empty() || fits(&candidate) {
                    *last = candidate;
                    break;
                }
                kept.pop();
                kept.truncate(kept.trim_end().len());
            }
        }
    }
    lines
}

/// Encode a rendered card as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Compose, render and encode in one go.
pub fn render_png(content: &CardContent) -> Result<Vec<u8>> {
    encode_png(&render(content)?)
}

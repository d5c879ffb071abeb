use std::fmt;
use std::time::Duration;

use crate::prediction::PredictionResult;

/// Delay between resetting the confidence bar to 0% and filling it.
pub const FILL_DELAY: Duration = Duration::from_millis(100);

pub const TITLE_HUMAN: &str = "Gambar ini sepertinya dibuat oleh Manusia";
pub const TITLE_AI: &str = "Gambar ini sepertinya dibuat oleh AI";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Upload,
    Instagram,
}

impl Flow {
    pub fn id(&self) -> &'static str {
        match self {
            Flow::Upload => "upload",
            Flow::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything the result panel shows for one prediction.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedResult {
    pub is_human: bool,
    pub icon_class: &'static str,
    pub icon_glyph: &'static str,
    pub title_class: &'static str,
    pub title: &'static str,
    pub confidence_text: String,
    pub progress_class: &'static str,
    /// Final bar width, e.g. `87%`.
    pub progress_width: String,
    pub prob_human_text: String,
    pub prob_ai_text: String,
}

fn percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Renders one prediction independently of the flow it came from. The caller
/// (`Page::show_result`) picks the flow's panel and schedules the bar fill.
pub fn render(result: &PredictionResult) -> RenderedResult {
    let is_human = result.is_human();
    let (icon_class, icon_glyph, title_class, title, progress_class) = if is_human {
        (
            "result-icon human",
            "fas fa-user",
            "result-title human",
            TITLE_HUMAN,
            "progress-fill human",
        )
    } else {
        (
            "result-icon ai",
            "fas fa-robot",
            "result-title ai",
            TITLE_AI,
            "progress-fill ai",
        )
    };

    RenderedResult {
        is_human,
        icon_class,
        icon_glyph,
        title_class,
        title,
        confidence_text: percent(result.confidence),
        progress_class,
        progress_width: format!("{}%", result.confidence * 100.0),
        prob_human_text: percent(result.prob_human),
        prob_ai_text: percent(result.prob_ai),
    }
}

/// Visible state of one result panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultPanel {
    pub shown: bool,
    pub content: Option<RenderedResult>,
    pub progress_width: String,
    /// Bumped on every render so a stale fill timer can tell it lost.
    pub generation: u64,
}

impl ResultPanel {
    /// Shows `rendered` with the bar reset to 0%. Returns the generation the
    /// delayed fill must match.
    pub fn show(&mut self, rendered: RenderedResult) -> u64 {
        self.generation += 1;
        self.progress_width = "0%".to_string();
        self.content = Some(rendered);
        self.shown = true;
        self.generation
    }

    /// Second half of the bar animation. Ignored if a newer render happened.
    pub fn fill(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        if let Some(content) = &self.content {
            self.progress_width = content.progress_width.clone();
        }
    }

    pub fn hide(&mut self) {
        self.shown = false;
    }
}

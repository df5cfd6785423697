use crate::application::series_element::{DEFAULT_GROW_SLOTS, DEFAULT_INITIAL_SLOTS, OriginPolicy};
use crate::application::series_line::DuplicatePolicy;
use crate::domain::point_buffer::DEFAULT_BASELINE_POINTS;
use anyhow::ensure;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub element: ElementSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// Stop after this many seconds; run until Ctrl-C when unset
    #[serde(default)]
    pub run_for_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BufferSettings {
    pub baseline_points: usize,
    pub max_doublings: u32,
    pub trim_batch: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            baseline_points: DEFAULT_BASELINE_POINTS,
            max_doublings: 4,
            trim_batch: 1_000,
            duplicate_policy: DuplicatePolicy::Reject,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ElementSettings {
    pub initial_slots: usize,
    pub grow_slots: usize,
    pub origin: OriginPolicy,
}

impl Default for ElementSettings {
    fn default() -> Self {
        Self {
            initial_slots: DEFAULT_INITIAL_SLOTS,
            grow_slots: DEFAULT_GROW_SLOTS,
            origin: OriginPolicy::FirstPointObserved,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderSettings {
    pub redraw_interval_ms: u64,
    /// Width of one label character, used to measure tick labels
    pub label_char_width: f64,
    /// Hover the newest point every Nth frame (0 disables)
    pub hover_every: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            redraw_interval_ms: 250,
            label_char_width: 7.0,
            hover_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistorySettings {
    pub window_ms: f64,
    pub latency_ms: u64,
    /// Keep the bounds sliding with wall-clock time
    pub follow_live: bool,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            window_ms: 10.0 * 60.0 * 1000.0,
            latency_ms: 50,
            follow_live: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub id: String,
    pub period_ms: u64,
    pub amplitude: f64,
    #[serde(default = "default_wavelength_ms")]
    pub wavelength_ms: f64,
    /// Every Nth live sample is sent late, out of order (0 disables)
    #[serde(default)]
    pub out_of_order_every: u32,
    /// Every Nth live sample is sent twice (0 disables)
    #[serde(default)]
    pub resend_every: u32,
}

fn default_wavelength_ms() -> f64 {
    60_000.0
}

impl PipelineConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.buffer.baseline_points > 0, "buffer.baseline_points must be positive");
        ensure!(self.buffer.trim_batch > 0, "buffer.trim_batch must be positive");
        ensure!(self.element.initial_slots >= 2, "element.initial_slots must hold one point");
        ensure!(self.element.grow_slots > 0, "element.grow_slots must be positive");
        ensure!(self.render.redraw_interval_ms > 0, "render.redraw_interval_ms must be positive");
        ensure!(self.history.window_ms > 0.0, "history.window_ms must be positive");

        let mut ids = HashSet::new();
        for feed in &self.feeds {
            ensure!(ids.insert(feed.id.as_str()), "duplicate feed id {}", feed.id);
            ensure!(feed.period_ms > 0, "feed {} needs a positive period_ms", feed.id);
            ensure!(
                feed.wavelength_ms > 0.0,
                "feed {} needs a positive wavelength_ms",
                feed.id
            );
        }
        Ok(())
    }
}

pub fn load_pipeline_config() -> anyhow::Result<PipelineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/pipeline").required(false))
        .add_source(config::Environment::with_prefix("PLOT").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

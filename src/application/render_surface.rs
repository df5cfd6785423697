// Rendering surface seam
use crate::application::series_element::RenderFrame;
use crate::domain::point::SeriesId;

/// Axis metadata shared by every frame of one redraw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisState {
    pub max_tick_width: f64,
    pub highlight: Option<f64>,
}

pub trait RenderSurface {
    /// Draw the current frames and report each series' measured tick width.
    fn redraw(&mut self, frames: &[RenderFrame<'_>], axis: AxisState) -> Vec<(SeriesId, f64)>;

    /// Pointer hover since the last call: the hovered series and domain,
    /// or `None` as the domain when the pointer left the plot.
    fn hover(&mut self) -> Option<(SeriesId, Option<f64>)> {
        None
    }
}

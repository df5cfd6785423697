// Render surface that reports frames through tracing
use crate::application::render_surface::{AxisState, RenderSurface};
use crate::application::series_element::RenderFrame;
use crate::domain::point::SeriesId;

const LABEL_PRECISION: usize = 2;

pub struct TracingSurface {
    label_char_width: f64,
    hover_every: u64,
    frames_drawn: u64,
    pending_hover: Option<(SeriesId, Option<f64>)>,
}

impl TracingSurface {
    pub fn new(label_char_width: f64, hover_every: u64) -> Self {
        Self {
            label_char_width,
            hover_every,
            frames_drawn: 0,
            pending_hover: None,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Width of the widest range label the frame's y-axis would need.
    fn tick_width(&self, frame: &RenderFrame<'_>) -> f64 {
        let Some((lo, hi)) = range_extent(frame) else {
            return 0.0;
        };
        let chars = [lo, hi]
            .iter()
            .map(|value| format!("{:.*}", LABEL_PRECISION, value).len())
            .max()
            .unwrap_or(0);
        chars as f64 * self.label_char_width
    }
}

/// Absolute domain of the newest vertex in a frame.
fn newest_domain(frame: &RenderFrame<'_>) -> Option<f64> {
    if frame.arity == 0 || frame.count == 0 {
        return None;
    }
    let base = frame.offset.map(|o| o.domain).unwrap_or(0.0);
    let vertex = frame.vertices.get((frame.count - 1) * frame.arity)?;
    Some(*vertex as f64 + base)
}

/// Absolute (min, max) range of a frame, undoing the element offset.
fn range_extent(frame: &RenderFrame<'_>) -> Option<(f64, f64)> {
    if frame.arity < 2 {
        return None;
    }
    let base = frame.offset.map(|o| o.range).unwrap_or(0.0);
    frame
        .vertices
        .chunks_exact(frame.arity)
        .map(|vertex| vertex[1] as f64 + base)
        .filter(|value| value.is_finite())
        .fold(None, |extent, value| match extent {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

impl RenderSurface for TracingSurface {
    fn redraw(&mut self, frames: &[RenderFrame<'_>], axis: AxisState) -> Vec<(SeriesId, f64)> {
        self.frames_drawn += 1;

        // Simulated pointer parked on the newest point of the top plot
        if self.hover_every > 0 && self.frames_drawn % self.hover_every == 0 {
            self.pending_hover = frames
                .iter()
                .find_map(|frame| Some((frame.series.clone(), Some(newest_domain(frame)?))));
        }

        frames
            .iter()
            .map(|frame| {
                let width = self.tick_width(frame);
                tracing::info!(
                    "Frame {}: {} has {} points, tick width {} (group {})",
                    self.frames_drawn,
                    frame.series,
                    frame.count,
                    width,
                    axis.max_tick_width
                );
                (frame.series.clone(), width)
            })
            .collect()
    }

    fn hover(&mut self) -> Option<(SeriesId, Option<f64>)> {
        self.pending_hover.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::series_element::Offset;

    #[test]
    fn test_tick_width_follows_widest_label() {
        let series = SeriesId::new("temp");
        let vertices = [0.0, 0.0, 10.0, 123.75];
        let frame = RenderFrame {
            series: &series,
            vertices: &vertices,
            count: 2,
            arity: 2,
            offset: Some(Offset {
                domain: 0.0,
                range: -3.5,
            }),
        };
        let mut surface = TracingSurface::new(7.0, 0);

        let widths = surface.redraw(&[frame], AxisState::default());

        // labels "-3.50" and "120.25"
        assert_eq!(widths, vec![(series, 42.0)]);
        assert_eq!(surface.frames_drawn(), 1);
    }

    #[test]
    fn test_empty_frame_has_no_width() {
        let series = SeriesId::new("empty");
        let frame = RenderFrame {
            series: &series,
            vertices: &[],
            count: 0,
            arity: 2,
            offset: None,
        };
        let surface = TracingSurface::new(7.0, 0);
        assert_eq!(surface.tick_width(&frame), 0.0);
        assert_eq!(newest_domain(&frame), None);
    }

    #[test]
    fn test_hovers_newest_point_every_nth_frame() {
        let series = SeriesId::new("volts");
        let vertices = [0.0, 1.0, 250.0, 2.0];
        let frame = RenderFrame {
            series: &series,
            vertices: &vertices,
            count: 2,
            arity: 2,
            offset: Some(Offset {
                domain: 1000.0,
                range: 0.0,
            }),
        };
        let mut surface = TracingSurface::new(7.0, 2);

        surface.redraw(&[frame], AxisState::default());
        assert_eq!(surface.hover(), None);

        surface.redraw(&[frame], AxisState::default());
        assert_eq!(surface.hover(), Some((series, Some(1250.0))));
        assert_eq!(surface.hover(), None);
    }
}

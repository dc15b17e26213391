//! Frame-differencing motion detection.
//!
//! The detector consumes consecutive video frames and scores motion per
//! region. Each pixel's luminance (mean of the three colour channels) is
//! differenced against the previous frame and thresholded into a binary
//! activation buffer; regions then average their activations, with larger
//! regions receiving a proportional confidence boost to counteract the
//! dilution of averaging over more pixels.
//!
//! Events are emitted synchronously into the supplied [`MotionSink`] during
//! [`MotionDetector::consume_frame`]; there is no queuing.

use tracing::debug;

use super::frame::FrameBuffer;
use super::region::{Hotspot, Rect, Region};

/// Per-pixel luminance difference above this cutoff counts as fully active.
const DIFF_CUTOFF: u8 = 0x15;

/// Region pixel area at which the confidence scale factor reaches 2.0.
const REFERENCE_AREA: f64 = (256 * 256) as f64;

/// Receiver of motion events.
///
/// Implemented by the hotspot accumulator; tests can use `Vec<MotionEvent>`.
pub trait MotionSink {
    /// Called once per region whose confidence exceeds the detection
    /// threshold, within the frame-processing call.
    fn on_motion(&mut self, confidence: u32, region: &Region);
}

/// A recorded motion event. Primarily useful as a test sink.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionEvent {
    pub confidence: u32,
    pub region: Region,
}

impl MotionSink for Vec<MotionEvent> {
    fn on_motion(&mut self, confidence: u32, region: &Region) {
        self.push(MotionEvent {
            confidence,
            region: region.clone(),
        });
    }
}

/// Motion detector over a stream of RGBA frames.
pub struct MotionDetector {
    enabled: bool,
    use_grid: bool,
    grid_rows: u32,
    grid_columns: u32,
    detection_threshold: u32,
    hotspots: Vec<Hotspot>,
    previous: Option<FrameBuffer>,
    /// Single-channel binary activation buffer from the last difference.
    diff: Vec<u8>,
}

impl MotionDetector {
    /// Create a detector with the given grid dimensions and detection
    /// threshold. Grid detection starts disabled; hotspot detection is
    /// always on.
    #[must_use]
    pub fn new(grid_rows: u32, grid_columns: u32, detection_threshold: u32) -> Self {
        Self {
            enabled: true,
            use_grid: false,
            grid_rows,
            grid_columns,
            detection_threshold,
            hotspots: Vec::new(),
            previous: None,
            diff: Vec::new(),
        }
    }

    /// Check whether detection is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable detection.
    ///
    /// Disabling does not clear the previous frame; on re-enable the next
    /// frame is differenced against the last one seen.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "motion detection toggled");
        }
        self.enabled = enabled;
    }

    /// Enable or disable grid-cell detection.
    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.use_grid = enabled;
    }

    /// Register a single named hotspot.
    pub fn register_hotspot(&mut self, name: impl Into<String>, rect: Rect) {
        self.hotspots.push(Hotspot::new(name, rect));
    }

    /// Register a batch of hotspots.
    pub fn register_hotspots(&mut self, hotspots: impl IntoIterator<Item = Hotspot>) {
        self.hotspots.extend(hotspots);
    }

    /// The registered hotspots.
    #[must_use]
    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    /// Consume the next frame, emitting motion events into `sink`.
    ///
    /// The first frame only primes the previous-frame buffer; detection
    /// starts with the second frame. A frame whose dimensions differ from
    /// the held previous frame re-primes the buffer (the tick is dropped).
    pub fn consume_frame(&mut self, frame: &FrameBuffer, sink: &mut dyn MotionSink) {
        if !self.enabled {
            return;
        }

        let Some(previous) = &self.previous else {
            self.previous = Some(frame.clone());
            return;
        };

        if previous.width() != frame.width() || previous.height() != frame.height() {
            self.previous = Some(frame.clone());
            return;
        }

        self.compute_diff(frame);
        let width = frame.width();
        let height = frame.height();
        self.previous = Some(frame.clone());

        if self.use_grid {
            let cell_w = 1.0 / f64::from(self.grid_columns);
            let cell_h = 1.0 / f64::from(self.grid_rows);

            for row in 0..self.grid_rows {
                for col in 0..self.grid_columns {
                    let rect = Rect::new(
                        f64::from(col) * cell_w,
                        f64::from(row) * cell_h,
                        cell_w,
                        cell_h,
                    );
                    self.detect_region(width, height, &Region::GridCell { row, col, rect }, sink);
                }
            }
        }

        for hotspot in &self.hotspots {
            let region = Region::Hotspot {
                name: hotspot.name.clone(),
                rect: hotspot.rect,
            };
            self.detect_region(width, height, &region, sink);
        }
    }

    /// Difference the current frame against the previous one into the
    /// binary activation buffer.
    fn compute_diff(&mut self, frame: &FrameBuffer) {
        let previous = self.previous.as_ref().expect("previous frame present");
        self.diff.clear();
        self.diff.reserve(frame.pixel_count());

        for (prev, curr) in previous
            .data()
            .chunks_exact(4)
            .zip(frame.data().chunks_exact(4))
        {
            let lum_prev = (u32::from(prev[0]) + u32::from(prev[1]) + u32::from(prev[2])) / 3;
            let lum_curr = (u32::from(curr[0]) + u32::from(curr[1]) + u32::from(curr[2])) / 3;
            let delta = lum_prev.abs_diff(lum_curr);
            self.diff.push(if delta > u32::from(DIFF_CUTOFF) { 0xFF } else { 0x00 });
        }
    }

    /// Score one region of the activation buffer and emit an event if its
    /// confidence exceeds the detection threshold.
    fn detect_region(&self, width: u32, height: u32, region: &Region, sink: &mut dyn MotionSink) {
        let rect = region.rect();
        let x0 = (rect.x * f64::from(width)).floor() as usize;
        let y0 = (rect.y * f64::from(height)).floor() as usize;
        let w = (rect.w * f64::from(width)).floor() as usize;
        let h = (rect.h * f64::from(height)).floor() as usize;

        let x1 = (x0 + w).min(width as usize);
        let y1 = (y0 + h).min(height as usize);
        let area = x1.saturating_sub(x0) * y1.saturating_sub(y0);
        if area == 0 {
            return;
        }

        let mut total: u64 = 0;
        for y in y0..y1 {
            let row_start = y * width as usize;
            for x in x0..x1 {
                total += u64::from(self.diff[row_start + x]);
            }
        }

        // Average activation, boosted in proportion to the region's pixel
        // area relative to the reference area.
        let mut confidence = total as f64 / area as f64;
        confidence += confidence * (area as f64 / REFERENCE_AREA);
        let confidence = confidence.round() as u32;

        if confidence > self.detection_threshold {
            sink.on_motion(confidence, region);
        }
    }
}

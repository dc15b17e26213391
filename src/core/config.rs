//! Engine configuration.
//!
//! All tunables are supplied as one flat [`GameSettings`] value at
//! construction time; no component reads configuration from anywhere else.
//! The defaults reproduce the original game tuning.

use serde::{Deserialize, Serialize};

/// Flat options structure for the engine.
///
/// ## Example
///
/// ```
/// use incanter::core::GameSettings;
///
/// let settings = GameSettings::default()
///     .with_motion_detection_threshold(15)
///     .with_duration_attacking(10_000.0);
///
/// assert_eq!(settings.motion_detection_threshold, 15);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSettings {
    /// Rows in the optional motion-detection grid.
    pub grid_rows: u32,

    /// Columns in the optional motion-detection grid.
    pub grid_columns: u32,

    /// Minimum region confidence for a motion event to be emitted.
    pub motion_detection_threshold: u32,

    /// Accumulated charge lost per second when decay is enabled.
    /// Zero disables decay.
    pub accumulated_motion_decay: f64,

    /// Lower bound of the audio trigger zone, as a fraction of max volume.
    pub audio_trigger_min: f64,

    /// Upper bound of the audio trigger zone, as a fraction of max volume.
    pub audio_trigger_max: f64,

    /// Duration of the ready-up phase, in milliseconds.
    pub duration_ready_up: f64,

    /// Duration of the attack phase, in milliseconds.
    pub duration_attacking: f64,

    /// Duration of the defend phase, in milliseconds.
    pub duration_defending: f64,

    /// Duration of the end-of-turn phase, in milliseconds.
    pub duration_turn_over: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            grid_rows: 20,
            grid_columns: 20,
            motion_detection_threshold: 20,
            accumulated_motion_decay: 1.0,
            audio_trigger_min: 0.2,
            audio_trigger_max: 1.0,
            duration_ready_up: 4000.0,
            duration_attacking: 8000.0,
            duration_defending: 8000.0,
            duration_turn_over: 6000.0,
        }
    }
}

impl GameSettings {
    /// Set the grid dimensions.
    #[must_use]
    pub fn with_grid(mut self, rows: u32, columns: u32) -> Self {
        self.grid_rows = rows;
        self.grid_columns = columns;
        self
    }

    /// Set the motion detection threshold.
    #[must_use]
    pub fn with_motion_detection_threshold(mut self, threshold: u32) -> Self {
        self.motion_detection_threshold = threshold;
        self
    }

    /// Set the accumulated motion decay rate (charge per second).
    #[must_use]
    pub fn with_accumulated_motion_decay(mut self, decay: f64) -> Self {
        self.accumulated_motion_decay = decay;
        self
    }

    /// Set the audio trigger zone bounds (fractions of max volume).
    #[must_use]
    pub fn with_audio_trigger_zone(mut self, min: f64, max: f64) -> Self {
        self.audio_trigger_min = min;
        self.audio_trigger_max = max;
        self
    }

    /// Set the ready-up phase duration.
    #[must_use]
    pub fn with_duration_ready_up(mut self, ms: f64) -> Self {
        self.duration_ready_up = ms;
        self
    }

    /// Set the attack phase duration.
    #[must_use]
    pub fn with_duration_attacking(mut self, ms: f64) -> Self {
        self.duration_attacking = ms;
        self
    }

    /// Set the defend phase duration.
    #[must_use]
    pub fn with_duration_defending(mut self, ms: f64) -> Self {
        self.duration_defending = ms;
        self
    }

    /// Set the end-of-turn phase duration.
    #[must_use]
    pub fn with_duration_turn_over(mut self, ms: f64) -> Self {
        self.duration_turn_over = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();

        assert_eq!(settings.grid_rows, 20);
        assert_eq!(settings.grid_columns, 20);
        assert_eq!(settings.motion_detection_threshold, 20);
        assert_eq!(settings.accumulated_motion_decay, 1.0);
        assert_eq!(settings.duration_ready_up, 4000.0);
        assert_eq!(settings.duration_attacking, 8000.0);
        assert_eq!(settings.duration_defending, 8000.0);
        assert_eq!(settings.duration_turn_over, 6000.0);
    }

    #[test]
    fn test_builder() {
        let settings = GameSettings::default()
            .with_grid(10, 12)
            .with_audio_trigger_zone(0.1, 0.9)
            .with_duration_turn_over(3000.0);

        assert_eq!(settings.grid_rows, 10);
        assert_eq!(settings.grid_columns, 12);
        assert_eq!(settings.audio_trigger_min, 0.1);
        assert_eq!(settings.audio_trigger_max, 0.9);
        assert_eq!(settings.duration_turn_over, 3000.0);
    }
}

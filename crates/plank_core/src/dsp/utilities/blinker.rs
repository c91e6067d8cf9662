use crate::dsp::utils::accumulate_phase;

/// 1 Hz square-wave light driver.
///
/// Counts accumulated sample time, not wall-clock time, so it stays locked to
/// the audio stream. Lit for the first half of every second.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatusBlinker {
    blink_phase: f32,
}

impl StatusBlinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blink_phase(&self) -> f32 {
        self.blink_phase
    }

    pub fn brightness(&self) -> f32 {
        brightness_at(self.blink_phase)
    }

    /// Accumulate `sample_time` seconds and return the new brightness.
    pub fn advance(&mut self, sample_time: f32) -> f32 {
        if sample_time.is_finite() {
            self.blink_phase = accumulate_phase(self.blink_phase, sample_time);
        }
        self.brightness()
    }
}

pub fn brightness_at(blink_phase: f32) -> f32 {
    if blink_phase < 0.5 { 1.0 } else { 0.0 }
}

use std::f32::consts::TAU;

use crate::dsp::consts::{OUTPUT_PEAK_VOLTS, SEMITONES_PER_OCTAVE, SENTINEL_VOLTS};

/// Advance a [0, 1) phase by `increment` and wrap with a single subtraction.
///
/// This is not a modulo: the result only stays in [0, 1) while
/// `increment < 1`. Larger increments leave the phase above 1 and the caller
/// sees a folded waveform, which matches the reference modules.
#[inline]
pub fn accumulate_phase(phase: f32, increment: f32) -> f32 {
    let mut phase = phase + increment;
    if phase >= 1.0 {
        phase -= 1.0;
    }
    phase
}

/// Sine of a [0, 1) phase scaled to the +/-5 V audio convention.
#[inline]
pub fn sine_voltage(phase: f32) -> f32 {
    OUTPUT_PEAK_VOLTS * (TAU * phase).sin()
}

#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0f32.powf(semitones / SEMITONES_PER_OCTAVE)
}

#[inline]
pub fn octaves_to_ratio(octaves: f32) -> f32 {
    2.0f32.powf(octaves)
}

#[inline]
pub fn finite_or_sentinel(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        SENTINEL_VOLTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_phase_no_wrap() {
        assert!((accumulate_phase(0.25, 0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_accumulate_phase_wraps_once() {
        let phase = accumulate_phase(0.9, 0.2);
        assert!((phase - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_accumulate_phase_exactly_one_wraps_to_zero() {
        assert_eq!(accumulate_phase(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_accumulate_phase_large_increment_escapes_range() {
        // Only one subtraction happens, so the phase leaves [0, 1).
        let phase = accumulate_phase(0.5, 1.75);
        assert!((phase - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_sine_voltage_quadrants() {
        assert!(sine_voltage(0.0).abs() < 1e-5);
        assert!((sine_voltage(0.25) - 5.0).abs() < 1e-5);
        assert!(sine_voltage(0.5).abs() < 1e-4);
        assert!((sine_voltage(0.75) + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_semitones_to_ratio_octaves() {
        assert_eq!(semitones_to_ratio(0.0), 1.0);
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-6);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-6);
        assert!((semitones_to_ratio(7.0) - 1.498_307).abs() < 1e-5);
    }

    #[test]
    fn test_octaves_to_ratio() {
        assert_eq!(octaves_to_ratio(0.0), 1.0);
        assert!((octaves_to_ratio(1.0) - 2.0).abs() < 1e-6);
        assert!((octaves_to_ratio(-2.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_finite_or_sentinel() {
        assert_eq!(finite_or_sentinel(1.5), 1.5);
        assert_eq!(finite_or_sentinel(f32::NAN), 0.0);
        assert_eq!(finite_or_sentinel(f32::NEG_INFINITY), 0.0);
    }
}

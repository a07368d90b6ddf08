// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Temperature to LED color.
//!
//! The temperature picks a hue between green (at or below the off
//! threshold) and red (above the on threshold); the LED brightness sets
//! the HSV value. See <https://en.wikipedia.org/wiki/HSL_and_HSV#HSV_to_RGB>.

use crate::config::{MAX_BRIGHTNESS, Thresholds};
use crate::led::LedFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Hue as a fraction of the full circle: 1/3 (green) below `lo`, 0 (red)
/// above `hi`, linear in between.
pub fn temperature_to_hue(temp_c: f64, hi: f64, lo: f64) -> f64 {
    if temp_c < lo {
        1.0 / 3.0
    } else if temp_c > hi {
        0.0
    } else {
        (hi - temp_c) / (hi - lo) / 3.0
    }
}

/// HSV to RGB. `hue` is a fraction of the circle, `saturation` and `value`
/// are in [0, 1]. Channels are truncated, not rounded.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Color {
    let degrees = hue * 360.0;
    let channel = |n: f64| {
        let k = (n + degrees / 60.0) % 6.0;
        let f = value - value * saturation * k.min(4.0 - k).min(1.0).max(0.0);
        (f * 255.0) as u8
    };
    Color::new(channel(5.0), channel(3.0), channel(1.0))
}

/// Color for `temp_c` at the given 5-bit brightness. Brightness 0 is black.
pub fn temperature_color(temp_c: f64, thresholds: Thresholds, brightness: u8) -> Color {
    if brightness == 0 {
        return Color::BLACK;
    }
    let hue = temperature_to_hue(temp_c, f64::from(thresholds.on), f64::from(thresholds.off));
    let value = f64::from(brightness.min(MAX_BRIGHTNESS)) / f64::from(MAX_BRIGHTNESS);
    hsv_to_rgb(hue, 1.0, value)
}

/// LED frame showing `temp_c` at `brightness`.
pub fn temperature_frame(temp_c: f64, thresholds: Thresholds, brightness: u8) -> LedFrame {
    LedFrame::new(brightness, temperature_color(temp_c, thresholds, brightness))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: Thresholds = Thresholds { on: 60, off: 50 };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_hue_below_range_is_green() {
        assert!(approx(temperature_to_hue(40.0, 60.0, 50.0), 1.0 / 3.0));
    }

    #[test]
    fn test_hue_above_range_is_red() {
        assert!(approx(temperature_to_hue(70.0, 60.0, 50.0), 0.0));
    }

    #[test]
    fn test_hue_interpolates() {
        assert!(approx(temperature_to_hue(55.0, 60.0, 50.0), 1.0 / 6.0));
        assert!(approx(temperature_to_hue(50.0, 60.0, 50.0), 1.0 / 3.0));
        assert!(approx(temperature_to_hue(60.0, 60.0, 50.0), 0.0));
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), Color::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Color::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), Color::new(0, 0, 255));
    }

    #[test]
    fn test_hsv_midpoint_is_yellow() {
        assert_eq!(hsv_to_rgb(1.0 / 6.0, 1.0, 1.0), Color::new(255, 255, 0));
    }

    #[test]
    fn test_hsv_truncates_value() {
        // 10/31 * 255 = 82.26
        let c = hsv_to_rgb(0.0, 1.0, 10.0 / 31.0);
        assert_eq!(c, Color::new(82, 0, 0));
    }

    #[test]
    fn test_zero_saturation_is_grey() {
        assert_eq!(hsv_to_rgb(0.25, 0.0, 1.0), Color::new(255, 255, 255));
    }

    #[test]
    fn test_temperature_color_scales_with_brightness() {
        assert_eq!(temperature_color(40.0, THRESHOLDS, 31), Color::new(0, 255, 0));
        assert_eq!(temperature_color(80.0, THRESHOLDS, 31), Color::new(255, 0, 0));
        let dim = temperature_color(80.0, THRESHOLDS, 10);
        assert_eq!(dim, Color::new(82, 0, 0));
    }

    #[test]
    fn test_zero_brightness_is_black() {
        assert_eq!(temperature_color(55.0, THRESHOLDS, 0), Color::BLACK);
        assert_eq!(temperature_frame(55.0, THRESHOLDS, 0), LedFrame::DARK);
    }
}

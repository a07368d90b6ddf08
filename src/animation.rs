// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! LED patterns.
//!
//! Once per control-loop tick the engine picks a pattern and plays it:
//!
//! | Pattern | When                                  | Duration               |
//! |---------|---------------------------------------|------------------------|
//! | Off     | brightness configured as 0            | one dark frame, ever   |
//! | Static  | fan on, forced on, or static mode     | one frame              |
//! | Blink   | blink mode and fan off                | `delay` x (0.5s + 0.5s)|
//! | Breathe | breathe mode and fan off              | `10 * delay` x 100ms   |
//!
//! Blink and breathe occupy the whole tick; after a static frame the
//! control loop sleeps `delay` itself.

use crate::color::temperature_frame;
use crate::config::{Config, LedMode, MAX_BRIGHTNESS, Thresholds};
use crate::gpio::GpioPort;
use crate::hysteresis::FanState;
use crate::led::{LedEncoder, LedFrame};
use crate::pacing::Pacer;
use std::io;
use std::time::Duration;

const BLINK_HALF_PERIOD: Duration = Duration::from_millis(500);
const BREATHE_STEP: Duration = Duration::from_millis(100);
const BREATHE_STEPS_PER_SEC: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Off,
    Static,
    Blink,
    Breathe,
}

impl Pattern {
    /// Whether the pattern already waited out the tick.
    pub fn consumes_tick(self) -> bool {
        matches!(self, Pattern::Blink | Pattern::Breathe)
    }
}

/// Triangle wave of brightness levels: 0, 1, .., peak, .., 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreathTable {
    levels: Vec<u8>,
}

impl BreathTable {
    /// `peak` is clamped to 1..=31.
    pub fn new(peak: u8) -> Self {
        let peak = peak.clamp(1, MAX_BRIGHTNESS);
        let levels = (0..2 * peak)
            .map(|i| if i <= peak { i } else { 2 * peak - i })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Position in the breathing wave. Kept across ticks so the wave never
/// restarts from dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationState {
    phase: usize,
}

impl AnimationState {
    pub fn phase(&self) -> usize {
        self.phase
    }

    fn advance(&mut self, len: usize) {
        self.phase = if self.phase + 1 >= len { 0 } else { self.phase + 1 };
    }
}

#[derive(Debug, Clone)]
pub struct AnimationEngine {
    brightness: u8,
    mode: LedMode,
    delay_secs: u64,
    thresholds: Thresholds,
    breath: BreathTable,
    state: AnimationState,
    dark_sent: bool,
}

impl AnimationEngine {
    pub fn new(
        brightness: u8,
        mode: LedMode,
        breath_peak: u8,
        delay_secs: u64,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            brightness: brightness.min(MAX_BRIGHTNESS),
            mode,
            delay_secs,
            thresholds,
            breath: BreathTable::new(breath_peak),
            state: AnimationState::default(),
            dark_sent: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.led_brightness(),
            config.led_mode(),
            config.breath_brgt,
            config.delay,
            config.thresholds(),
        )
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Pattern for this tick. A forced-on fan always gets the static frame.
    pub fn select(&self, fan: FanState, force_on: bool) -> Pattern {
        if self.brightness == 0 {
            return Pattern::Off;
        }
        if fan.is_on() || force_on {
            return Pattern::Static;
        }
        match self.mode {
            LedMode::Static => Pattern::Static,
            LedMode::Blink => Pattern::Blink,
            LedMode::Breathe => Pattern::Breathe,
        }
    }

    /// Select and play the pattern for one tick. Returns early, without
    /// error, when the pacer reports a stop request.
    pub fn run_tick<P, C>(
        &mut self,
        port: &mut P,
        encoder: &LedEncoder,
        pacer: &mut C,
        temp_c: f64,
        fan: FanState,
        force_on: bool,
    ) -> io::Result<Pattern>
    where
        P: GpioPort + ?Sized,
        C: Pacer + ?Sized,
    {
        let pattern = self.select(fan, force_on);
        match pattern {
            Pattern::Off => self.dark(port, encoder)?,
            Pattern::Static => {
                let frame = temperature_frame(temp_c, self.thresholds, self.brightness);
                encoder.send_frame(port, frame)?;
            }
            Pattern::Blink => self.blink(port, encoder, pacer, temp_c)?,
            Pattern::Breathe => self.breathe(port, encoder, pacer, temp_c)?,
        }
        Ok(pattern)
    }

    fn dark<P: GpioPort + ?Sized>(&mut self, port: &mut P, encoder: &LedEncoder) -> io::Result<()> {
        if !self.dark_sent {
            encoder.send_frame(port, LedFrame::DARK)?;
            self.dark_sent = true;
        }
        Ok(())
    }

    fn blink<P, C>(
        &mut self,
        port: &mut P,
        encoder: &LedEncoder,
        pacer: &mut C,
        temp_c: f64,
    ) -> io::Result<()>
    where
        P: GpioPort + ?Sized,
        C: Pacer + ?Sized,
    {
        let lit = temperature_frame(temp_c, self.thresholds, self.brightness);
        for _ in 0..self.delay_secs {
            encoder.send_frame(port, lit)?;
            if !pacer.pause(BLINK_HALF_PERIOD) {
                break;
            }
            encoder.send_frame(port, LedFrame::DARK)?;
            if !pacer.pause(BLINK_HALF_PERIOD) {
                break;
            }
        }
        Ok(())
    }

    fn breathe<P, C>(
        &mut self,
        port: &mut P,
        encoder: &LedEncoder,
        pacer: &mut C,
        temp_c: f64,
    ) -> io::Result<()>
    where
        P: GpioPort + ?Sized,
        C: Pacer + ?Sized,
    {
        for _ in 0..BREATHE_STEPS_PER_SEC.saturating_mul(self.delay_secs) {
            let level = self.breath.levels()[self.state.phase];
            encoder.send_frame(port, temperature_frame(temp_c, self.thresholds, level))?;
            self.state.advance(self.breath.len());
            if !pacer.pause(BREATHE_STEP) {
                break;
            }
        }
        Ok(())
    }
}

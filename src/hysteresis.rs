// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Fan on/off decisions from a window of recent temperature samples.
//!
//! The fan only switches when *every* sample in the window sits past a
//! threshold, so a single spike or dip never toggles it. The on and off
//! thresholds are separate, leaving a deadband between them.

use crate::config::Thresholds;
use crate::gpio::Level;
use std::collections::VecDeque;

/// Whether the fan is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanState {
    #[default]
    Off,
    On,
}

impl FanState {
    pub fn is_on(self) -> bool {
        self == FanState::On
    }

    /// Pin level that produces this state.
    pub fn level(self) -> Level {
        match self {
            FanState::Off => Level::Low,
            FanState::On => Level::High,
        }
    }

    /// Numeric form used by the status file.
    pub fn as_gauge(self) -> u8 {
        u8::from(self.is_on())
    }
}

impl From<Level> for FanState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => FanState::Off,
            Level::High => FanState::On,
        }
    }
}

/// The most recent `budget` samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<i32>,
}

impl SampleWindow {
    /// Create a window of `budget` zeros. A budget of 0 is treated as 1.
    pub fn new(budget: usize) -> Self {
        let budget = budget.max(1);
        Self {
            samples: std::iter::repeat_n(0, budget).collect(),
        }
    }

    /// Append a sample, evicting the oldest.
    pub fn push(&mut self, sample: i32) {
        self.samples.pop_front();
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.samples.iter().copied()
    }
}

/// Hysteresis filter between raw samples and the fan pin.
#[derive(Debug, Clone)]
pub struct HysteresisController {
    window: SampleWindow,
    thresholds: Thresholds,
}

impl HysteresisController {
    pub fn new(thresholds: Thresholds, budget: usize) -> Self {
        Self {
            window: SampleWindow::new(budget),
            thresholds,
        }
    }

    pub fn push_sample(&mut self, sample: i32) {
        self.window.push(sample);
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Every sample is strictly below the off threshold.
    pub fn all_low(&self) -> bool {
        self.window.iter().all(|t| t < self.thresholds.off)
    }

    /// Every sample is strictly above the on threshold.
    pub fn all_high(&self) -> bool {
        self.window.iter().all(|t| t > self.thresholds.on)
    }

    /// Next fan state given the current one. `force_on` acts as if the
    /// whole window were hot.
    pub fn decide(&self, current: FanState, force_on: bool) -> FanState {
        let all_high = force_on || self.all_high();
        let all_low = self.all_low();

        match current {
            FanState::Off if all_high => FanState::On,
            FanState::On if all_low => FanState::Off,
            state => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(budget: usize) -> HysteresisController {
        HysteresisController::new(Thresholds { on: 60, off: 50 }, budget)
    }

    fn feed(c: &mut HysteresisController, samples: &[i32]) {
        for &s in samples {
            c.push_sample(s);
        }
    }

    #[test]
    fn test_window_prefilled_with_zeros() {
        let w = SampleWindow::new(3);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![0, 0, 0]);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut w = SampleWindow::new(3);
        for s in [1, 2, 3, 4] {
            w.push(s);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_budget_treated_as_one() {
        assert_eq!(SampleWindow::new(0).len(), 1);
    }

    #[test]
    fn test_cold_boot_can_switch_off_immediately() {
        let c = controller(3);
        assert_eq!(c.decide(FanState::On, false), FanState::Off);
    }

    #[test]
    fn test_needs_full_window_of_hot_samples() {
        let mut c = controller(3);
        feed(&mut c, &[70, 70]);
        assert_eq!(c.decide(FanState::Off, false), FanState::Off);
        c.push_sample(70);
        assert_eq!(c.decide(FanState::Off, false), FanState::On);
    }

    #[test]
    fn test_mixed_window_keeps_state() {
        let mut c = controller(3);
        feed(&mut c, &[45, 65, 55]);
        assert_eq!(c.decide(FanState::Off, false), FanState::Off);
        assert_eq!(c.decide(FanState::On, false), FanState::On);
    }

    #[test]
    fn test_deadband_keeps_state() {
        let mut c = controller(3);
        feed(&mut c, &[55, 55, 55]);
        assert_eq!(c.decide(FanState::Off, false), FanState::Off);
        assert_eq!(c.decide(FanState::On, false), FanState::On);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut c = controller(3);
        feed(&mut c, &[60, 61, 61]);
        assert_eq!(c.decide(FanState::Off, false), FanState::Off);
        feed(&mut c, &[50, 49, 49]);
        assert_eq!(c.decide(FanState::On, false), FanState::On);
    }

    #[test]
    fn test_override_forces_on() {
        let mut c = controller(3);
        feed(&mut c, &[55, 55, 55]);
        assert_eq!(c.decide(FanState::Off, true), FanState::On);
        assert_eq!(c.decide(FanState::On, true), FanState::On);
    }

    #[test]
    fn test_override_does_not_block_all_low_switch_off() {
        // Zero-filled window: all low, so a running fan still switches off.
        let c = controller(3);
        assert_eq!(c.decide(FanState::Off, true), FanState::On);
        assert_eq!(c.decide(FanState::On, true), FanState::Off);
    }

    #[test]
    fn test_budget_one_is_instantaneous() {
        let mut c = controller(1);
        c.push_sample(61);
        assert_eq!(c.decide(FanState::Off, false), FanState::On);
        c.push_sample(49);
        assert_eq!(c.decide(FanState::On, false), FanState::Off);
    }

    #[test]
    fn test_cold_then_hot_flips_once() {
        let mut c = controller(3);
        let mut state = FanState::Off;
        let mut flips = 0;
        for s in [45, 46, 44, 65, 66, 67] {
            c.push_sample(s);
            let next = c.decide(state, false);
            if next != state {
                flips += 1;
            }
            state = next;
        }
        assert_eq!(state, FanState::On);
        assert_eq!(flips, 1);
    }

    #[test]
    fn test_fan_state_level_round_trip() {
        assert_eq!(FanState::from(FanState::On.level()), FanState::On);
        assert_eq!(FanState::Off.as_gauge(), 0);
        assert_eq!(FanState::On.as_gauge(), 1);
    }
}

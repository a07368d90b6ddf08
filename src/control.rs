// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! The polling loop tying sensor, fan pin, LED and status file together.

use crate::animation::{AnimationEngine, Pattern};
use crate::config::Config;
use crate::exposition::{Exposition, Status};
use crate::gpio::GpioPort;
use crate::hysteresis::{FanState, HysteresisController};
use crate::led::{LedEncoder, LedFrame};
use crate::pacing::Pacer;
use crate::thermal::{OverrideFlag, TemperatureSource, to_sample};
use std::io;
use std::time::Duration;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub status: Status,
    pub pattern: Pattern,
    pub forced: bool,
}

pub struct ControlLoop<P, S, C> {
    port: P,
    sensor: S,
    pacer: C,
    encoder: LedEncoder,
    controller: HysteresisController,
    animation: AnimationEngine,
    override_flag: OverrideFlag,
    exposition: Option<Exposition>,
    fan_pin: u32,
    delay: Duration,
    last_temp: f64,
    forced: bool,
}

impl<P, S, C> ControlLoop<P, S, C>
where
    P: GpioPort,
    S: TemperatureSource,
    C: Pacer,
{
    /// `config` should already be validated.
    pub fn new(config: &Config, port: P, sensor: S, pacer: C) -> Self {
        Self {
            port,
            sensor,
            pacer,
            encoder: LedEncoder::new(
                config.gpio.clock_pin,
                config.gpio.data_pin,
                Duration::from_micros(config.gpio.clock_stretch_us),
            ),
            controller: HysteresisController::new(config.thresholds(), config.budget),
            animation: AnimationEngine::from_config(config),
            override_flag: OverrideFlag::new(&config.paths.override_flag),
            exposition: config.paths.exposition.as_ref().map(Exposition::new),
            fan_pin: config.gpio.fan_pin,
            delay: Duration::from_secs(config.delay),
            last_temp: 0.0,
            forced: false,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn pacer(&self) -> &C {
        &self.pacer
    }

    /// Sample, update the fan, publish status and run the LED for one period.
    pub fn tick(&mut self) -> io::Result<TickReport> {
        match self.sensor.read_celsius() {
            Ok(temp_c) => {
                self.last_temp = temp_c;
                self.controller.push_sample(to_sample(temp_c));
            }
            Err(e) => log::warn!("Temperature read failed, keeping previous samples: {e}"),
        }
        let window: Vec<i32> = self.controller.window().iter().collect();
        log::debug!(
            "Temp: {:.1}, last {}: {window:?}, all low: {}, all high: {}",
            self.last_temp,
            window.len(),
            self.controller.all_low(),
            self.controller.all_high()
        );

        let forced = self.override_flag.is_set();
        if forced != self.forced {
            if forced {
                log::info!("Override file present, forcing fan on");
            } else {
                log::info!("Override file removed");
            }
            self.forced = forced;
        }

        let current = FanState::from(self.port.read(self.fan_pin)?);
        let next = self.controller.decide(current, forced);
        if next != current {
            self.port.write(self.fan_pin, next.level())?;
            log::info!("Fan {:?} -> {next:?} at {:.1}C", current, self.last_temp);
        }
        let fan = FanState::from(self.port.read(self.fan_pin)?);
        log::debug!("Fan state now: {fan:?}");

        let status = Status {
            fan,
            temp_c: to_sample(self.last_temp),
        };
        if let Some(exposition) = &self.exposition {
            if let Err(e) = exposition.write(&status) {
                log::warn!("Failed to write {}: {e}", exposition.path().display());
            }
        }

        let pattern = self.animation.run_tick(
            &mut self.port,
            &self.encoder,
            &mut self.pacer,
            self.last_temp,
            fan,
            forced,
        )?;
        if !pattern.consumes_tick() {
            self.pacer.pause(self.delay);
        }

        Ok(TickReport {
            status,
            pattern,
            forced,
        })
    }

    /// Tick until the pacer reports a stop request. GPIO errors end the loop.
    pub fn run(&mut self) -> io::Result<()> {
        while !self.pacer.stop_requested() {
            self.tick()?;
        }
        Ok(())
    }

    /// Show the shutdown frame. The fan pin is left as it is.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.encoder.send_frame(&mut self.port, LedFrame::SHUTDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Level;
    use crate::gpio::memory::MemoryPort;
    use crate::led::tests::decode_frame;
    use crate::pacing::testing::RecordingPacer;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;

    const FAN: u32 = 18;

    struct Script(VecDeque<io::Result<f64>>);

    impl Script {
        fn new(readings: &[f64]) -> Self {
            Self(readings.iter().map(|&t| Ok(t)).collect())
        }
    }

    impl TemperatureSource for Script {
        fn read_celsius(&mut self) -> io::Result<f64> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::other("script exhausted")))
        }
    }

    fn test_config(dir: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.delay = 1;
        cfg.brightness = 10;
        cfg.gpio.clock_stretch_us = 0;
        cfg.paths.override_flag = dir.join(".force_fanshim");
        cfg.paths.exposition = Some(dir.join("cpu_fan.prom"));
        cfg
    }

    fn control_loop(
        cfg: &Config,
        readings: &[f64],
    ) -> ControlLoop<MemoryPort, Script, RecordingPacer> {
        ControlLoop::new(
            cfg,
            MemoryPort::recording(),
            Script::new(readings),
            RecordingPacer::default(),
        )
    }

    fn fan_level(cl: &mut ControlLoop<MemoryPort, Script, RecordingPacer>) -> Level {
        cl.port_mut().read(FAN).unwrap()
    }

    #[test]
    fn test_cold_then_hot_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = control_loop(&cfg, &[45.2, 46.0, 44.9, 65.0, 66.0, 67.5]);

        for _ in 0..3 {
            let report = cl.tick().unwrap();
            assert_eq!(report.status.fan, FanState::Off);
        }
        assert_eq!(fan_level(&mut cl), Level::Low);

        let fan_writes = |cl: &ControlLoop<MemoryPort, Script, RecordingPacer>| {
            cl.port().history().iter().filter(|(p, _)| *p == FAN).count()
        };

        cl.tick().unwrap();
        cl.tick().unwrap();
        assert_eq!(fan_level(&mut cl), Level::Low);
        let report = cl.tick().unwrap();
        assert_eq!(report.status, Status { fan: FanState::On, temp_c: 67 });
        assert_eq!(fan_level(&mut cl), Level::High);
        assert_eq!(fan_writes(&cl), 1);

        let prom = fs::read_to_string(dir.path().join("cpu_fan.prom")).unwrap();
        assert!(prom.contains("cpu_fanshim 1\n"));
        assert!(prom.contains("cpu_temp_fanshim 67\n"));
    }

    #[test]
    fn test_static_tick_sleeps_delay() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = control_loop(&cfg, &[40.0]);
        let report = cl.tick().unwrap();
        assert_eq!(report.pattern, Pattern::Static);
        assert_eq!(cl.pacer().pauses, vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_blink_tick_replaces_idle_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.blink = 1;
        cfg.delay = 2;
        let mut cl = control_loop(&cfg, &[40.0]);
        let report = cl.tick().unwrap();
        assert_eq!(report.pattern, Pattern::Blink);
        assert_eq!(cl.pacer().total(), Duration::from_secs(2));
        assert_eq!(cl.pacer().pauses.len(), 4);
    }

    #[test]
    fn test_override_forces_fan_and_static_led() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.blink = 2;
        fs::write(&cfg.paths.override_flag, "").unwrap();
        let mut cl = control_loop(&cfg, &[55.0, 55.0, 55.0, 30.0]);

        let report = cl.tick().unwrap();
        assert!(report.forced);
        assert_eq!(report.status.fan, FanState::On);
        assert_eq!(report.pattern, Pattern::Static);

        // Deadband window: forced fan stays on.
        cl.tick().unwrap();
        let report = cl.tick().unwrap();
        assert_eq!(report.status.fan, FanState::On);
        assert_eq!(report.pattern, Pattern::Static);

        fs::remove_file(&cfg.paths.override_flag).unwrap();
        let report = cl.tick().unwrap();
        assert!(!report.forced);
        assert_eq!(report.status.fan, FanState::On);
    }

    #[test]
    fn test_override_with_cold_window_alternates() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        fs::write(&cfg.paths.override_flag, "").unwrap();
        let mut cl = control_loop(&cfg, &[30.0, 30.0, 30.0]);

        // All-low switches a running fan off even while forced; the next
        // forced tick switches it back on.
        assert_eq!(cl.tick().unwrap().status.fan, FanState::On);
        assert_eq!(cl.tick().unwrap().status.fan, FanState::Off);
        assert_eq!(cl.tick().unwrap().status.fan, FanState::On);
    }

    #[test]
    fn test_running_fan_is_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = control_loop(&cfg, &[55.0]);
        cl.port_mut().preset(FAN, Level::High);
        let report = cl.tick().unwrap();
        assert_eq!(report.status.fan, FanState::On);
    }

    #[test]
    fn test_sensor_failure_keeps_last_reading() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = control_loop(&cfg, &[52.4]);
        cl.tick().unwrap();
        let report = cl.tick().unwrap();
        assert_eq!(report.status.temp_c, 52);
        let window: Vec<i32> = cl.controller.window().iter().collect();
        assert_eq!(window, vec![0, 0, 52]);
    }

    #[test]
    fn test_missing_exposition_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        cfg.paths.exposition = Some(blocker.join("cpu_fan.prom"));
        let mut cl = control_loop(&cfg, &[40.0]);
        assert!(cl.tick().is_ok());
    }

    #[test]
    fn test_run_stops_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = ControlLoop::new(
            &cfg,
            MemoryPort::recording(),
            Script::new(&[40.0, 41.0, 42.0]),
            RecordingPacer::stopping_after(2),
        );
        cl.run().unwrap();
        assert_eq!(cl.pacer().pauses.len(), 2);
    }

    #[test]
    fn test_shutdown_shows_sentinel_frame() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let mut cl = control_loop(&cfg, &[]);
        cl.shutdown().unwrap();
        assert_eq!(decode_frame(cl.port().history()), LedFrame::SHUTDOWN.to_bytes());
    }

    #[test]
    fn test_dark_led_sends_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.brightness = 0;
        let mut cl = control_loop(&cfg, &[40.0, 40.0]);
        let report = cl.tick().unwrap();
        assert_eq!(report.pattern, Pattern::Off);
        assert_eq!(decode_frame(cl.port().history()), LedFrame::DARK.to_bytes());
        cl.port_mut().clear_history();
        cl.tick().unwrap();
        assert!(cl.port().history().is_empty());
        assert_eq!(cl.pacer().pauses.len(), 2);
    }
}

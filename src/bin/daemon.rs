// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! fanshimd: system service that switches the Fan SHIM with hysteresis
//! and shows the temperature on its LED.

use anyhow::Context;
use clap::Parser;
use fanshim::config::{self, Config, GpioBackend};
use fanshim::control::ControlLoop;
use fanshim::gpio;
use fanshim::pacing::SleepPacer;
use fanshim::thermal::ThermalZone;
use nix::sys::signal::Signal;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "fanshimd", about = "Raspberry Pi Fan SHIM daemon")]
struct Cli {
    /// Path to the configuration file (JSON, or TOML with a .toml extension).
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the GPIO backend.
    #[arg(short, long, value_enum)]
    backend: Option<GpioBackend>,

    /// Override the Prometheus textfile path.
    #[arg(short, long)]
    exposition: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = config::resolve_config_path(Some(&cli.config));
    let mut cfg = config::load_config(&config_path)
        .map_err(|e| e.to_string())
        .and_then(|cfg| cfg.validate().map(|()| cfg))
        .unwrap_or_else(|e| {
            log::warn!("Could not use config: {e}, using defaults");
            Config::default()
        });

    if let Some(backend) = cli.backend {
        cfg.gpio.backend = backend;
    }
    if let Some(path) = cli.exposition {
        cfg.paths.exposition = Some(path);
    }
    log_config(&cfg);

    let stop = Arc::new(AtomicUsize::new(0));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_usize(signal, Arc::clone(&stop), signal as usize)
            .with_context(|| format!("Failed to register handler for signal {signal}"))?;
    }
    let pacer = SleepPacer::new(Arc::clone(&stop));

    let port = gpio::open(&cfg.gpio).context("Failed to open GPIO")?;
    let sensor = ThermalZone::new(&cfg.paths.thermal_zone);
    let mut control = ControlLoop::new(&cfg, port, sensor, pacer.clone());
    log::info!("fanshim init.");

    // A GPIO failure leaves the fan and LED as they were last driven.
    if let Err(e) = control.run() {
        log::error!("GPIO failure, leaving fan and LED untouched: {e}");
        return Err(e).context("GPIO write failed");
    }

    match pacer.stop_signal().and_then(|n| Signal::try_from(n).ok()) {
        Some(signal) => log::info!("Received {signal:?}, shutting down"),
        None => log::info!("Shutting down"),
    }
    control
        .shutdown()
        .context("Failed to show shutdown frame")?;
    log::info!("closed");
    Ok(())
}

fn log_config(cfg: &Config) {
    log::info!(
        "on-threshold => {}, off-threshold => {}, budget => {}, delay => {}s",
        cfg.on_threshold,
        cfg.off_threshold,
        cfg.budget,
        cfg.delay
    );
    log::info!(
        "brightness => {}, blink => {}, breath_brgt => {}",
        cfg.led_brightness(),
        cfg.blink,
        cfg.breath_brgt
    );
    log::info!(
        "thermal zone {}, override flag {}",
        cfg.paths.thermal_zone.display(),
        cfg.paths.override_flag.display()
    );
    match &cfg.paths.exposition {
        Some(path) => log::info!("status file {}", path.display()),
        None => log::info!("status file disabled"),
    }
}

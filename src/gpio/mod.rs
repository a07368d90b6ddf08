// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! GPIO access.
//!
//! Everything above this module talks to pins through [`GpioPort`]; each
//! submodule is one driver for it.

pub mod bcm;
pub mod cdev;
pub mod memory;
pub mod sysfs;

use crate::config::{GpioBackend, GpioConfig};
use std::io;

/// Logic level of an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Output pins the daemon drives, already configured as outputs.
pub trait GpioPort {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()>;

    /// Read back the level of a pin.
    fn read(&mut self, pin: u32) -> io::Result<Level>;
}

impl<T: GpioPort + ?Sized> GpioPort for Box<T> {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()> {
        (**self).write(pin, level)
    }

    fn read(&mut self, pin: u32) -> io::Result<Level> {
        (**self).read(pin)
    }
}

/// Open the configured driver and claim the fan, clock and data pins.
pub fn open(config: &GpioConfig) -> io::Result<Box<dyn GpioPort>> {
    let pins = [config.fan_pin, config.clock_pin, config.data_pin];

    let port: Box<dyn GpioPort> = match config.backend {
        GpioBackend::Sysfs => Box::new(sysfs::SysfsGpio::open(&config.sysfs_root, &pins)?),
        GpioBackend::Cdev => Box::new(cdev::CdevGpio::open(&config.chip, &pins)?),
        GpioBackend::Gpiomem => Box::new(bcm::BcmGpio::open(&pins)?),
        GpioBackend::DryRun => Box::new(memory::MemoryPort::new()),
    };

    log::info!(
        "GPIO backend {:?}: fan={} clock={} data={}",
        config.backend,
        config.fan_pin,
        config.clock_pin,
        config.data_pin
    );
    Ok(port)
}

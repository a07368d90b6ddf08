// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! BCM283x GPIO through `/dev/gpiomem`, driven by `rppal`.
//!
//! The kernel maps only the GPIO block into that device, so no root
//! privileges are needed.

use super::{GpioPort, Level};
use rppal::gpio::{Gpio, OutputPin};
use std::collections::HashMap;
use std::io;

/// Highest BCM pin number on the 40-pin header SoCs.
const MAX_PIN: u32 = 53;

pub struct BcmGpio {
    pins: HashMap<u32, OutputPin>,
}

impl BcmGpio {
    /// Claim `pins` as outputs. A pin already driven keeps its level.
    pub fn open(pins: &[u32]) -> io::Result<Self> {
        let gpio = Gpio::new().map_err(io::Error::other)?;

        let mut claimed = HashMap::with_capacity(pins.len());
        for &pin in pins {
            let mut output = gpio
                .get(bcm_pin(pin)?)
                .map_err(io::Error::other)?
                .into_output();
            // The fan must keep running after the daemon exits.
            output.set_reset_on_drop(false);
            claimed.insert(pin, output);
        }
        Ok(Self { pins: claimed })
    }

    fn pin(&mut self, pin: u32) -> io::Result<&mut OutputPin> {
        self.pins.get_mut(&pin).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("GPIO {pin} not claimed"))
        })
    }
}

impl GpioPort for BcmGpio {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()> {
        let output = self.pin(pin)?;
        match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        }
        Ok(())
    }

    fn read(&mut self, pin: u32) -> io::Result<Level> {
        Ok(Level::from(self.pin(pin)?.is_set_high()))
    }
}

fn bcm_pin(pin: u32) -> io::Result<u8> {
    if pin > MAX_PIN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("GPIO {pin} out of range 0..={MAX_PIN}"),
        ));
    }
    u8::try_from(pin).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

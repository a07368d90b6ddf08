// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Bit-banged APA102 driver for the single LED on the Fan SHIM.
//!
//! A frame on the wire is a 32-bit start frame of zeros, one 32-bit LED
//! frame `<0xE0 | brightness> <blue> <green> <red>` and an end frame of at
//! least n/2 one-bits for n LEDs. Data is sampled on the rising clock edge.

use crate::color::Color;
use crate::config::MAX_BRIGHTNESS;
use crate::gpio::{GpioPort, Level};
use std::io;
use std::thread;
use std::time::Duration;

const START_FRAME_BITS: usize = 32;
const LED_COUNT: usize = 1;
const END_FRAME_BITS: usize = LED_COUNT.div_ceil(2);
const LED_FRAME_MARKER: u8 = 0b1110_0000;

/// Brightness and color for one LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedFrame {
    /// 5-bit global brightness, 0-31.
    pub brightness: u8,
    pub color: Color,
}

impl LedFrame {
    /// LED off.
    pub const DARK: LedFrame = LedFrame {
        brightness: 0,
        color: Color::BLACK,
    };

    /// Dim blue shown when the daemon stops.
    pub const SHUTDOWN: LedFrame = LedFrame {
        brightness: 3,
        color: Color::new(0, 0, 190),
    };

    /// Brightness above 31 is clamped.
    pub fn new(brightness: u8, color: Color) -> Self {
        Self {
            brightness: brightness.min(MAX_BRIGHTNESS),
            color,
        }
    }

    /// The four bytes of the LED frame in wire order.
    pub fn to_bytes(self) -> [u8; 4] {
        [
            LED_FRAME_MARKER | (self.brightness & MAX_BRIGHTNESS),
            self.color.b,
            self.color.g,
            self.color.r,
        ]
    }
}

/// Drives the clock and data lines. Holds no LED state; every call sends a
/// complete frame.
#[derive(Debug, Clone)]
pub struct LedEncoder {
    clock_pin: u32,
    data_pin: u32,
    stretch: Duration,
}

impl LedEncoder {
    /// `stretch` is how long each clock phase is held; zero skips the sleep.
    pub fn new(clock_pin: u32, data_pin: u32, stretch: Duration) -> Self {
        Self {
            clock_pin,
            data_pin,
            stretch,
        }
    }

    /// Shift out one byte, most significant bit first.
    pub fn write_byte<P: GpioPort + ?Sized>(&self, port: &mut P, byte: u8) -> io::Result<()> {
        for bit in (0..8).rev() {
            port.write(self.data_pin, Level::from(byte & (1 << bit) != 0))?;
            self.pulse(port)?;
        }
        Ok(())
    }

    pub fn send_frame<P: GpioPort + ?Sized>(&self, port: &mut P, frame: LedFrame) -> io::Result<()> {
        port.write(self.data_pin, Level::Low)?;
        for _ in 0..START_FRAME_BITS {
            self.pulse(port)?;
        }

        for byte in frame.to_bytes() {
            self.write_byte(port, byte)?;
        }

        port.write(self.data_pin, Level::High)?;
        for _ in 0..END_FRAME_BITS {
            self.pulse(port)?;
        }
        Ok(())
    }

    fn pulse<P: GpioPort + ?Sized>(&self, port: &mut P) -> io::Result<()> {
        port.write(self.clock_pin, Level::High)?;
        self.hold();
        port.write(self.clock_pin, Level::Low)?;
        self.hold();
        Ok(())
    }

    fn hold(&self) {
        if !self.stretch.is_zero() {
            thread::sleep(self.stretch);
        }
    }
}

// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! GPIO character device (`/dev/gpiochipN`) backend via `gpiocdev`.
//!
//! All three lines are taken in one request and held until the port is
//! dropped. Lines start inactive, so the fan is off after start-up.

use super::{GpioPort, Level};
use gpiocdev::Request;
use gpiocdev::line::Value;
use std::io;
use std::path::Path;

const CONSUMER: &str = "fanshim";

pub struct CdevGpio {
    request: Request,
}

impl CdevGpio {
    pub fn open(chip: &Path, pins: &[u32]) -> io::Result<Self> {
        let request = Request::builder()
            .on_chip(chip)
            .with_consumer(CONSUMER)
            .with_lines(pins)
            .as_output(Value::Inactive)
            .request()
            .map_err(io::Error::other)?;
        log::debug!("Requested lines {pins:?} on {}", chip.display());
        Ok(Self { request })
    }
}

impl GpioPort for CdevGpio {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()> {
        self.request
            .set_value(pin, to_value(level))
            .map_err(io::Error::other)
    }

    fn read(&mut self, pin: u32) -> io::Result<Level> {
        self.request
            .value(pin)
            .map(from_value)
            .map_err(io::Error::other)
    }
}

fn to_value(level: Level) -> Value {
    match level {
        Level::High => Value::Active,
        Level::Low => Value::Inactive,
    }
}

fn from_value(value: Value) -> Level {
    match value {
        Value::Active => Level::High,
        Value::Inactive => Level::Low,
    }
}

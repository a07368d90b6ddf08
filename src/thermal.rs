// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! SoC temperature and the force-on override file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where temperature readings come from.
pub trait TemperatureSource {
    /// Current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> io::Result<f64>;
}

/// A kernel thermal zone `temp` file, reporting millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZone {
    path: PathBuf,
}

impl ThermalZone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSource for ThermalZone {
    fn read_celsius(&mut self) -> io::Result<f64> {
        let raw = fs::read_to_string(&self.path)?;
        let millic = raw.trim().parse::<i64>().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Bad reading {:?} from {}: {e}", raw.trim(), self.path.display()),
            )
        })?;
        Ok(millic as f64 / 1000.0)
    }
}

/// Truncate a reading to the whole-degree sample used for hysteresis.
pub fn to_sample(temp_c: f64) -> i32 {
    temp_c.trunc() as i32
}

/// The fan is forced on while this file exists.
#[derive(Debug, Clone)]
pub struct OverrideFlag {
    path: PathBuf,
}

impl OverrideFlag {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }
}

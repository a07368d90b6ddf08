// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Legacy sysfs GPIO interface (`/sys/class/gpio`).
//!
//! Each pin is exported, switched to output and its `value` file kept open
//! so clocking the LED doesn't reopen a file per edge.

use super::{GpioPort, Level};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// udev may still be fixing permissions right after export.
const EXPORT_RETRIES: u32 = 20;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct SysfsGpio {
    values: HashMap<u32, File>,
}

impl SysfsGpio {
    /// Export `pins` under `root` and configure them as outputs.
    ///
    /// A pin that is already an output keeps its level, so a running fan
    /// is not stopped by a daemon restart.
    pub fn open(root: &Path, pins: &[u32]) -> io::Result<Self> {
        let mut values = HashMap::new();
        for &pin in pins {
            let dir = pin_dir(root, pin);
            if !dir.exists() {
                fs::write(root.join("export"), pin.to_string())?;
                log::debug!("Exported GPIO {pin}");
            }
            with_retries(|| ensure_output(&dir))?;
            let file = with_retries(|| {
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(dir.join("value"))
            })?;
            values.insert(pin, file);
        }
        Ok(Self { values })
    }

    fn value_file(&self, pin: u32) -> io::Result<&File> {
        self.values.get(&pin).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("GPIO {pin} was not opened"))
        })
    }
}

impl GpioPort for SysfsGpio {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()> {
        let byte: &[u8] = match level {
            Level::Low => b"0",
            Level::High => b"1",
        };
        self.value_file(pin)?.write_all_at(byte, 0)
    }

    fn read(&mut self, pin: u32) -> io::Result<Level> {
        let mut buf = [0u8; 1];
        let n = self.value_file(pin)?.read_at(&mut buf, 0)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("GPIO {pin} value file is empty"),
            ));
        }
        Ok(Level::from(buf[0] == b'1'))
    }
}

fn pin_dir(root: &Path, pin: u32) -> PathBuf {
    root.join(format!("gpio{pin}"))
}

fn ensure_output(dir: &Path) -> io::Result<()> {
    let direction = dir.join("direction");
    let current = fs::read_to_string(&direction)?;
    if current.trim() != "out" {
        fs::write(&direction, "out")?;
    }
    Ok(())
}

fn with_retries<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e)
                if attempt < EXPORT_RETRIES
                    && matches!(
                        e.kind(),
                        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
                    ) =>
            {
                attempt += 1;
                thread::sleep(EXPORT_RETRY_DELAY);
            }
            result => return result,
        }
    }
}

// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Prometheus textfile-collector output.
//!
//! node_exporter may read the file at any moment, so it is written to a
//! sibling temp file and renamed into place.

use crate::hysteresis::FanState;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What one tick reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub fan: FanState,
    pub temp_c: i32,
}

impl Status {
    /// Render in the text exposition format.
    pub fn render(&self) -> String {
        format!(
            "# HELP cpu_fanshim text file output: fan state.\n\
             # TYPE cpu_fanshim gauge\n\
             cpu_fanshim {}\n\
             # HELP cpu_temp_fanshim text file output: temp.\n\
             # TYPE cpu_temp_fanshim gauge\n\
             cpu_temp_fanshim {}\n",
            self.fan.as_gauge(),
            self.temp_c
        )
    }
}

#[derive(Debug, Clone)]
pub struct Exposition {
    path: PathBuf,
}

impl Exposition {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `status`, creating parent directories if needed.
    pub fn write(&self, status: &Status) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, status.render())?;
        fs::rename(&tmp, &self.path)
    }
}

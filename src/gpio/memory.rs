// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! In-memory pins for dry runs, optionally recording every write.

use super::{GpioPort, Level};
use std::collections::HashMap;
use std::io;

#[derive(Debug, Default)]
pub struct MemoryPort {
    levels: HashMap<u32, Level>,
    history: Option<Vec<(u32, Level)>>,
}

impl MemoryPort {
    /// All pins start low. Writes are not kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`MemoryPort::new`] but every write is appended to [`history`](Self::history).
    pub fn recording() -> Self {
        Self {
            levels: HashMap::new(),
            history: Some(Vec::new()),
        }
    }

    /// Set a level without recording it, e.g. to simulate hardware state.
    pub fn preset(&mut self, pin: u32, level: Level) {
        self.levels.insert(pin, level);
    }

    pub fn history(&self) -> &[(u32, Level)] {
        self.history.as_deref().unwrap_or_default()
    }

    pub fn clear_history(&mut self) {
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }
}

impl GpioPort for MemoryPort {
    fn write(&mut self, pin: u32, level: Level) -> io::Result<()> {
        self.levels.insert(pin, level);
        if let Some(history) = self.history.as_mut() {
            history.push((pin, level));
        }
        Ok(())
    }

    fn read(&mut self, pin: u32) -> io::Result<Level> {
        Ok(self.levels.get(&pin).copied().unwrap_or_default())
    }
}

// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Fan SHIM control for the Raspberry Pi.
//!
//! Reads the SoC temperature, switches the fan pin with hysteresis and
//! shows the thermal state on the board's single APA102 LED.

pub mod animation;
pub mod color;
pub mod config;
pub mod control;
pub mod exposition;
pub mod gpio;
pub mod hysteresis;
pub mod led;
pub mod pacing;
pub mod thermal;

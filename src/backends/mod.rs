// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for capture hardware
//!
//! # Modules
//!
//! - [`camera`]: Device selection, session lifecycle and the hardware trait

pub mod camera;

// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured media
//!
//! ```text
//! ┌───────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Running       │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG File   │
//! │ Session       │     │  - Capture        │     │              │
//! │               │     │  - Verify         │     │              │
//! │               │     │  - Classify/Save  │     │              │
//! └───────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Design Principles
//!
//! 1. **Non-blocking**: The shutter returns immediately, preview never waits on a capture
//! 2. **Exactly once**: Every request's result sink fires once, on every path
//!
//! # Modules
//!
//! - [`photo`]: Single-shot capture, payload verification, classification and saving

pub mod photo;

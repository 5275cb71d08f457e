//! Utility functions and helpers for the GitHub gateway.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and token redaction.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;

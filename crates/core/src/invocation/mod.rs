//! Invocation of the external cuesheet tool.
//!
//! This module provides:
//! - Tool lookup (`tool`)
//! - The fixed configuration-to-argv mapping (`arguments`)
//! - Subprocess spawning and output forwarding (`executor`)
//! - The controller that owns a run from start to terminal state (`controller`)

pub mod arguments;
pub mod controller;
pub mod error;
pub mod executor;
pub mod tool;

pub use controller::{InvocationController, RunHandle};
pub use error::{CancelError, InvocationError, InvocationResult, StartError};

//! # qs-core
//!
//! Invocation core for qs-runner.
//!
//! This crate provides:
//! - Settings loading from the `.qsrunner/` directory
//! - Lookup of the external cuesheet tool
//! - The fixed mapping from form configuration to tool arguments
//! - The invocation controller that starts, watches and cancels runs
//! - The run state machine
//!
//! ## Modules
//!
//! - [`config`]: Settings loading and management
//! - [`invocation`]: Tool lookup, argument building, process control
//! - [`state`]: Run state machine

pub mod config;
pub mod invocation;
pub mod state;

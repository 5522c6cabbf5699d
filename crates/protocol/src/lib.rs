//! # qs-protocol
//!
//! Shared data models for qs-runner.
//!
//! This crate defines the structures exchanged between the invocation core
//! and whatever front end drives it:
//! - The form configuration that feeds the external cuesheet tool
//! - Run status and terminal outcomes
//! - Operations and Events for UI-Core communication
//!
//! ## Modules
//!
//! - [`config_models`]: Configuration, paper sizes, tracks and toggles
//! - [`process_models`]: Run status, outcomes and state snapshots
//! - [`ipc`]: Operations and Events for UI-Core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, uuid and chrono
//! - Independent compilation: No dependencies on other qs-runner crates

pub mod config_models;
pub mod ipc;
pub mod process_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use process_models::*;

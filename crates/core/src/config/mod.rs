//! Settings loading and management.
//!
//! This module loads the optional `.qsrunner/config.toml` file that names
//! the external tool and seeds the form defaults.

pub mod error;
pub mod loader;
pub mod models;

//! Common test utilities for controller integration tests.
//!
//! This module provides shared functionality across tests:
//! - Fixtures (stand-in tool scripts, input files, controllers)
//! - Event assertions

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
pub use fixtures::*;

//! Run state management.
//!
//! This module provides the run state machine: the single `RunState` owned
//! by the invocation controller and its transition functions.

pub mod run;

//! Command implementations for the devhost CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod ancestry;
pub mod attach;
pub mod doctor;
pub mod git;
pub mod plan;

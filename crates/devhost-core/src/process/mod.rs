//! Process ancestry resolution.
//!
//! The pid an orchestrator reports usually belongs to a launcher shim, not the
//! application itself. This module walks the OS process tree to find the real
//! worker:
//!
//! ```text
//! orchestrator ──► launcher (reported pid) ──► worker (debug target)
//! ```
//!
//! Processes are identified by `(pid, start_time)`. A parent that started after
//! its supposed child is a recycled pid and is never reported as the parent.
//! Every OS-level failure degrades to "unknown" (`None`).

mod ancestry;
mod inspector;

pub use ancestry::*;
pub use inspector::*;

#[cfg(test)]
pub(crate) mod fake;

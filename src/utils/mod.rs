//! Utility modules for process-level concerns
//!
//! Provides the interrupt and fatal-error hooks and memory usage reporting.

pub mod hooks;
pub mod memory;

pub use memory::MemoryUsage;

//! Process memory usage reporting
//!
//! Reads the resident set size from `/proc/self/status` where available.

use std::fmt;
use tracing::debug;

/// Snapshot of the current process memory usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    resident_bytes: Option<u64>,
}

impl MemoryUsage {
    /// Sample the current resident set size
    pub fn current() -> Self {
        Self {
            resident_bytes: read_resident_bytes(),
        }
    }

    /// Resident set size in bytes, when the platform reports it
    pub const fn resident_bytes(&self) -> Option<u64> {
        self.resident_bytes
    }
}

impl fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resident_bytes {
            Some(bytes) => write!(f, "memory: {:.1} MB", bytes as f64 / (1024.0 * 1024.0)),
            None => write!(f, "memory: unavailable"),
        }
    }
}

#[cfg(target_os = "linux")]
fn read_resident_bytes() -> Option<u64> {
    match std::fs::read_to_string("/proc/self/status") {
        Ok(status) => parse_vm_rss_bytes(&status),
        Err(e) => {
            debug!("Failed to read /proc/self/status: {}", e);
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn read_resident_bytes() -> Option<u64> {
    debug!("Memory usage is not available on {}", std::env::consts::OS);
    None
}

/// Extract `VmRSS` (reported in kB) as bytes
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_rss_bytes(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut parts = line.split_whitespace().skip(1);
    let kibibytes = parts.next()?.parse::<u64>().ok()?;
    match parts.next().unwrap_or("kB") {
        "kB" => kibibytes.checked_mul(1024),
        _ => None,
    }
}

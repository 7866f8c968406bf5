//! Process-wide interrupt and fatal-error hooks
//!
//! An interrupt does not stop the run: it dumps the timing statistics of the
//! active driver to stderr and lets the interrupted work continue. A second
//! interrupt exits the process.

use crate::{
    core::stats::TimingStats,
    error::{DriverError, Result},
};
use std::{
    io, panic, process,
    sync::{
        Arc, Mutex, Once, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::{error, info, warn};

/// Exit status after a repeated interrupt (128 + SIGINT)
pub const INTERRUPT_EXIT_CODE: i32 = 130;

static INSTALL: Once = Once::new();
static ACTIVE_STATS: Mutex<Option<Arc<TimingStats>>> = Mutex::new(None);
static INTERRUPTS: AtomicUsize = AtomicUsize::new(0);

/// Point the hooks at `stats` and install them on first use
pub fn install(stats: Arc<TimingStats>) -> Result<()> {
    *ACTIVE_STATS.lock().unwrap_or_else(PoisonError::into_inner) = Some(stats);

    let mut outcome = Ok(());
    INSTALL.call_once(|| {
        install_panic_hook();
        outcome = ctrlc::set_handler(on_interrupt)
            .map_err(|e| DriverError::hook("Failed to install interrupt handler", e));
    });
    outcome
}

/// Write the active statistics to `out`; returns false when none are active
pub fn dump_active_stats<W: io::Write>(out: &mut W) -> io::Result<bool> {
    let stats = ACTIVE_STATS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    match stats {
        Some(stats) => stats.write_report(out).map(|()| true),
        None => Ok(false),
    }
}

/// What the process does after an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    Continue,
    Exit,
}

/// Dump the active statistics to `out` for the `count`-th interrupt
///
/// The first interrupt only reports; any later one asks for an exit.
pub fn handle_interrupt<W: io::Write>(count: usize, out: &mut W) -> io::Result<InterruptAction> {
    dump_active_stats(out)?;
    if count > 1 {
        Ok(InterruptAction::Exit)
    } else {
        Ok(InterruptAction::Continue)
    }
}

fn on_interrupt() {
    let count = INTERRUPTS.fetch_add(1, Ordering::SeqCst) + 1;

    let action = handle_interrupt(count, &mut io::stderr().lock()).unwrap_or_else(|e| {
        warn!("Failed to write statistics: {}", e);
        if count > 1 {
            InterruptAction::Exit
        } else {
            InterruptAction::Continue
        }
    });

    match action {
        InterruptAction::Exit => {
            warn!("Interrupted again, exiting");
            process::exit(INTERRUPT_EXIT_CODE);
        }
        InterruptAction::Continue => info!("Interrupt received; interrupt again to stop"),
    }
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown cause".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!("Fatal error at {}: {}", location, payload);
        previous(info);
    }));
}

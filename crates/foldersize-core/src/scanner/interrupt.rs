/// Interrupt controller — the `Running → Stopping → Stopped` state machine.
///
/// Cancellation is cooperative: workers poll [`InterruptController::is_stopping`]
/// between directory listings. A listing already in progress always runs to
/// completion, so its immediate size is committed.
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunPhase {
    Running = 0,
    /// Stop requested; workers are finishing their current directory.
    Stopping = 1,
    /// All workers have exited.
    Stopped = 2,
}

impl RunPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
pub struct InterruptController {
    phase: AtomicU8,
    /// Set when the run passed through `Stopping`.
    interrupted: AtomicBool,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(RunPhase::Running as u8),
            interrupted: AtomicBool::new(false),
        }
    }

    /// Move `Running → Stopping`. Returns `false` if the run was already
    /// stopping or stopped.
    pub fn request_stop(&self) -> bool {
        let moved = self
            .phase
            .compare_exchange(
                RunPhase::Running as u8,
                RunPhase::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            self.interrupted.store(true, Ordering::SeqCst);
        }
        moved
    }

    /// Mark the run as `Stopped`. Called once every worker has exited.
    pub fn finish(&self) {
        self.phase.store(RunPhase::Stopped as u8, Ordering::SeqCst);
    }

    /// `true` once a stop has been requested (or the run is over).
    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.phase.load(Ordering::Relaxed) != RunPhase::Running as u8
    }

    /// `true` if the run was cut short by [`request_stop`](Self::request_stop).
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }
}

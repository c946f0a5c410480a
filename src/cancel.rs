//! Process-wide cancellation state.
//!
//! Two requests exist, and they are deliberately asymmetric:
//!
//! * **cooperative cancel**: stop issuing new work, terminate the
//!   in-flight stage child, run artifact cleanup, exit non-zero. Raised
//!   by the first Ctrl-C or the `x` key.
//! * **force quit**: exit the process immediately, skipping cleanup.
//!   Raised by a second Ctrl-C or the `q` key. The trade-off is explicit:
//!   fastest possible exit over guaranteed tidiness; a later run is never
//!   blocked by the leftovers because stage outputs always land on fresh
//!   unique paths.
//!
//! The signal-handler task and the stdin key-listener thread never touch
//! cleanup themselves beyond the force-quit fast path:
//! they only push [`CancelEvent`]s on a channel. The main control flow
//! drains that channel at defined checkpoints via [`CancelController::poll`],
//! which is where events become flag sets. Flags are monotone (once set
//! they are never cleared), so the only synchronisation needed is atomic
//! loads and stores.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Key that requests a cooperative cancel.
pub const CANCEL_KEY: u8 = b'x';
/// Key that requests an immediate, cleanup-skipping exit.
pub const FORCE_QUIT_KEY: u8 = b'q';

/// An event pushed by the signal handler or the key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelEvent {
    /// Stop gracefully: finish terminating in-flight work, clean up, exit 1.
    Cancel,
    /// Exit the process right now, skipping cleanup.
    ForceQuit,
}

/// Owns the cancellation flags, the event queue, and the pid of the
/// currently running stage child.
///
/// One controller exists per [`crate::run::PipelineRun`] and is shared
/// (via `Arc`) with the background tasks it spawns and with the stage
/// runner.
pub struct CancelController {
    cancelled: AtomicBool,
    tx: UnboundedSender<CancelEvent>,
    events: Mutex<UnboundedReceiver<CancelEvent>>,
    current_child: Mutex<Option<u32>>,
}

impl CancelController {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            tx,
            events: Mutex::new(rx),
            current_child: Mutex::new(None),
        })
    }

    /// Drain pending events and report whether a cooperative cancel is in
    /// effect. This is the checkpoint the main control flow (and the
    /// stage runner's poll loop) calls every poll interval.
    ///
    /// A `ForceQuit` event terminates the process from here without
    /// running cleanup.
    pub fn poll(&self) -> bool {
        if let Ok(mut rx) = self.events.try_lock() {
            while let Ok(event) = rx.try_recv() {
                match event {
                    CancelEvent::Cancel => {
                        if !self.cancelled.swap(true, Ordering::SeqCst) {
                            info!("cancellation requested, stopping pipeline");
                        }
                    }
                    CancelEvent::ForceQuit => self.force_quit(),
                }
            }
        }
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Read the cooperative-cancel flag without draining events.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request a cooperative cancel programmatically (same path the
    /// signal handler takes).
    pub fn request_cancel(&self) {
        let _ = self.tx.send(CancelEvent::Cancel);
    }

    /// Publish (or clear) the pid of the live stage child so it can be
    /// terminated from outside the stage runner.
    pub fn set_current_child(&self, pid: Option<u32>) {
        if let Ok(mut slot) = self.current_child.lock() {
            *slot = pid;
        }
    }

    /// Pid of the currently running stage child, if any.
    pub fn current_child(&self) -> Option<u32> {
        self.current_child.lock().ok().and_then(|slot| *slot)
    }

    /// Kill the in-flight stage child, if any, and exit without cleanup.
    /// Graceful termination is the stage runner's job; this path is for
    /// when the user wants out right now.
    fn force_quit(&self) -> ! {
        warn!("force quit requested, exiting without cleanup");
        #[cfg(unix)]
        if let Some(pid) = self.current_child() {
            let _ = std::process::Command::new("kill")
                .args(["-KILL", &pid.to_string()])
                .output();
        }
        std::process::exit(1);
    }

    /// Spawn the interrupt-signal task: the first Ctrl-C pushes a
    /// cooperative cancel, a repeat escalates to force quit. The handler
    /// itself never runs cleanup.
    pub fn spawn_signal_handler(self: &Arc<Self>) {
        let ctl = Arc::clone(self);
        tokio::spawn(async move {
            let mut interrupts = 0u32;
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                interrupts += 1;
                if interrupts == 1 {
                    let _ = ctl.tx.send(CancelEvent::Cancel);
                } else {
                    ctl.force_quit();
                }
            }
        });
    }

    /// Spawn the stdin key listener on a detached OS thread.
    ///
    /// This must not run on the async runtime: a read blocked on an open,
    /// silent stdin (every interactive terminal session) would land on
    /// the blocking pool, and runtime shutdown waits for blocking tasks,
    /// so the process would hang after the run finished. A detached
    /// thread is simply abandoned at exit instead.
    ///
    /// Returns on EOF, after forwarding one of the two designated keys,
    /// or at the first read completing once the cancel flag is set.
    /// Started only once stage execution begins so it never competes with
    /// the interactive selector for stdin.
    pub fn spawn_key_listener(self: &Arc<Self>) {
        let ctl = Arc::clone(self);
        let _ = std::thread::Builder::new()
            .name("pdf2txt-keys".into())
            .spawn(move || {
                let mut stdin = std::io::stdin();
                let mut buf = [0u8; 1];
                loop {
                    match stdin.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(_) => match buf[0].to_ascii_lowercase() {
                            CANCEL_KEY => {
                                let _ = ctl.tx.send(CancelEvent::Cancel);
                                return;
                            }
                            FORCE_QUIT_KEY => ctl.force_quit(),
                            _ => {}
                        },
                    }
                    if ctl.is_cancelled() {
                        return;
                    }
                }
            });
    }
}

impl std::fmt::Debug for CancelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelController")
            .field("cancelled", &self.is_cancelled())
            .field("current_child", &self.current_child())
            .finish()
    }
}

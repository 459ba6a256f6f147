//! Periodic reload trigger.
//!
//! One background thread that owns no state of its own: on every tick it
//! calls back into the manager's synchronized API, which polls observable
//! sources and rebuilds at most once. The thread holds only a weak manager
//! reference, so dropping the last strong handle also winds the thread down.

use crate::manager::Manager;
use std::sync::mpsc;
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) struct ReloadTrigger {
    stop: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ReloadTrigger {
    /// Spawn the trigger thread, ticking every `period`.
    pub(crate) fn spawn(manager: Weak<Manager>, period: Duration) -> Self {
        let (stop, ticks) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            debug!(?period, "reload trigger started");
            loop {
                match ticks.recv_timeout(period) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        if let Err(error) = manager.reload() {
                            warn!(%error, "periodic reload failed");
                        }
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("reload trigger stopped");
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to finish. Guaranteed not to tick
    /// again after this returns.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReloadTrigger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Background rotation checks.

use std::io;
use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default time between two checks.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(2);

/// Handle to a thread calling `tick` every `interval` until stopped.
///
/// Dropping the handle signals the thread without waiting for it.
#[derive(Debug)]
pub(crate) struct Monitor {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Spawn the thread. `tick` returning `Break` ends it as well.
    pub(crate) fn spawn<F>(name: String, interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name).spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if tick().is_break() {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to finish its current tick.
    pub(crate) fn stop(mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::warn!("rotation monitor thread panicked");
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop.take();
    }
}

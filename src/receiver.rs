//! Background packet reception
//!
//! A [`Receiver`] runs at most one worker thread. The worker loops on a
//! blocking wait-for-packet and calls the registered [`Handler`] each time
//! DIO0 signals a packet. The handler is not given the packet; it is expected
//! to call [`Sx127x::receive_packet`](crate::Sx127x::receive_packet) or to
//! notify another thread that does.
//!
//! # Lifecycle
//! - Idle → Active: registering a handler spawns the worker
//! - Active → Active: registering again hands the new handler to the running
//!   worker over a channel, without a respawn
//! - Active → Idle: deregistering cancels the worker's [`CancelToken`] and
//!   joins the thread, so no handler call can happen after it returns
//!
//! The worker only holds the register lock while it configures the radio for
//! reception. The edge wait itself happens with the lock released, so
//! foreground calls keep working while the worker is parked on the pin.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::irq::{CancelToken, EdgeEvent};
use crate::Error;

/// Packet notification callback
pub type Handler = Box<dyn FnMut() + Send + 'static>;

/// Pause after a failed wait before the worker tries again.
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

const THREAD_NAME: &str = "sx127x-rx";

/// Something the worker can block on until a packet arrives.
pub(crate) trait PacketSource: Send + Sync + 'static {
    /// Arms reception and blocks until DIO0 rises, `timeout` elapses or
    /// `cancel` is triggered.
    fn wait_for_packet(
        &self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Error>;
}

struct Worker {
    cancel: CancelToken,
    handlers: mpsc::Sender<Handler>,
    thread: JoinHandle<()>,
}

/// Owner of the background worker.
#[derive(Default)]
pub(crate) struct Receiver {
    worker: Option<Worker>,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a worker is running.
    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// Installs `handler`, starting the worker if none is running.
    pub fn subscribe(
        &mut self,
        source: Arc<dyn PacketSource>,
        handler: Handler,
    ) -> Result<(), Error> {
        let handler = match &self.worker {
            Some(worker) => match worker.handlers.send(handler) {
                Ok(()) => return Ok(()),
                // the worker exited on its own, start over with a fresh one
                Err(mpsc::SendError(handler)) => {
                    self.unsubscribe();
                    handler
                }
            },
            None => handler,
        };

        let cancel = CancelToken::new();
        let (handlers, updates) = mpsc::channel();
        let worker_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || run(source, worker_cancel, updates, handler))
            .map_err(|e| Error::Spawn(e.to_string()))?;

        self.worker = Some(Worker {
            cancel,
            handlers,
            thread,
        });
        Ok(())
    }

    /// Stops the worker and waits for it to exit. No-op when idle.
    pub fn unsubscribe(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.cancel.cancel();
        drop(worker.handlers);

        if worker.thread.join().is_err() {
            warn!("receive handler panicked");
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn run(
    source: Arc<dyn PacketSource>,
    cancel: CancelToken,
    updates: mpsc::Receiver<Handler>,
    mut handler: Handler,
) {
    debug!("receiver started");

    while !cancel.is_cancelled() {
        match source.wait_for_packet(None, &cancel) {
            Ok(EdgeEvent::Detected) => {
                while let Ok(replacement) = updates.try_recv() {
                    handler = replacement;
                }
                if cancel.is_cancelled() {
                    break;
                }
                handler();
            }
            Ok(EdgeEvent::TimedOut) => {}
            Ok(EdgeEvent::Cancelled) => break,
            Err(error) => {
                warn!("waiting for packet failed: {}", error);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    debug!("receiver stopped");
}

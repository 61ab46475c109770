//! Interrupt pin abstraction
//!
//! The radio signals packet reception on its DIO0 pin. Waiting for that edge
//! is the one place where the driver blocks for an unbounded time, so the wait
//! takes a [`CancelToken`] next to its timeout: a background receiver is
//! stopped by cancelling the token rather than by killing the thread.
//!
//! Platforms with kernel edge notification (gpio-cdev line events, sysfs
//! `poll`) can implement [`InterruptPin`] directly. Any
//! [`InputPin`] can be used through [`PolledInput`], which samples the level.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};

/// Signal edge to wait for
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

/// How an edge wait ended
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    /// The requested edge occurred
    Detected,
    /// The timeout elapsed first
    TimedOut,
    /// The cancel token was triggered
    Cancelled,
}

/// Shared cancellation flag
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// An input pin that can block until an edge occurs.
pub trait InterruptPin: ErrorType {
    /// Blocks until `edge` occurs, `timeout` elapses or `cancel` is triggered.
    ///
    /// A `timeout` of `None` waits indefinitely. Implementations must notice
    /// a cancelled token within a short, bounded time.
    fn wait_for_edge(
        &mut self,
        edge: Edge,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Self::Error>;
}

/// [`InterruptPin`] adapter that samples an [`InputPin`] at a fixed interval.
pub struct PolledInput<P> {
    pin: P,
    interval: Duration,
}

impl<P> PolledInput<P> {
    /// Default sampling interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1);

    /// Wraps `pin`, sampling every [`Self::DEFAULT_INTERVAL`].
    pub fn new(pin: P) -> Self {
        Self::with_interval(pin, Self::DEFAULT_INTERVAL)
    }

    /// Wraps `pin`, sampling every `interval`.
    pub fn with_interval(pin: P, interval: Duration) -> Self {
        Self { pin, interval }
    }

    /// Releases the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: ErrorType> ErrorType for PolledInput<P> {
    type Error = P::Error;
}

impl<P: InputPin> InterruptPin for PolledInput<P> {
    fn wait_for_edge(
        &mut self,
        edge: Edge,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<EdgeEvent, Self::Error> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut previous = self.pin.is_high()?;

        loop {
            if cancel.is_cancelled() {
                return Ok(EdgeEvent::Cancelled);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(EdgeEvent::TimedOut);
            }

            thread::sleep(self.interval);

            let current = self.pin.is_high()?;
            let triggered = match edge {
                Edge::Rising => !previous && current,
                Edge::Falling => previous && !current,
            };
            if triggered {
                return Ok(EdgeEvent::Detected);
            }
            previous = current;
        }
    }
}

//! One-time startup barrier for resources that load asynchronously.
//!
//! Work that depends on several resources (textures needed before the first
//! emitter can be built) waits until *all* of them have resolved. Resolvers
//! may be sent to loader threads; the frame loop polls the barrier and keeps
//! running in the meantime.
//!
//! ```ignore
//! let (star_tx, star) = prerequisite("star");
//! let (smoke_tx, smoke) = prerequisite("smoke");
//! std::thread::spawn(move || star_tx.resolve(load("star.png")));
//! std::thread::spawn(move || smoke_tx.resolve(load("smoke.png")));
//!
//! let mut barrier = StartupBarrier::new(vec![star, smoke]).with_timeout(5.0);
//! // every frame:
//! if barrier.poll(time.elapsed) == BarrierState::Ready {
//!     let textures = barrier.take()?;
//! }
//! ```

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::error::EngineError;

/// Sending half of a prerequisite.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: Sender<T>,
}

impl<T> Resolver<T> {
    /// Deliver the value. Delivering to a dropped barrier is a no-op.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Receiving half of a prerequisite, held by a [`StartupBarrier`].
#[derive(Debug)]
pub struct Prerequisite<T> {
    label: String,
    rx: Receiver<T>,
    value: Option<T>,
    failed: bool,
}

impl<T> Prerequisite<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// An already-resolved prerequisite.
    pub fn ready(label: impl Into<String>, value: T) -> Self {
        let (tx, mut prerequisite) = prerequisite(label);
        drop(tx);
        prerequisite.value = Some(value);
        prerequisite
    }

    fn poll(&mut self) {
        if self.value.is_some() || self.failed {
            return;
        }
        match self.rx.try_recv() {
            Ok(value) => {
                debug!(prerequisite = %self.label, "prerequisite resolved");
                self.value = Some(value);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                warn!(prerequisite = %self.label, "prerequisite dropped without resolving");
                self.failed = true;
            }
        }
    }
}

/// Create a linked resolver/prerequisite pair.
pub fn prerequisite<T>(label: impl Into<String>) -> (Resolver<T>, Prerequisite<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        Resolver { tx },
        Prerequisite {
            label: label.into(),
            rx,
            value: None,
            failed: false,
        },
    )
}

/// Progress of a [`StartupBarrier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BarrierState {
    /// At least one prerequisite is still loading.
    Pending,
    /// Every prerequisite resolved.
    Ready,
    /// The timeout passed with prerequisites still loading.
    TimedOut,
    /// A resolver was dropped without delivering a value.
    Failed(String),
    /// Values were already taken.
    Consumed,
}

/// Join over a fixed set of prerequisites.
#[derive(Debug)]
pub struct StartupBarrier<T> {
    prerequisites: Vec<Prerequisite<T>>,
    timeout: Option<f32>,
    started_at: Option<f32>,
    consumed: bool,
}

impl<T> StartupBarrier<T> {
    pub fn new(prerequisites: Vec<Prerequisite<T>>) -> Self {
        Self {
            prerequisites,
            timeout: None,
            started_at: None,
            consumed: false,
        }
    }

    /// Give up waiting `seconds` after the first poll.
    pub fn with_timeout(mut self, seconds: f32) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Labels of prerequisites that have not resolved yet.
    pub fn pending(&self) -> Vec<String> {
        self.prerequisites
            .iter()
            .filter(|p| !p.is_resolved())
            .map(|p| p.label.clone())
            .collect()
    }

    /// Check for newly resolved prerequisites. `now` is the driver's elapsed
    /// time and is only used for the timeout.
    pub fn poll(&mut self, now: f32) -> BarrierState {
        if self.consumed {
            return BarrierState::Consumed;
        }
        let started_at = *self.started_at.get_or_insert(now);

        for prerequisite in &mut self.prerequisites {
            prerequisite.poll();
        }

        if self.prerequisites.iter().all(|p| p.is_resolved()) {
            return BarrierState::Ready;
        }
        if let Some(failed) = self.prerequisites.iter().find(|p| p.failed) {
            return BarrierState::Failed(failed.label.clone());
        }
        match self.timeout {
            Some(timeout) if now - started_at >= timeout => BarrierState::TimedOut,
            _ => BarrierState::Pending,
        }
    }

    /// Take every value, in registration order.
    ///
    /// Fails with [`EngineError::NotReady`] while anything is unresolved.
    pub fn take(&mut self) -> Result<Vec<T>, EngineError> {
        let pending = self.pending();
        if self.consumed || !pending.is_empty() {
            return Err(EngineError::NotReady(pending));
        }
        self.consumed = true;
        Ok(self
            .prerequisites
            .iter_mut()
            .filter_map(|p| p.value.take())
            .collect())
    }

    /// Take every value, substituting `fallback` for unresolved ones.
    pub fn take_or(&mut self, fallback: T) -> Result<Vec<T>, EngineError>
    where
        T: Clone,
    {
        if self.consumed {
            return Err(EngineError::NotReady(Vec::new()));
        }
        self.consumed = true;
        Ok(self
            .prerequisites
            .iter_mut()
            .map(|p| {
                p.value.take().unwrap_or_else(|| {
                    warn!(prerequisite = %p.label, "using fallback for unresolved prerequisite");
                    fallback.clone()
                })
            })
            .collect())
    }
}

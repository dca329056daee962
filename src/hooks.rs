//! Particle lifecycle hooks and the command queue they write to.
//!
//! Hooks run synchronously inside [`Emitter::step`](crate::Emitter::step).
//! They may read and write the particle they are given but never own it, and
//! they cannot touch other emitters directly. Instead a hook queues a
//! [`Command`] and the owning [`ParticleSystem`](crate::ParticleSystem)
//! applies it once the current emitter has finished its step.
//!
//! # Example
//!
//! ```ignore
//! struct Burst { settings: EmitterSettings, factory: Factory }
//!
//! impl LifecycleHooks for Burst {
//!     fn on_remove(&mut self, particle: &mut Particle, commands: &mut Commands) {
//!         let emitter = self.factory.burst_at(particle.position);
//!         commands.spawn(emitter);
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::emitter::Emitter;
use crate::particle::Particle;

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an emitter, assigned when it is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u64);

impl EmitterId {
    pub(crate) fn next() -> Self {
        Self(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Callbacks invoked at particle creation, per-step update and retirement.
///
/// Every method defaults to a no-op. State that must follow a particle
/// across frames (a linked child emitter, a moving spawn point) belongs in a
/// side table owned by the implementor, keyed by
/// [`ParticleId`](crate::ParticleId).
pub trait LifecycleHooks {
    /// Called once, after the particle is fully initialized and before it
    /// joins the pool.
    fn on_create(&mut self, _particle: &mut Particle, _commands: &mut Commands) {}

    /// Called after the particle has been integrated for this step.
    fn on_update(&mut self, _particle: &mut Particle, _commands: &mut Commands) {}

    /// Called exactly once, right before the particle leaves the pool.
    fn on_remove(&mut self, _particle: &mut Particle, _commands: &mut Commands) {}
}

/// A deferred request from a hook to the owning system.
pub enum Command {
    /// Register a new emitter.
    Spawn(Box<Emitter>),
    /// Ask an existing emitter to stop emitting and drain.
    Stop(EmitterId),
}

/// Queue of commands produced by hooks during a step.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an emitter for registration and return its id.
    pub fn spawn(&mut self, emitter: Emitter) -> EmitterId {
        let id = emitter.id();
        self.queue.push(Command::Spawn(Box::new(emitter)));
        id
    }

    pub fn stop(&mut self, id: EmitterId) {
        self.queue.push(Command::Stop(id));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Remove every queued command in submission order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}

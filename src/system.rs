//! Collection of emitters stepped once per frame.
//!
//! The system is the only place emitters are reclaimed: an emitter that is no
//! longer active is disposed and dropped during [`ParticleSystem::step`].
//! Commands queued by lifecycle hooks are applied right after the emitter
//! that produced them, so a newly spawned emitter is first stepped on the
//! following frame.

use tracing::{debug, trace};

use crate::emitter::Emitter;
use crate::error::EngineError;
use crate::hooks::{Command, Commands, EmitterId};
use crate::time::FrameTime;

/// Owns a set of emitters and advances them together.
#[derive(Default)]
pub struct ParticleSystem {
    emitters: Vec<Emitter>,
    commands: Commands,
}

impl ParticleSystem {
    /// An empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an emitter and return its id.
    pub fn add_emitter(&mut self, emitter: Emitter) -> EmitterId {
        let id = emitter.id();
        debug!(emitter = ?id, "emitter added");
        self.emitters.push(emitter);
        id
    }

    /// Take an emitter out of the system. The caller becomes responsible for
    /// disposing it.
    pub fn remove_emitter(&mut self, id: EmitterId) -> Option<Emitter> {
        let index = self.index_of(id)?;
        Some(self.emitters.remove(index))
    }

    /// Look up a registered emitter.
    pub fn get(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id() == id)
    }

    /// Look up a registered emitter for modification.
    pub fn get_mut(&mut self, id: EmitterId) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.id() == id)
    }

    /// Stop emission on an emitter. Returns false if it is not registered.
    pub fn stop_emitter(&mut self, id: EmitterId) -> bool {
        match self.get_mut(id) {
            Some(emitter) => {
                emitter.stop_emission();
                true
            }
            None => false,
        }
    }

    /// Registered emitters, in registration order.
    pub fn emitters(&self) -> impl Iterator<Item = &Emitter> {
        self.emitters.iter()
    }

    /// Number of registered emitters.
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// True once every emitter has been reclaimed.
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Live particles across every emitter.
    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(|e| e.particles().len()).sum()
    }

    /// Step active emitters and reclaim inactive ones.
    ///
    /// Emitters are visited in reverse so removal by index stays valid.
    pub fn step(&mut self, time: FrameTime) -> Result<(), EngineError> {
        for index in (0..self.emitters.len()).rev() {
            if self.emitters[index].is_active() {
                self.emitters[index].step(time, &mut self.commands)?;
            } else {
                let mut emitter = self.emitters.remove(index);
                emitter.dispose(&mut self.commands);
                debug!(emitter = ?emitter.id(), "emitter retired");
            }
            self.apply_commands();
        }
        Ok(())
    }

    /// Dispose every emitter, flushing their removal hooks.
    ///
    /// Emitters spawned by those hooks are disposed as well.
    pub fn clear(&mut self) {
        while let Some(mut emitter) = self.emitters.pop() {
            emitter.dispose(&mut self.commands);
            self.apply_commands();
        }
    }

    fn index_of(&self, id: EmitterId) -> Option<usize> {
        self.emitters.iter().position(|e| e.id() == id)
    }

    fn apply_commands(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        let mut spawned = Vec::new();
        for command in self.commands.drain() {
            match command {
                Command::Spawn(emitter) => spawned.push(*emitter),
                Command::Stop(id) => {
                    if let Some(emitter) = self.emitters.iter_mut().find(|e| e.id() == id) {
                        emitter.stop_emission();
                    } else if let Some(emitter) = spawned.iter_mut().find(|e| e.id() == id) {
                        emitter.stop_emission();
                    } else {
                        trace!(emitter = ?id, "stop for unknown emitter ignored");
                    }
                }
            }
        }
        for emitter in spawned {
            self.add_emitter(emitter);
        }
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        self.clear();
    }
}

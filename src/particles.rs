use std::collections::BTreeMap;

use crate::particle::Particle;

/// The live particle set owned by the simulation loop.
///
/// Particles are keyed by their stable id in an ordered map, so iteration
/// order is deterministic across runs. Ids are never reused within one
/// experiment; outgoing particles of a committed action always receive
/// fresh ids.
#[derive(Debug, Clone)]
pub struct Particles {
    map: BTreeMap<u64, Particle>,
    next_id: u64,
}

impl Default for Particles {
    fn default() -> Self {
        Self::new()
    }
}

impl Particles {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            // id 0 marks a particle not yet registered in any set
            next_id: 1,
        }
    }

    /// Insert a particle, assigning it the next free id. Returns the id.
    pub fn insert(&mut self, mut particle: Particle) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        particle.id = id;
        self.map.insert(id, particle);
        id
    }

    pub fn remove(&mut self, id: u64) -> Option<Particle> {
        self.map.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Particle> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Particle> {
        self.map.get_mut(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.map.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.map.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.map.values_mut()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The optimistic-concurrency predicate: true iff the particle behind
    /// `stored` (a copy taken at candidate-creation time) is still present
    /// and untouched — same species, same momentum, same last process.
    ///
    /// Position is deliberately not compared: free streaming between
    /// timesteps moves particles without affecting any pending candidate.
    pub fn is_unchanged(&self, stored: &Particle) -> bool {
        match self.map.get(&stored.id) {
            Some(current) => {
                current.ptype == stored.ptype
                    && current.momentum == stored.momentum
                    && current.history.id_process == stored.history.id_process
            }
            None => false,
        }
    }
}

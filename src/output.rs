use serde::{Deserialize, Serialize};

use crate::channel::ProcessKind;
use crate::particle::Particle;
use crate::particles::Particles;

/// Everything a committed action reports downstream: participants before
/// and after, the unique process sequence number, the process tag, and the
/// total weight (the cross-section / width context value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id_process: u64,
    pub process: ProcessKind,
    pub time: f64,
    pub total_weight: f64,
    pub incoming: Vec<Particle>,
    pub outgoing: Vec<Particle>,
}

/// Output collaborator. Receives the committed actions of each timestep in
/// commit order (already time-ordered) and the full particle set at event
/// boundaries. All file/stream serialization lives behind this trait,
/// outside this crate.
pub trait OutputListener {
    fn at_event_start(&mut self, _particles: &Particles) {}

    fn at_interaction(&mut self, record: &InteractionRecord);

    fn at_event_end(&mut self, _particles: &Particles) {}
}

/// In-memory listener used by tests and demo drivers.
#[derive(Debug, Default)]
pub struct CollectingOutput {
    pub records: Vec<InteractionRecord>,
    pub initial_count: usize,
    pub final_count: usize,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputListener for CollectingOutput {
    fn at_event_start(&mut self, particles: &Particles) {
        self.initial_count = particles.len();
    }

    fn at_interaction(&mut self, record: &InteractionRecord) {
        self.records.push(record.clone());
    }

    fn at_event_end(&mut self, particles: &Particles) {
        self.final_count = particles.len();
    }
}

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fourvector::FourVector;
use crate::species::ParticleType;

/// Interaction history carried by each particle. Stamped at creation and
/// rewritten whenever the particle emerges from a committed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Sequence number of the process that produced this particle
    /// (0 for initial-condition particles).
    pub id_process: u64,
    /// Cumulative number of interactions along this particle's ancestry.
    pub collision_count: u32,
    /// Time [fm/c] at which the particle counts as fully formed.
    pub formation_time: f64,
    /// Cross-section suppression factor while unformed; 1.0 once formed.
    pub cross_section_scaling_factor: f64,
    /// Species names of the parent particles, for diagnostics.
    pub parent: Option<String>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            id_process: 0,
            collision_count: 0,
            formation_time: 0.0,
            cross_section_scaling_factor: 1.0,
            parent: None,
        }
    }
}

/// A single particle: stable id, shared type record, four-position,
/// four-momentum, and interaction history.
///
/// Particles are value-like; actions hold copies of the pre-interaction
/// state and produce fresh records for the post-interaction state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    /// Stable identity, assigned by the particle set on insertion.
    pub id: u64,
    pub ptype: Arc<ParticleType>,
    pub position: FourVector,
    pub momentum: FourVector,
    pub history: History,
}

impl Particle {
    /// A particle not yet registered in a set (id is assigned on insert).
    pub fn new(ptype: Arc<ParticleType>, position: FourVector, momentum: FourVector) -> Self {
        Self {
            id: 0,
            ptype,
            position,
            momentum,
            history: History::default(),
        }
    }

    /// Convenience constructor: on-shell momentum from the pole mass and a
    /// three-momentum.
    pub fn on_shell(
        ptype: Arc<ParticleType>,
        position: FourVector,
        px: f64,
        py: f64,
        pz: f64,
    ) -> Self {
        let m = ptype.mass;
        let e = (m * m + px * px + py * py + pz * pz).sqrt();
        Self::new(ptype, position, FourVector::new(e, px, py, pz))
    }

    /// Invariant mass of the momentum; equals the pole mass only for
    /// on-shell particles.
    pub fn effective_mass(&self) -> f64 {
        self.momentum.abs()
    }

    pub fn velocity(&self) -> nalgebra::Vector3<f64> {
        self.momentum.velocity()
    }

    pub fn lorentz_gamma(&self) -> f64 {
        self.momentum.t / self.effective_mass()
    }

    /// Straight-line propagation to computational time `t`.
    pub fn propagate_to(&mut self, t: f64) {
        let dt = t - self.position.t;
        let x = self.position.threevec() + self.velocity() * dt;
        self.position = FourVector::from_parts(t, x);
    }

    /// Whether the particle is fully formed at time `t` (fresh string
    /// fragments interact with a reduced cross section before this).
    pub fn is_formed_at(&self, t: f64) -> bool {
        t >= self.history.formation_time
    }

    /// Effective scaling of this particle's cross sections at time `t`.
    pub fn xsec_scaling_factor(&self, t: f64) -> f64 {
        if self.is_formed_at(t) {
            1.0
        } else {
            self.history.cross_section_scaling_factor
        }
    }
}

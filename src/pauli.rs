use crate::action::Action;
use crate::particles::Particles;

/// Phase-space-blocking collaborator (exclusion-principle approximation).
///
/// Before a valid candidate is committed, the scheduler asks for the
/// blocking probability of its prospective outgoing fermions given the
/// local phase-space occupancy, draws a uniform value, and discards the
/// candidate if the draw falls below the probability. A discarded
/// candidate never mutates the particle set.
pub trait PauliBlocker: Send + Sync {
    /// Probability in [0, 1] that the action is Pauli-blocked.
    fn blocking_probability(&self, particles: &Particles, action: &Action) -> f64;
}

/// Default: no blocking.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlocking;

impl PauliBlocker for NoBlocking {
    fn blocking_probability(&self, _particles: &Particles, _action: &Action) -> f64 {
        0.0
    }
}

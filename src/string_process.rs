use crate::errors::SamplingError;
use crate::particle::Particle;
use crate::random::Engine;

/// External event-generator collaborator for high-energy string
/// excitation.
///
/// Given two incoming particles, a fragmenter returns the outgoing
/// particle list with sampled four-momenta summing to the incoming total.
/// The implementation owns the formation-time and cross-section-scaling
/// convention for freshly produced hadrons: it sets `formation_time` and
/// `cross_section_scaling_factor` on every returned record; positions and
/// ids are finalized by `perform`.
///
/// The fragmenter is a single blocking call with no retry. Whether one is
/// available is checked once at startup; a scatter finder never emits
/// string channels without it.
pub trait StringFragmentation: Send {
    fn fragment(
        &mut self,
        a: &Particle,
        b: &Particle,
        time: f64,
        rng: &mut Engine,
    ) -> Result<Vec<Particle>, SamplingError>;
}

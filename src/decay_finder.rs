use rayon::prelude::*;

use crate::action::Action;
use crate::constants::{HBARC, REALLY_SMALL};
use crate::particle::Particle;
use crate::particles::Particles;
use crate::random::{exponential, Engine};

/// Emits decay candidates: one per unstable particle whose sampled decay
/// time falls inside the upcoming window.
///
/// A pure producer — it reads the particle set and emits actions without
/// touching shared state, so the per-particle loop runs in parallel. Each
/// particle samples from its own engine derived from (timestep seed,
/// particle id), keeping runs reproducible for a fixed master seed no
/// matter how the work is scheduled across threads.
#[derive(Debug, Default)]
pub struct DecayFinder;

impl DecayFinder {
    pub fn new() -> Self {
        Self
    }

    /// Candidates for the window [time, time + dt). `seed` must be
    /// timestep-specific, or a particle surviving one window would redraw
    /// the identical lifetime in the next.
    pub fn find_actions(
        &self,
        particles: &Particles,
        time: f64,
        dt: f64,
        seed: u64,
    ) -> Vec<Action> {
        let snapshot: Vec<&Particle> = particles.iter().collect();
        snapshot
            .par_iter()
            .filter_map(|p| Self::check_decay(p, time, dt, seed))
            .collect()
    }

    fn check_decay(particle: &Particle, time: f64, dt: f64, seed: u64) -> Option<Action> {
        if particle.ptype.is_stable() {
            return None;
        }
        let mass = particle.effective_mass();
        // width of the kinematically open modes at this effective mass
        let open_width: f64 = particle
            .ptype
            .decay_modes
            .iter()
            .filter(|mode| mode.threshold() < mass)
            .map(|mode| mode.branching_ratio)
            .sum::<f64>()
            * particle.ptype.width;
        if open_width <= REALLY_SMALL {
            return None;
        }

        // proper lifetime hbar/Gamma, exponentially distributed, dilated
        // into the computational frame
        let mut rng = Engine::from_stream(seed, particle.id);
        let proper_lifetime = exponential(&mut rng, open_width / HBARC);
        let decay_time = time + particle.lorentz_gamma() * proper_lifetime;
        if decay_time >= time + dt {
            return None;
        }

        let mut action = Action::decay(particle.clone(), decay_time);
        action.populate_decay_channels();
        if action.total_weight() <= REALLY_SMALL {
            return None;
        }
        Some(action)
    }
}

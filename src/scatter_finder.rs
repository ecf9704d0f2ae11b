use rayon::prelude::*;

use crate::action::Action;
use crate::constants::{FM2_MB, REALLY_SMALL};
use crate::cross_sections::CrossSections;
use crate::errors::ConfigError;
use crate::grid::SpatialGrid;
use crate::particle::Particle;
use crate::particles::Particles;
use crate::settings::Settings;

/// Emits two-body scatter candidates: for every unordered pair of nearby
/// particles, checks whether their closest approach during free streaming
/// falls inside the window and within the geometric reach of the pair's
/// total cross section.
///
/// A pure producer like the decay finder; the per-particle loop runs in
/// parallel over a read-only snapshot. Needs no random draws — the
/// scheduled time is the deterministic time of closest approach.
#[derive(Debug)]
pub struct ScatterFinder {
    testparticles: u32,
    include_strings: bool,
    /// Baryon-baryon pairs below this sqrt(s) [GeV] are not paired.
    low_snn_cut: f64,
}

impl ScatterFinder {
    /// Validates the configuration once: asking for string channels
    /// without a fragmentation backend is a startup error, not a per-call
    /// one.
    pub fn new(settings: &Settings, has_fragmenter: bool) -> Result<Self, ConfigError> {
        if settings.include_strings && !has_fragmenter {
            return Err(ConfigError::StringFragmenterMissing);
        }
        Ok(Self {
            testparticles: settings.testparticles,
            include_strings: settings.include_strings,
            low_snn_cut: settings.low_snn_cut,
        })
    }

    /// Time until the closest approach of two free-streaming particles,
    /// relative to their (common) position time. Negative if they are not
    /// approaching.
    ///
    /// UrQMD convention: t = -(r1 - r2).(v1 - v2) / (v1 - v2)^2, computed
    /// through p1*E2 - p2*E1 to avoid forming the velocities explicitly.
    pub fn collision_time(a: &Particle, b: &Particle) -> f64 {
        let dv_times_e1e2 =
            a.momentum.threevec() * b.momentum.t - b.momentum.threevec() * a.momentum.t;
        let dv_sqr = dv_times_e1e2.norm_squared();
        if dv_sqr < REALLY_SMALL {
            // zero relative velocity: the particles are not approaching
            return -1.0;
        }
        let dr = a.position.threevec() - b.position.threevec();
        -dr.dot(&dv_times_e1e2) * (a.momentum.t * b.momentum.t / dv_sqr)
    }

    /// Squared distance between the two straight-line trajectories at
    /// their closest approach.
    pub fn closest_approach_sqr(a: &Particle, b: &Particle, t_rel: f64) -> f64 {
        let ra = a.position.threevec() + a.velocity() * t_rel;
        let rb = b.position.threevec() + b.velocity() * t_rel;
        (ra - rb).norm_squared()
    }

    /// Candidates for the window [time, time + dt).
    pub fn find_actions(
        &self,
        particles: &Particles,
        grid: &SpatialGrid,
        xs: &dyn CrossSections,
        time: f64,
        dt: f64,
    ) -> Vec<Action> {
        let snapshot: Vec<&Particle> = particles.iter().collect();
        snapshot
            .par_iter()
            .flat_map_iter(|p| {
                grid.neighbors(p).into_iter().filter_map(move |partner_id| {
                    // visit each unordered pair exactly once
                    if partner_id <= p.id {
                        return None;
                    }
                    let partner = particles.get(partner_id)?;
                    self.check_collision(p, partner, xs, time, dt)
                })
            })
            .collect()
    }

    /// Check a single pair; emits an action if the pair collides inside
    /// the window.
    fn check_collision(
        &self,
        a: &Particle,
        b: &Particle,
        xs: &dyn CrossSections,
        time: f64,
        dt: f64,
    ) -> Option<Action> {
        let t_rel = Self::collision_time(a, b);
        if t_rel < 0.0 || t_rel >= dt {
            return None;
        }

        let srts = (a.momentum + b.momentum).abs();
        if a.ptype.is_baryon() && b.ptype.is_baryon() && srts < self.low_snn_cut {
            return None;
        }

        let scale = a.xsec_scaling_factor(time) * b.xsec_scaling_factor(time);
        let sigma = xs.total(&a.ptype, &b.ptype, srts) * scale;
        if sigma <= REALLY_SMALL {
            return None;
        }

        // geometric criterion: pi d^2 < sigma / testparticles
        let reach_sqr =
            sigma / self.testparticles as f64 * FM2_MB * std::f64::consts::FRAC_1_PI;
        if Self::closest_approach_sqr(a, b, t_rel) > reach_sqr {
            return None;
        }

        let mut action = Action::scatter(a.clone(), b.clone(), time + t_rel);
        action.populate_scatter_channels(xs, self.include_strings);
        if action.total_weight() <= REALLY_SMALL {
            return None;
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_sections::ConstantCrossSections;
    use crate::fourvector::FourVector;
    use crate::species::ParticleType;

    fn finder(elastic_mb: f64) -> (ScatterFinder, ConstantCrossSections) {
        let settings = Settings::default();
        (
            ScatterFinder::new(&settings, false).unwrap(),
            ConstantCrossSections::new(elastic_mb),
        )
    }

    fn pion(x: f64, pz: f64) -> Particle {
        let pi = ParticleType::lookup("pi+").unwrap();
        Particle::on_shell(pi, FourVector::new(0.0, x, 0.0, 0.0), 0.0, 0.0, pz)
    }

    #[test]
    fn test_strings_require_fragmenter() {
        let settings = Settings {
            include_strings: true,
            ..Settings::default()
        };
        assert!(matches!(
            ScatterFinder::new(&settings, false),
            Err(ConfigError::StringFragmenterMissing)
        ));
        assert!(ScatterFinder::new(&settings, true).is_ok());
    }

    #[test]
    fn test_parallel_momenta_never_collide() {
        let a = pion(0.0, 0.2);
        let b = pion(1.0, 0.2);
        assert!(ScatterFinder::collision_time(&a, &b) < 0.0);
    }

    #[test]
    fn test_head_on_pair_meets_at_closest_approach() {
        let pi = ParticleType::lookup("pi+").unwrap();
        let a = Particle::on_shell(pi.clone(), FourVector::new(0.0, -1.0, 0.0, 0.0), 0.3, 0.0, 0.0);
        let b = Particle::on_shell(pi, FourVector::new(0.0, 1.0, 0.0, 0.0), -0.3, 0.0, 0.0);
        let t = ScatterFinder::collision_time(&a, &b);
        assert!(t > 0.0);
        // at closest approach they sit on top of each other
        assert!(ScatterFinder::closest_approach_sqr(&a, &b, t) < 1e-20);
    }

    #[test]
    fn test_finder_emits_single_candidate_per_pair() {
        let pi = ParticleType::lookup("pi+").unwrap();
        let mut set = Particles::new();
        set.insert(Particle::on_shell(
            pi.clone(),
            FourVector::new(0.0, -0.5, 0.0, 0.0),
            0.3,
            0.0,
            0.0,
        ));
        set.insert(Particle::on_shell(
            pi,
            FourVector::new(0.0, 0.5, 0.0, 0.0),
            -0.3,
            0.0,
            0.0,
        ));
        let (finder, xs) = finder(40.0);
        let grid = SpatialGrid::build(&set, 2.52);
        let actions = finder.find_actions(&set, &grid, &xs, 0.0, 50.0);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].incoming_particles().len(), 2);
        assert!(actions[0].time_of_execution() > 0.0);
    }

    #[test]
    fn test_receding_pair_ignored() {
        let pi = ParticleType::lookup("pi+").unwrap();
        let mut set = Particles::new();
        set.insert(Particle::on_shell(
            pi.clone(),
            FourVector::new(0.0, -0.5, 0.0, 0.0),
            -0.3,
            0.0,
            0.0,
        ));
        set.insert(Particle::on_shell(
            pi,
            FourVector::new(0.0, 0.5, 0.0, 0.0),
            0.3,
            0.0,
            0.0,
        ));
        let (finder, xs) = finder(40.0);
        let grid = SpatialGrid::build(&set, 2.52);
        assert!(finder.find_actions(&set, &grid, &xs, 0.0, 50.0).is_empty());
    }

    #[test]
    fn test_zero_cross_section_emits_nothing() {
        let pi = ParticleType::lookup("pi+").unwrap();
        let mut set = Particles::new();
        set.insert(Particle::on_shell(
            pi.clone(),
            FourVector::new(0.0, -0.5, 0.0, 0.0),
            0.3,
            0.0,
            0.0,
        ));
        set.insert(Particle::on_shell(
            pi,
            FourVector::new(0.0, 0.5, 0.0, 0.0),
            -0.3,
            0.0,
            0.0,
        ));
        let (finder, xs) = finder(0.0);
        let grid = SpatialGrid::build(&set, 2.52);
        assert!(finder.find_actions(&set, &grid, &xs, 0.0, 50.0).is_empty());
    }
}

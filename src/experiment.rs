use log::debug;
use rand::RngCore;

use crate::constants::FM2_MB;
use crate::cross_sections::CrossSections;
use crate::decay_finder::DecayFinder;
use crate::errors::{ConfigError, FatalError};
use crate::grid::SpatialGrid;
use crate::output::OutputListener;
use crate::particle::Particle;
use crate::particles::Particles;
use crate::pauli::{NoBlocking, PauliBlocker};
use crate::random::Engine;
use crate::scatter_finder::ScatterFinder;
use crate::scheduler::{Scheduler, TimestepSummary};
use crate::settings::Settings;
use crate::string_process::StringFragmentation;

/// The simulation driver: owns the live particle set, the shared random
/// engine, the collaborators, and the process-id counter, and advances
/// the event timestep by timestep.
///
/// Per timestep: build the grid from current positions, collect candidate
/// actions from both finders, hand them to the scheduler (which validates,
/// vetoes and commits them in time order), then free-stream every
/// surviving particle to the end of the window.
pub struct Experiment {
    particles: Particles,
    settings: Settings,
    engine: Engine,
    cross_sections: Box<dyn CrossSections>,
    pauli: Box<dyn PauliBlocker>,
    strings: Option<Box<dyn StringFragmentation>>,
    scatter_finder: ScatterFinder,
    decay_finder: DecayFinder,
    id_process: u64,
    time: f64,
    step_counter: u64,
}

impl Experiment {
    /// Configuration problems (a string switch without a backend, a
    /// non-positive timestep) are reported here, once, and never at
    /// simulation time.
    pub fn new(
        settings: Settings,
        cross_sections: Box<dyn CrossSections>,
        strings: Option<Box<dyn StringFragmentation>>,
    ) -> Result<Self, ConfigError> {
        if !(settings.delta_time > 0.0) {
            return Err(ConfigError::InvalidTimestep(format!(
                "delta_time = {} must be positive",
                settings.delta_time
            )));
        }
        let scatter_finder = ScatterFinder::new(&settings, strings.is_some())?;
        Ok(Self {
            particles: Particles::new(),
            engine: Engine::new(settings.seed),
            settings,
            cross_sections,
            pauli: Box::new(NoBlocking),
            strings,
            scatter_finder,
            decay_finder: DecayFinder::new(),
            id_process: 0,
            time: 0.0,
            step_counter: 0,
        })
    }

    pub fn set_pauli_blocker(&mut self, blocker: Box<dyn PauliBlocker>) {
        self.pauli = blocker;
    }

    pub fn add_particle(&mut self, particle: Particle) -> u64 {
        self.particles.insert(particle)
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Maximum distance at which any pair can still interact, from the
    /// largest relevant cross section. The grid cells are sized to this.
    fn interaction_range(&self) -> f64 {
        (self.settings.max_cross_section / self.settings.testparticles as f64 * FM2_MB
            * std::f64::consts::FRAC_1_PI)
            .sqrt()
    }

    /// Run the event to the configured end time.
    pub fn run(&mut self, output: &mut dyn OutputListener) -> Result<(), FatalError> {
        output.at_event_start(&self.particles);
        while self.time < self.settings.end_time - 1.0e-12 {
            let summary = self.step(output)?;
            debug!(
                "t = {:.3} fm/c: {} committed, {} invalidated, {} vetoed, {} sampling failures, {} particles",
                self.time,
                summary.committed,
                summary.invalidated,
                summary.vetoed,
                summary.sampling_failures,
                self.particles.len()
            );
        }
        output.at_event_end(&self.particles);
        Ok(())
    }

    /// One timestep: collect, schedule, propagate.
    fn step(&mut self, output: &mut dyn OutputListener) -> Result<TimestepSummary, FatalError> {
        let dt = self.settings.delta_time.min(self.settings.end_time - self.time);

        let grid = SpatialGrid::build(&self.particles, self.interaction_range());
        let mut candidates = self.scatter_finder.find_actions(
            &self.particles,
            &grid,
            self.cross_sections.as_ref(),
            self.time,
            dt,
        );
        // timestep-specific finder seed: a particle surviving this window
        // must not redraw the same lifetime in the next one
        let finder_seed = Engine::from_stream(self.settings.seed, self.step_counter).next_u64();
        candidates.extend(
            self.decay_finder
                .find_actions(&self.particles, self.time, dt, finder_seed),
        );

        let summary = Scheduler::run_timestep(
            candidates,
            &mut self.particles,
            &mut self.engine,
            &mut self.id_process,
            self.pauli.as_ref(),
            self.strings.as_deref_mut(),
            output,
        )?;

        let t_next = self.time + dt;
        for p in self.particles.iter_mut() {
            p.propagate_to(t_next);
        }
        self.time = t_next;
        self.step_counter += 1;
        Ok(summary)
    }
}

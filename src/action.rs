use std::sync::Arc;

use crate::channel::{Channel, ProcessKind};
use crate::constants::{CONSERVATION_TOLERANCE, REALLY_SMALL};
use crate::cross_sections::CrossSections;
use crate::errors::{ActionError, FatalError, SamplingError};
use crate::fourvector::FourVector;
use crate::kinematics;
use crate::particle::Particle;
use crate::particles::Particles;
use crate::random::{uniform, Engine};
use crate::species::ParticleType;
use crate::string_process::StringFragmentation;

/// Partition of two-body scatters by the baryon content of the incoming
/// pair. The classes differ in which channel-producing computations apply
/// and nothing else; selection, validity, and commit are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterClass {
    BaryonBaryon,
    BaryonMeson,
    MesonMeson,
}

impl ScatterClass {
    pub fn classify(a: &ParticleType, b: &ParticleType) -> Self {
        match (a.is_baryon(), b.is_baryon()) {
            (true, true) => ScatterClass::BaryonBaryon,
            (false, false) => ScatterClass::MesonMeson,
            _ => ScatterClass::BaryonMeson,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Decay,
    Scatter(ScatterClass),
}

/// A candidate (or, after `perform`, committed) interaction.
///
/// Holds copies of the incoming particles as they looked when the action
/// was found, the scheduled execution time, the weighted channel list, and
/// after `generate_final_state` the sampled outgoing particles. The copies
/// are the basis of the optimistic-concurrency check: an action is valid
/// exactly as long as every incoming particle is still in the live set
/// and untouched.
#[derive(Debug, Clone)]
pub struct Action {
    incoming: Vec<Particle>,
    time_of_execution: f64,
    channels: Vec<Channel>,
    total_weight: f64,
    kind: ActionKind,
    chosen_process: Option<ProcessKind>,
    outgoing: Vec<Particle>,
}

impl Action {
    pub fn decay(parent: Particle, time_of_execution: f64) -> Self {
        Self {
            incoming: vec![parent],
            time_of_execution,
            channels: Vec::new(),
            total_weight: 0.0,
            kind: ActionKind::Decay,
            chosen_process: None,
            outgoing: Vec::new(),
        }
    }

    pub fn scatter(a: Particle, b: Particle, time_of_execution: f64) -> Self {
        let class = ScatterClass::classify(&a.ptype, &b.ptype);
        Self {
            incoming: vec![a, b],
            time_of_execution,
            channels: Vec::new(),
            total_weight: 0.0,
            kind: ActionKind::Scatter(class),
            chosen_process: None,
            outgoing: Vec::new(),
        }
    }

    pub fn incoming_particles(&self) -> &[Particle] {
        &self.incoming
    }

    pub fn outgoing_particles(&self) -> &[Particle] {
        &self.outgoing
    }

    pub fn time_of_execution(&self) -> f64 {
        self.time_of_execution
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Process tag of the sampled channel; `None` before
    /// `generate_final_state`.
    pub fn process_kind(&self) -> Option<ProcessKind> {
        self.chosen_process
    }

    /// Total weight: a cross section [mb] for scatters, a decay width
    /// [GeV] for decays. Equals the sum of the kept channel weights.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Append a channel. Channels at or below the negligible-weight
    /// threshold are silently discarded so they never pollute the
    /// sampling sum.
    pub fn add_channel(&mut self, channel: Channel) {
        if channel.weight() <= REALLY_SMALL {
            return;
        }
        self.total_weight += channel.weight();
        self.channels.push(channel);
    }

    pub fn add_channels(&mut self, channels: Vec<Channel>) {
        for channel in channels {
            self.add_channel(channel);
        }
    }

    /// Total energy in the center-of-mass frame: the parent's effective
    /// mass for a decay, the invariant mass of the pair for a scatter.
    pub fn sqrt_s(&self) -> f64 {
        match self.kind {
            ActionKind::Decay => self.incoming[0].effective_mass(),
            ActionKind::Scatter(_) => {
                (self.incoming[0].momentum + self.incoming[1].momentum).abs()
            }
        }
    }

    fn total_momentum(&self) -> FourVector {
        let mut sum = self.incoming[0].momentum;
        for p in &self.incoming[1..] {
            sum += p.momentum;
        }
        sum
    }

    /// Whether the action still applies: every incoming particle is still
    /// present in `particles` and unchanged in species, momentum and last
    /// process. An earlier commit consuming any participant (including an
    /// elastic one that only redirected it) invalidates this action.
    pub fn is_valid(&self, particles: &Particles) -> bool {
        self.incoming.iter().all(|p| particles.is_unchanged(p))
    }

    /// Populate the decay channel list from the parent type's decay-mode
    /// table, keeping only modes open at the parent's effective mass.
    /// Channel weights are partial widths.
    pub fn populate_decay_channels(&mut self) {
        let parent = &self.incoming[0];
        let mass = parent.effective_mass();
        let width = parent.ptype.width;
        let channels: Vec<Channel> = parent
            .ptype
            .decay_modes
            .iter()
            .filter(|mode| mode.threshold() < mass)
            .map(|mode| {
                Channel::new(
                    mode.daughters.clone(),
                    mode.branching_ratio * width,
                    ProcessKind::Decay,
                )
            })
            .collect();
        self.add_channels(channels);
    }

    /// Populate the scatter channel list through the parametrization
    /// collaborator. The scatter class decides which computations apply:
    /// string excitation needs a baryon or high energy (baryon-baryon and
    /// baryon-meson classes), inelastic 2->2 only exists for
    /// baryon-baryon, elastic and resonance formation apply everywhere.
    /// Weights are scaled by the formation factors of unformed
    /// participants.
    pub fn populate_scatter_channels(&mut self, xs: &dyn CrossSections, include_strings: bool) {
        let class = match self.kind {
            ActionKind::Scatter(class) => class,
            ActionKind::Decay => return,
        };
        let srts = self.sqrt_s();
        let a = self.incoming[0].clone();
        let b = self.incoming[1].clone();
        let scale =
            a.xsec_scaling_factor(a.position.t) * b.xsec_scaling_factor(b.position.t);

        let scaled = |channel: Channel| {
            Channel::new(
                channel.outgoing().to_vec(),
                channel.weight() * scale,
                channel.process(),
            )
        };

        self.add_channel(Channel::new(
            vec![a.ptype.clone(), b.ptype.clone()],
            xs.elastic(&a.ptype, &b.ptype, srts) * scale,
            ProcessKind::Elastic,
        ));
        for channel in xs.resonance_channels(&a.ptype, &b.ptype, srts) {
            self.add_channel(scaled(channel));
        }
        if class == ScatterClass::BaryonBaryon {
            for channel in xs.inelastic_channels(&a.ptype, &b.ptype, srts) {
                self.add_channel(scaled(channel));
            }
        }
        if include_strings && class != ScatterClass::MesonMeson {
            self.add_channel(Channel::new(
                Vec::new(),
                xs.string_weight(&a.ptype, &b.ptype, srts) * scale,
                ProcessKind::StringExcitation,
            ));
        }
    }

    /// Spacetime point the outgoing particles are created at: the parent's
    /// position for a decay, the midpoint of the pair for a scatter, both
    /// propagated to the execution time.
    fn interaction_point(&self) -> FourVector {
        let t = self.time_of_execution;
        let mut sum = nalgebra::Vector3::zeros();
        for p in &self.incoming {
            let dt = t - p.position.t;
            sum += p.position.threevec() + p.velocity() * dt;
        }
        FourVector::from_parts(t, sum / self.incoming.len() as f64)
    }

    /// Weighted Monte-Carlo channel selection over the kinematically open
    /// subset: draw uniformly in [0, open weight), walk the list
    /// accumulating weights, select the first channel whose cumulative
    /// weight meets the draw. Ties are broken by list order, never by a
    /// second draw.
    fn choose_channel<'a>(
        &self,
        rng: &mut Engine,
        open: &[&'a Channel],
    ) -> Result<&'a Channel, FatalError> {
        let total: f64 = open.iter().map(|c| c.weight()).sum();
        let draw = uniform(rng, 0.0, total);
        let mut accumulated = 0.0;
        for channel in open {
            accumulated += channel.weight();
            if accumulated >= draw {
                return Ok(channel);
            }
        }
        Err(FatalError::UnreachableSelection {
            draw,
            accumulated,
            weights: open.iter().map(|c| c.weight()).collect(),
        })
    }

    /// Sample final-state masses for the outgoing types, one at a time,
    /// spending the energy budget above the summed thresholds. Stable
    /// types sit on their pole mass; resonances are drawn from their
    /// truncated line shape.
    fn sample_masses(
        &self,
        rng: &mut Engine,
        types: &[Arc<ParticleType>],
        srts: f64,
    ) -> Result<Vec<f64>, SamplingError> {
        let min_sum: f64 = types.iter().map(|t| t.minimum_mass()).sum();
        let mut budget = srts - min_sum;
        let mut masses = Vec::with_capacity(types.len());
        for t in types {
            if t.is_stable() {
                masses.push(t.mass);
            } else {
                let lo = t.minimum_mass();
                let m = kinematics::sample_resonance_mass(rng, t.mass, t.width, lo, lo + budget)?;
                budget -= m - lo;
                masses.push(m);
            }
        }
        Ok(masses)
    }

    /// Select one channel and sample the outgoing kinematics, consistent
    /// with exact four-momentum conservation.
    ///
    /// The energy-availability check runs over the whole channel list
    /// before any Monte-Carlo selection, so a closed channel can never be
    /// discovered mid-sampling: if nothing is open the action fails here
    /// and is discarded by the scheduler.
    pub fn generate_final_state(
        &mut self,
        rng: &mut Engine,
        strings: Option<&mut (dyn StringFragmentation + '_)>,
    ) -> Result<(), ActionError> {
        let srts = self.sqrt_s();
        let open: Vec<&Channel> = self
            .channels
            .iter()
            .filter(|c| match c.process() {
                // string thresholds are enforced by the finder
                ProcessKind::StringExcitation => true,
                _ => c.threshold() < srts,
            })
            .collect();
        if open.is_empty() {
            let lowest = self
                .channels
                .iter()
                .map(Channel::threshold)
                .fold(f64::INFINITY, f64::min);
            return Err(SamplingError::NoKinematicallyAllowedChannel {
                sqrt_s: srts,
                lowest_threshold: lowest,
            }
            .into());
        }

        let channel = self.choose_channel(rng, &open)?.clone();
        self.chosen_process = Some(channel.process());
        let total = self.total_momentum();
        let point = self.interaction_point();

        match channel.process() {
            ProcessKind::Elastic => {
                let (q1, q2) = kinematics::reflect_momenta_in_cm(
                    self.incoming[0].momentum,
                    self.incoming[1].momentum,
                );
                self.outgoing = vec![
                    Particle::new(self.incoming[0].ptype.clone(), point, q1),
                    Particle::new(self.incoming[1].ptype.clone(), point, q2),
                ];
            }
            ProcessKind::TwoToOne => {
                // the resonance takes the full four-momentum; its
                // effective mass is sqrt(s), off the pole in general
                self.outgoing = vec![Particle::new(channel.outgoing()[0].clone(), point, total)];
            }
            ProcessKind::TwoToTwo | ProcessKind::Decay => match channel.outgoing().len() {
                2 => {
                    let masses = self.sample_masses(rng, channel.outgoing(), srts)?;
                    let (q1, q2) =
                        kinematics::two_body_final_momenta(rng, total, masses[0], masses[1])?;
                    self.outgoing = vec![
                        Particle::new(channel.outgoing()[0].clone(), point, q1),
                        Particle::new(channel.outgoing()[1].clone(), point, q2),
                    ];
                }
                3 => {
                    let masses = self.sample_masses(rng, channel.outgoing(), srts)?;
                    let (q1, q2, q3) = kinematics::three_body_final_momenta(
                        rng, total, masses[0], masses[1], masses[2],
                    )?;
                    let types = channel.outgoing();
                    self.outgoing = vec![
                        Particle::new(types[0].clone(), point, q1),
                        Particle::new(types[1].clone(), point, q2),
                        Particle::new(types[2].clone(), point, q3),
                    ];
                }
                count => {
                    return Err(FatalError::UnsupportedFinalState { count }.into());
                }
            },
            ProcessKind::StringExcitation => {
                let fragmenter = strings.ok_or(FatalError::MissingStringFragmenter)?;
                let mut out = fragmenter.fragment(
                    &self.incoming[0],
                    &self.incoming[1],
                    self.time_of_execution,
                    rng,
                )?;
                for p in &mut out {
                    p.position = point;
                }
                self.outgoing = out;
            }
        }
        Ok(())
    }

    /// Commit the action: remove the incoming particles from the set,
    /// insert the outgoing ones with fresh ids and a fresh process id,
    /// and verify the conservation laws. Assumes `is_valid` was checked
    /// and `generate_final_state` has run.
    pub fn perform(
        &mut self,
        particles: &mut Particles,
        id_process: &mut u64,
    ) -> Result<(), FatalError> {
        debug_assert!(
            !self.outgoing.is_empty(),
            "perform called before generate_final_state"
        );
        *id_process += 1;
        let process_id = *id_process;
        self.check_conservation(process_id)?;

        let collision_count = self
            .incoming
            .iter()
            .map(|p| p.history.collision_count)
            .max()
            .unwrap_or(0)
            + 1;
        let parent = self
            .incoming
            .iter()
            .map(|p| p.ptype.name.as_str())
            .collect::<Vec<_>>()
            .join("+");

        for p in &self.incoming {
            particles
                .remove(p.id)
                .ok_or(FatalError::StaleAction { particle_id: p.id })?;
        }
        let string_process = self.chosen_process == Some(ProcessKind::StringExcitation);
        for out in &mut self.outgoing {
            out.history.id_process = process_id;
            out.history.collision_count = collision_count;
            out.history.parent = Some(parent.clone());
            if !string_process {
                // the fragmenter owns the formation convention for string
                // products; everything else is formed at once
                out.history.formation_time = self.time_of_execution;
                out.history.cross_section_scaling_factor = 1.0;
            }
            let id = particles.insert(out.clone());
            out.id = id;
        }
        Ok(())
    }

    fn check_conservation(&self, id_process: u64) -> Result<(), FatalError> {
        let sum_in = self.total_momentum();
        let mut sum_out = FourVector::new(0.0, 0.0, 0.0, 0.0);
        for p in &self.outgoing {
            sum_out += p.momentum;
        }
        let scale = sum_in.t.abs().max(1.0);
        let de = (sum_in.t - sum_out.t).abs();
        if de > CONSERVATION_TOLERANCE * scale {
            return Err(FatalError::ConservationViolation {
                id_process,
                quantity: "energy",
                difference: de,
            });
        }
        let dp = (sum_in.x - sum_out.x).norm();
        if dp > CONSERVATION_TOLERANCE * scale {
            return Err(FatalError::ConservationViolation {
                id_process,
                quantity: "momentum",
                difference: dp,
            });
        }
        let charge_in: i32 = self.incoming.iter().map(|p| p.ptype.charge).sum();
        let charge_out: i32 = self.outgoing.iter().map(|p| p.ptype.charge).sum();
        if charge_in != charge_out {
            return Err(FatalError::ConservationViolation {
                id_process,
                quantity: "charge",
                difference: (charge_in - charge_out) as f64,
            });
        }
        let baryon_in: i32 = self.incoming.iter().map(|p| p.ptype.baryon_number).sum();
        let baryon_out: i32 = self.outgoing.iter().map(|p| p.ptype.baryon_number).sum();
        if baryon_in != baryon_out {
            return Err(FatalError::ConservationViolation {
                id_process,
                quantity: "baryon number",
                difference: (baryon_in - baryon_out) as f64,
            });
        }
        Ok(())
    }
}

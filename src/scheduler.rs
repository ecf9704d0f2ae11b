use log::debug;

use crate::action::Action;
use crate::errors::{ActionError, FatalError};
use crate::output::{InteractionRecord, OutputListener};
use crate::particles::Particles;
use crate::pauli::PauliBlocker;
use crate::random::{canonical, Engine};
use crate::string_process::StringFragmentation;

/// Per-timestep bookkeeping returned by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestepSummary {
    pub committed: usize,
    /// Candidates dropped because an earlier commit consumed one of their
    /// participants.
    pub invalidated: usize,
    /// Candidates rejected by the phase-space-blocking veto.
    pub vetoed: usize,
    /// Candidates aborted by a recoverable sampling failure.
    pub sampling_failures: usize,
}

/// The per-timestep conflict resolver: Collecting has already happened in
/// the finders; this runs Ordering, Committing, Done.
///
/// Ordering sorts the merged candidate list by scheduled time; ties go to
/// the action with the larger total weight (the more probable
/// interaction), then to collection order, so results are reproducible
/// for a fixed random stream.
///
/// Committing is strictly sequential: each commit mutates the shared
/// particle set and must be visible to the next candidate's validity
/// check. There are no locks — just optimistic re-validation before every
/// commit; discarding an invalidated candidate is a pure no-op.
pub struct Scheduler;

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn run_timestep(
        mut candidates: Vec<Action>,
        particles: &mut Particles,
        rng: &mut Engine,
        id_process: &mut u64,
        pauli: &dyn PauliBlocker,
        mut strings: Option<&mut (dyn StringFragmentation + '_)>,
        output: &mut dyn OutputListener,
    ) -> Result<TimestepSummary, FatalError> {
        // Ordering
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&i, &j| {
            let a = &candidates[i];
            let b = &candidates[j];
            a.time_of_execution()
                .total_cmp(&b.time_of_execution())
                .then(b.total_weight().total_cmp(&a.total_weight()))
                .then(i.cmp(&j))
        });

        // Committing
        let mut summary = TimestepSummary::default();
        for idx in order {
            let action = &mut candidates[idx];

            if !action.is_valid(particles) {
                summary.invalidated += 1;
                continue;
            }

            let blocking = pauli.blocking_probability(particles, action);
            if blocking > 0.0 && canonical(rng) < blocking {
                summary.vetoed += 1;
                continue;
            }

            match action.generate_final_state(rng, strings.as_deref_mut()) {
                Ok(()) => {}
                Err(ActionError::Sampling(err)) => {
                    debug!("discarding candidate at t = {}: {}", action.time_of_execution(), err);
                    summary.sampling_failures += 1;
                    continue;
                }
                Err(ActionError::Fatal(err)) => return Err(err),
            }

            action.perform(particles, id_process)?;
            summary.committed += 1;

            let record = InteractionRecord {
                id_process: *id_process,
                process: action
                    .process_kind()
                    .expect("final state was generated before commit"),
                time: action.time_of_execution(),
                total_weight: action.total_weight(),
                incoming: action.incoming_particles().to_vec(),
                outgoing: action.outgoing_particles().to_vec(),
            };
            output.at_interaction(&record);
        }

        // Done: anything unvisited or skipped is dropped here with the
        // candidate list.
        Ok(summary)
    }
}

use thiserror::Error;

/// Recoverable per-candidate failures. The offending action is discarded;
/// the timestep continues.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// No surviving channel is kinematically open at the available
    /// center-of-mass energy. Detected before the Monte-Carlo channel
    /// selection, never mid-sampling.
    #[error("no kinematically allowed channel at sqrt(s) = {sqrt_s} GeV (lowest threshold {lowest_threshold} GeV)")]
    NoKinematicallyAllowedChannel { sqrt_s: f64, lowest_threshold: f64 },

    /// The external fragmenter could not produce a final state for this
    /// pair (e.g. below its internal threshold).
    #[error("string fragmentation failed: {0}")]
    StringFragmentation(String),
}

/// Unrecoverable internal-consistency violations. These indicate a
/// correctness bug upstream and must halt the run rather than silently
/// corrupt subsequent physics.
#[derive(Debug, Error)]
pub enum FatalError {
    /// Outgoing conserved quantities do not match the incoming sums.
    #[error("conservation violated in process {id_process}: {quantity} changed by {difference:e} (relative tolerance exceeded)")]
    ConservationViolation {
        id_process: u64,
        quantity: &'static str,
        difference: f64,
    },

    /// The weighted Monte-Carlo walk over channels found no channel,
    /// violating the total-weight invariant.
    #[error("channel selection failed: draw {draw} out of accumulated weight {accumulated} (channel weights {weights:?})")]
    UnreachableSelection {
        draw: f64,
        accumulated: f64,
        weights: Vec<f64>,
    },

    /// An action reached `perform` although one of its incoming particles
    /// is no longer in the set; the scheduler's validity check was
    /// bypassed or broken.
    #[error("stale action committed: incoming particle {particle_id} missing from the particle set")]
    StaleAction { particle_id: u64 },

    /// A string channel was selected but no fragmenter is configured.
    /// Configuration errors are caught at startup; seeing this at commit
    /// time is an internal bug.
    #[error("string excitation selected but no fragmenter is configured")]
    MissingStringFragmenter,

    /// A sampled channel asked for a final-state multiplicity the
    /// kinematics layer does not produce (only 1, 2 and 3 bodies exist
    /// outside string fragmentation).
    #[error("unsupported final-state multiplicity {count}")]
    UnsupportedFinalState { count: usize },
}

/// Everything `generate_final_state` can report.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Startup-time configuration problems, reported once and synchronously.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("string excitation is enabled but no fragmentation backend was provided")]
    StringFragmenterMissing,

    #[error("timestep configuration invalid: {0}")]
    InvalidTimestep(String),
}

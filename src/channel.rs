use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::species::ParticleType;

/// Classification of the physical process behind a channel or a committed
/// action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Two-body elastic scattering (momentum exchange only).
    Elastic,
    /// Resonance formation, 2 -> 1.
    TwoToOne,
    /// Inelastic 2 -> 2 (at least one outgoing resonance).
    TwoToTwo,
    /// High-energy string excitation, 2 -> n via the external fragmenter.
    StringExcitation,
    /// Decay, 1 -> 2 or 1 -> 3.
    Decay,
}

/// One possible outcome of an action: the ordered outgoing species, a
/// non-negative weight (cross section [mb] for scatters, partial width
/// [GeV] for decays), and the process tag. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    outgoing: Vec<Arc<ParticleType>>,
    weight: f64,
    process: ProcessKind,
}

impl Channel {
    pub fn new(outgoing: Vec<Arc<ParticleType>>, weight: f64, process: ProcessKind) -> Self {
        debug_assert!(weight >= 0.0, "channel weight must be non-negative");
        Self {
            outgoing,
            weight,
            process,
        }
    }

    pub fn outgoing(&self) -> &[Arc<ParticleType>] {
        &self.outgoing
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn process(&self) -> ProcessKind {
        self.process
    }

    /// Lowest center-of-mass energy at which this channel is open. String
    /// channels have no species list of their own; the finder gates them
    /// by the string threshold instead.
    pub fn threshold(&self) -> f64 {
        self.outgoing.iter().map(|t| t.minimum_mass()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_threshold() {
        let p = ParticleType::lookup("p").unwrap();
        let pi = ParticleType::lookup("pi0").unwrap();
        let ch = Channel::new(vec![p.clone(), pi.clone()], 5.0, ProcessKind::TwoToTwo);
        assert!((ch.threshold() - (p.mass + pi.mass)).abs() < 1e-12);
        assert_eq!(ch.process(), ProcessKind::TwoToTwo);
    }

    #[test]
    fn test_string_channel_threshold_is_zero() {
        let ch = Channel::new(vec![], 3.0, ProcessKind::StringExcitation);
        assert_eq!(ch.threshold(), 0.0);
    }
}

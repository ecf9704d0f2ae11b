use std::sync::Arc;

use crate::channel::{Channel, ProcessKind};
use crate::species::ParticleType;

/// Physics-parametrization collaborator.
///
/// Supplies channel lists and weights for a species pair at a given
/// center-of-mass energy. The action/finder layer treats every weight as an
/// opaque non-negative cross section [mb]; no parametrization formula lives
/// in this crate.
pub trait CrossSections: Send + Sync {
    /// Elastic cross section for the pair.
    fn elastic(&self, a: &ParticleType, b: &ParticleType, sqrt_s: f64) -> f64;

    /// Resonance-production channels: 2 -> 1 formation and 2 -> 2 with a
    /// resonance in the final state, each with its production cross
    /// section.
    fn resonance_channels(
        &self,
        a: &ParticleType,
        b: &ParticleType,
        sqrt_s: f64,
    ) -> Vec<Channel>;

    /// Non-resonant inelastic 2 -> 2 channels.
    fn inelastic_channels(
        &self,
        a: &ParticleType,
        b: &ParticleType,
        sqrt_s: f64,
    ) -> Vec<Channel>;

    /// Cross section routed to string excitation; zero below the string
    /// threshold.
    fn string_weight(&self, a: &ParticleType, b: &ParticleType, sqrt_s: f64) -> f64;

    /// Total cross section of the pair, used for the geometric collision
    /// criterion. Defaults to the sum over all contributions.
    fn total(&self, a: &ParticleType, b: &ParticleType, sqrt_s: f64) -> f64 {
        let resonant: f64 = self
            .resonance_channels(a, b, sqrt_s)
            .iter()
            .map(Channel::weight)
            .sum();
        let inelastic: f64 = self
            .inelastic_channels(a, b, sqrt_s)
            .iter()
            .map(Channel::weight)
            .sum();
        self.elastic(a, b, sqrt_s) + resonant + inelastic + self.string_weight(a, b, sqrt_s)
    }
}

/// Fixed elastic cross section, nothing else. The default for unit tests
/// and demo setups.
#[derive(Debug, Clone)]
pub struct ConstantCrossSections {
    pub elastic_mb: f64,
}

impl ConstantCrossSections {
    pub fn new(elastic_mb: f64) -> Self {
        Self { elastic_mb }
    }
}

impl CrossSections for ConstantCrossSections {
    fn elastic(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        self.elastic_mb
    }

    fn resonance_channels(
        &self,
        _a: &ParticleType,
        _b: &ParticleType,
        _sqrt_s: f64,
    ) -> Vec<Channel> {
        Vec::new()
    }

    fn inelastic_channels(
        &self,
        _a: &ParticleType,
        _b: &ParticleType,
        _sqrt_s: f64,
    ) -> Vec<Channel> {
        Vec::new()
    }

    fn string_weight(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        0.0
    }
}

/// Table-driven cross sections keyed by species-pair names. Useful for
/// tests that need specific resonance channels without a parametrization.
#[derive(Default)]
pub struct TabulatedCrossSections {
    pub elastic_mb: f64,
    entries: Vec<PairEntry>,
}

struct PairEntry {
    a: String,
    b: String,
    channels: Vec<(Vec<Arc<ParticleType>>, f64, ProcessKind)>,
}

impl TabulatedCrossSections {
    pub fn new(elastic_mb: f64) -> Self {
        Self {
            elastic_mb,
            entries: Vec::new(),
        }
    }

    /// Register a resonance channel for the unordered pair (a, b).
    pub fn add_resonance_channel(
        &mut self,
        a: &str,
        b: &str,
        outgoing: Vec<Arc<ParticleType>>,
        weight_mb: f64,
    ) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| Self::matches_names(e, a, b))
        {
            entry
                .channels
                .push((outgoing, weight_mb, ProcessKind::TwoToOne));
            return;
        }
        self.entries.push(PairEntry {
            a: a.to_string(),
            b: b.to_string(),
            channels: vec![(outgoing, weight_mb, ProcessKind::TwoToOne)],
        });
    }

    fn matches_names(entry: &PairEntry, a: &str, b: &str) -> bool {
        (entry.a == a && entry.b == b) || (entry.a == b && entry.b == a)
    }

    fn matches(entry: &PairEntry, a: &ParticleType, b: &ParticleType) -> bool {
        Self::matches_names(entry, &a.name, &b.name)
    }
}

impl CrossSections for TabulatedCrossSections {
    fn elastic(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        self.elastic_mb
    }

    fn resonance_channels(
        &self,
        a: &ParticleType,
        b: &ParticleType,
        _sqrt_s: f64,
    ) -> Vec<Channel> {
        self.entries
            .iter()
            .filter(|e| Self::matches(e, a, b))
            .flat_map(|e| {
                e.channels
                    .iter()
                    .map(|(out, w, kind)| Channel::new(out.clone(), *w, *kind))
            })
            .collect()
    }

    fn inelastic_channels(
        &self,
        _a: &ParticleType,
        _b: &ParticleType,
        _sqrt_s: f64,
    ) -> Vec<Channel> {
        Vec::new()
    }

    fn string_weight(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        0.0
    }
}

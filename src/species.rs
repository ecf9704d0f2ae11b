use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::WIDTH_CUTOFF;

/// One possible decay of a particle type: the ordered daughter list and the
/// branching ratio of this mode. Branching ratios of all modes of a type
/// sum to one; the partial width of a mode is ratio * total width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayMode {
    pub daughters: Vec<Arc<ParticleType>>,
    pub branching_ratio: f64,
}

impl DecayMode {
    pub fn new(daughters: Vec<Arc<ParticleType>>, branching_ratio: f64) -> Self {
        Self {
            daughters,
            branching_ratio,
        }
    }

    /// Lowest invariant mass at which this mode is kinematically open.
    pub fn threshold(&self) -> f64 {
        self.daughters.iter().map(|d| d.minimum_mass()).sum()
    }
}

/// Immutable per-species record shared by all particles of one type.
///
/// Types are compared by name; the table below interns each built-in type
/// behind one `Arc` so particles of the same species share a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleType {
    pub name: String,
    /// Pole mass [GeV].
    pub mass: f64,
    /// Total decay width [GeV]; below the width cutoff the type is stable.
    pub width: f64,
    /// Electric charge in units of e.
    pub charge: i32,
    pub baryon_number: i32,
    pub strangeness: i32,
    pub decay_modes: Vec<DecayMode>,
}

impl PartialEq for ParticleType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ParticleType {}

impl ParticleType {
    /// A stable type with no decay modes.
    pub fn stable(name: &str, mass: f64, charge: i32, baryon_number: i32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mass,
            width: 0.0,
            charge,
            baryon_number,
            strangeness: 0,
            decay_modes: Vec::new(),
        })
    }

    /// An unstable (resonance) type with the given decay table.
    pub fn resonance(
        name: &str,
        mass: f64,
        width: f64,
        charge: i32,
        baryon_number: i32,
        decay_modes: Vec<DecayMode>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mass,
            width,
            charge,
            baryon_number,
            strangeness: 0,
            decay_modes,
        })
    }

    pub fn is_stable(&self) -> bool {
        self.width < WIDTH_CUTOFF
    }

    pub fn is_baryon(&self) -> bool {
        self.baryon_number != 0
    }

    pub fn is_meson(&self) -> bool {
        self.baryon_number == 0
    }

    /// Baryons carry half-integer spin; they are the fermions subject to
    /// phase-space blocking in this hadronic context.
    pub fn is_fermion(&self) -> bool {
        self.baryon_number % 2 != 0
    }

    /// Lowest invariant mass this type can be produced with. Stable types
    /// sit on their pole mass; resonances reach down to the lightest open
    /// decay threshold.
    pub fn minimum_mass(&self) -> f64 {
        if self.is_stable() || self.decay_modes.is_empty() {
            self.mass
        } else {
            self.decay_modes
                .iter()
                .map(|m| m.threshold())
                .fold(f64::INFINITY, f64::min)
        }
    }

    /// Look up a built-in type by name.
    pub fn lookup(name: &str) -> Option<Arc<ParticleType>> {
        BUILTIN_TYPES.get(name).cloned()
    }
}

/// Built-in hadron table used by tests and demo setups. Real runs may
/// construct their own `Arc<ParticleType>` records; nothing in the core
/// depends on this particular set.
static BUILTIN_TYPES: Lazy<HashMap<&'static str, Arc<ParticleType>>> = Lazy::new(|| {
    let mut table = HashMap::new();

    let pi0 = ParticleType::stable("pi0", 0.134977, 0, 0);
    let pi_plus = ParticleType::stable("pi+", 0.139570, 1, 0);
    let pi_minus = ParticleType::stable("pi-", 0.139570, -1, 0);
    let proton = ParticleType::stable("p", 0.938272, 1, 1);
    let neutron = ParticleType::stable("n", 0.939565, 0, 1);

    let rho0 = ParticleType::resonance(
        "rho0",
        0.77526,
        0.1491,
        0,
        0,
        vec![DecayMode::new(vec![pi_plus.clone(), pi_minus.clone()], 1.0)],
    );

    let delta_plus = ParticleType::resonance(
        "Delta+",
        1.232,
        0.117,
        1,
        1,
        vec![
            DecayMode::new(vec![proton.clone(), pi0.clone()], 2.0 / 3.0),
            DecayMode::new(vec![neutron.clone(), pi_plus.clone()], 1.0 / 3.0),
        ],
    );

    table.insert("pi0", pi0);
    table.insert("pi+", pi_plus);
    table.insert("pi-", pi_minus);
    table.insert("p", proton);
    table.insert("n", neutron);
    table.insert("rho0", rho0);
    table.insert("Delta+", delta_plus);
    table
});

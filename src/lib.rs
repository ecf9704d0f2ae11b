mod action;
mod channel;
pub mod constants;
mod cross_sections;
mod decay_finder;
mod errors;
mod experiment;
mod fourvector;
mod grid;
pub mod kinematics;
mod output;
mod particle;
mod particles;
mod pauli;
pub mod random;
mod scatter_finder;
mod scheduler;
mod settings;
mod species;
mod string_process;

pub use action::{Action, ActionKind, ScatterClass};
pub use channel::{Channel, ProcessKind};
pub use cross_sections::{ConstantCrossSections, CrossSections, TabulatedCrossSections};
pub use decay_finder::DecayFinder;
pub use errors::{ActionError, ConfigError, FatalError, SamplingError};
pub use experiment::Experiment;
pub use fourvector::FourVector;
pub use grid::SpatialGrid;
pub use output::{CollectingOutput, InteractionRecord, OutputListener};
pub use particle::{History, Particle};
pub use particles::Particles;
pub use pauli::{NoBlocking, PauliBlocker};
pub use random::{BesselSampler, Engine};
pub use scatter_finder::ScatterFinder;
pub use scheduler::{Scheduler, TimestepSummary};
pub use settings::Settings;
pub use species::{DecayMode, ParticleType};
pub use string_process::StringFragmentation;

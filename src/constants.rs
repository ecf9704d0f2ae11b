// Physical and numerical constants shared across the transport core.
// Units: energies and masses in GeV, lengths and times in fm (c = 1).

/// hbar * c [GeV fm]
pub const HBARC: f64 = 0.197_326_968;

/// Conversion factor: 1 mb = 0.1 fm^2
pub const FM2_MB: f64 = 0.1;

/// Numerical threshold below which a quantity is treated as zero.
///
/// Doubles as the negligible-weight cutoff for channels: a channel whose
/// cross section or partial width is at or below this value carries no
/// meaningful probability and is dropped at insertion time.
pub const REALLY_SMALL: f64 = 1.0e-6;

/// Relative tolerance for the conservation checks after a commit.
pub const CONSERVATION_TOLERANCE: f64 = 1.0e-6;

/// Total widths below this value [GeV] mark a particle type as stable.
pub const WIDTH_CUTOFF: f64 = 1.0e-5;

/// Upper bound on any total cross section considered relevant [mb].
/// Sets the interaction range and thereby the grid cell size.
pub const MAXIMUM_CROSS_SECTION: f64 = 200.0;

use serde::{Deserialize, Serialize};

use crate::constants::MAXIMUM_CROSS_SECTION;

/// Run configuration, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Master seed of the shared random engine; all sub-streams derive
    /// from it.
    pub seed: u64,
    /// Timestep length [fm/c].
    pub delta_time: f64,
    /// End of the simulated event [fm/c].
    pub end_time: f64,
    /// Test-particle multiplier; cross sections are divided by it.
    pub testparticles: u32,
    /// Largest total cross section considered relevant [mb]; sets the
    /// interaction range the grid cells are sized to.
    pub max_cross_section: f64,
    /// Whether string-excitation channels are offered (requires a
    /// fragmentation backend).
    pub include_strings: bool,
    /// Baryon-baryon collisions below this sqrt(s) [GeV] are excluded.
    pub low_snn_cut: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 1,
            delta_time: 1.0,
            end_time: 10.0,
            testparticles: 1,
            max_cross_section: MAXIMUM_CROSS_SECTION,
            include_strings: false,
            low_snn_cut: 1.98,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.testparticles, 1);
        assert!(settings.delta_time > 0.0);
        assert!(!settings.include_strings);
    }
}

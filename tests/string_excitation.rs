// Integration test: the external fragmentation collaborator drives the
// string channel, owns the formation-time convention of its products, and
// is demanded at configuration time.

use hadromc::random::Engine;
use hadromc::{
    Channel, CollectingOutput, ConfigError, CrossSections, Experiment, FourVector, Particle,
    ParticleType, ProcessKind, SamplingError, Settings, StringFragmentation,
};

/// Routes everything into the string channel.
struct StringOnly {
    weight_mb: f64,
}

impl CrossSections for StringOnly {
    fn elastic(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        0.0
    }
    fn resonance_channels(&self, _a: &ParticleType, _b: &ParticleType, _s: f64) -> Vec<Channel> {
        Vec::new()
    }
    fn inelastic_channels(&self, _a: &ParticleType, _b: &ParticleType, _s: f64) -> Vec<Channel> {
        Vec::new()
    }
    fn string_weight(&self, _a: &ParticleType, _b: &ParticleType, _sqrt_s: f64) -> f64 {
        self.weight_mb
    }
}

/// Black-box fragmenter: re-emits the incoming species with their momenta
/// (trivially conserving), stamping the string formation convention.
struct PassThroughFragmenter {
    formation_delay: f64,
    scaling: f64,
}

impl StringFragmentation for PassThroughFragmenter {
    fn fragment(
        &mut self,
        a: &Particle,
        b: &Particle,
        time: f64,
        _rng: &mut Engine,
    ) -> Result<Vec<Particle>, SamplingError> {
        let mut out = vec![a.clone(), b.clone()];
        for p in &mut out {
            p.history.formation_time = time + self.formation_delay;
            p.history.cross_section_scaling_factor = self.scaling;
        }
        Ok(out)
    }
}

fn proton_pion_pair(experiment: &mut Experiment) {
    let proton = ParticleType::lookup("p").unwrap();
    let pi_minus = ParticleType::lookup("pi-").unwrap();
    experiment.add_particle(Particle::on_shell(
        proton,
        FourVector::new(0.0, -0.3, 0.0, 0.0),
        0.5,
        0.0,
        0.0,
    ));
    experiment.add_particle(Particle::on_shell(
        pi_minus,
        FourVector::new(0.0, 0.3, 0.0, 0.0),
        -0.5,
        0.0,
        0.0,
    ));
}

#[test]
fn test_missing_fragmenter_is_a_config_error() {
    let settings = Settings {
        include_strings: true,
        ..Settings::default()
    };
    let result = Experiment::new(settings, Box::new(StringOnly { weight_mb: 20.0 }), None);
    assert!(matches!(result, Err(ConfigError::StringFragmenterMissing)));
}

#[test]
fn test_string_products_keep_fragmenter_convention() {
    let settings = Settings {
        seed: 8,
        delta_time: 1.0,
        end_time: 2.0,
        include_strings: true,
        ..Settings::default()
    };
    let mut experiment = Experiment::new(
        settings,
        Box::new(StringOnly { weight_mb: 20.0 }),
        Some(Box::new(PassThroughFragmenter {
            formation_delay: 1.0,
            scaling: 0.25,
        })),
    )
    .unwrap();
    proton_pion_pair(&mut experiment);

    let mut output = CollectingOutput::new();
    experiment.run(&mut output).unwrap();

    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert_eq!(record.process, ProcessKind::StringExcitation);
    assert_eq!(record.outgoing.len(), 2);
    for p in &record.outgoing {
        // the fragmenter's convention survives the commit
        assert!(p.history.formation_time > record.time);
        assert_eq!(p.history.cross_section_scaling_factor, 0.25);
        assert_eq!(p.history.id_process, record.id_process);
    }
}

// Integration test: resonance formation followed by decay, with every
// committed record conserving energy, momentum, charge and baryon number.

use approx::assert_relative_eq;
use hadromc::{
    CollectingOutput, Experiment, FourVector, InteractionRecord, Particle, ParticleType,
    ProcessKind, Settings, TabulatedCrossSections,
};

fn assert_record_conserves(record: &InteractionRecord) {
    let e_in: f64 = record.incoming.iter().map(|p| p.momentum.t).sum();
    let e_out: f64 = record.outgoing.iter().map(|p| p.momentum.t).sum();
    assert_relative_eq!(e_in, e_out, max_relative = 1e-6);

    for k in 0..3 {
        let p_in: f64 = record.incoming.iter().map(|p| p.momentum.x[k]).sum();
        let p_out: f64 = record.outgoing.iter().map(|p| p.momentum.x[k]).sum();
        assert!((p_in - p_out).abs() < 1e-6, "momentum component {} drifted", k);
    }

    let q_in: i32 = record.incoming.iter().map(|p| p.ptype.charge).sum();
    let q_out: i32 = record.outgoing.iter().map(|p| p.ptype.charge).sum();
    assert_eq!(q_in, q_out);

    let b_in: i32 = record.incoming.iter().map(|p| p.ptype.baryon_number).sum();
    let b_out: i32 = record.outgoing.iter().map(|p| p.ptype.baryon_number).sum();
    assert_eq!(b_in, b_out);
}

#[test]
fn test_formation_and_decay_chain_conserves() {
    let mut xs = TabulatedCrossSections::new(0.0);
    let rho = ParticleType::lookup("rho0").unwrap();
    xs.add_resonance_channel("pi+", "pi-", vec![rho], 10.0);

    let settings = Settings {
        seed: 12,
        delta_time: 5.0,
        end_time: 200.0,
        ..Settings::default()
    };
    let mut experiment = Experiment::new(settings, Box::new(xs), None).unwrap();

    let pi_plus = ParticleType::lookup("pi+").unwrap();
    let pi_minus = ParticleType::lookup("pi-").unwrap();
    experiment.add_particle(Particle::on_shell(
        pi_plus,
        FourVector::new(0.0, -0.25, 0.0, 0.0),
        0.3,
        0.0,
        0.0,
    ));
    experiment.add_particle(Particle::on_shell(
        pi_minus,
        FourVector::new(0.0, 0.25, 0.0, 0.0),
        -0.3,
        0.0,
        0.0,
    ));

    let mut output = CollectingOutput::new();
    experiment.run(&mut output).unwrap();

    // formation first, decay later; nothing else can happen
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0].process, ProcessKind::TwoToOne);
    assert_eq!(output.records[0].outgoing.len(), 1);
    assert_eq!(output.records[0].outgoing[0].ptype.name, "rho0");
    assert_eq!(output.records[1].process, ProcessKind::Decay);
    assert!(output.records[0].time <= output.records[1].time);
    assert_eq!(output.records[0].id_process + 1, output.records[1].id_process);

    for record in &output.records {
        assert_record_conserves(record);
    }

    // the event ends with the two decay pions
    assert_eq!(experiment.particles().len(), 2);
    let charge: i32 = experiment
        .particles()
        .iter()
        .map(|p| p.ptype.charge)
        .sum();
    assert_eq!(charge, 0);

    // the intermediate resonance carried the pair's full invariant mass
    let formed = &output.records[0].outgoing[0];
    let e_in: f64 = output.records[0].incoming.iter().map(|p| p.momentum.t).sum();
    assert_relative_eq!(formed.momentum.t, e_in, epsilon = 1e-9);

    // descendants carry the decay's process id and a collision count of 2
    for p in experiment.particles().iter() {
        assert_eq!(p.history.id_process, output.records[1].id_process);
        assert_eq!(p.history.collision_count, 2);
        assert_eq!(p.history.parent.as_deref(), Some("rho0"));
    }
}

#[test]
fn test_delta_decay_conserves_baryon_number() {
    let settings = Settings {
        seed: 3,
        delta_time: 10.0,
        end_time: 500.0,
        ..Settings::default()
    };
    let mut experiment = Experiment::new(
        settings,
        Box::new(TabulatedCrossSections::new(0.0)),
        None,
    )
    .unwrap();

    let delta = ParticleType::lookup("Delta+").unwrap();
    experiment.add_particle(Particle::on_shell(
        delta,
        FourVector::new(0.0, 0.0, 0.0, 0.0),
        0.0,
        0.0,
        0.2,
    ));

    let mut output = CollectingOutput::new();
    experiment.run(&mut output).unwrap();

    assert_eq!(output.records.len(), 1);
    assert_record_conserves(&output.records[0]);
    let baryons: i32 = experiment
        .particles()
        .iter()
        .map(|p| p.ptype.baryon_number)
        .sum();
    assert_eq!(baryons, 1);
}

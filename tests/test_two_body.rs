mod common;

use common::earth_like_engine;
use solar_flyby::{
    diagnostics::{ConservationBaseline, Diagnostics},
    engine::PhysicsEngine,
};

#[test]
fn test_energy_and_angular_momentum_conservation_over_10yrs() {
    let mut engine = earth_like_engine(0.01);

    let diagnostics = Diagnostics::new(&engine);
    let e0 = diagnostics.energy();
    let l0 = diagnostics.angular_momentum().norm();

    // regular output cadence, as a run would sample it
    let t_end = 10.0;
    for k in 0..=200 {
        engine.integrate_to(t_end * k as f64 / 200.0).unwrap();
    }

    let diagnostics = Diagnostics::new(&engine);
    let rel_de = ((diagnostics.energy() - e0) / e0).abs();
    let rel_dl = ((diagnostics.angular_momentum().norm() - l0) / l0).abs();

    assert!(rel_de < 1e-11, "Energy drift too large: {rel_de}");
    assert!(rel_dl < 1e-11, "Angular momentum drift too large: {rel_dl}");
}

#[test]
fn test_conservation_baseline_tracks_drift() {
    let mut engine = earth_like_engine(0.005);
    let baseline = ConservationBaseline::capture(&engine);

    engine.integrate_to(3.7).unwrap();
    let drift = baseline.drift(&engine);

    assert!((engine.time() - 3.7).abs() < 1e-9);
    assert!(drift.relative_energy.abs() < 1e-11);
    assert!(drift.relative_angular_momentum.abs() < 1e-11);
}

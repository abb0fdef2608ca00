//! # Run driver
//!
//! Orchestrates a full run:
//!
//! 1. derive the loader seed from `run.seed_master`,
//! 2. register the optional forces requested in `physics` (an engine refusal is logged
//!    and the run continues without it),
//! 3. load the initial states, hand them to the engine, move to the centre-of-mass frame,
//! 4. advance the engine to `t0 + i·dt` for `i = 0..=⌊duration/dt⌋` and record a
//!    snapshot every `output_every_steps` steps,
//! 5. flush the recorder.
use camino::Utf8PathBuf;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{RunConfig, Seeds},
    constants::{C_AU_PER_YR, DEFAULT_JITTER_AU, GRAV_CONSTANT, R_SUN_AU},
    diagnostics::{compute_elements, ConservationBaseline, ConservationDrift, Diagnostics},
    engine::{try_add_force, whfast::WisdomHolman, ForceModel, PhysicsEngine},
    flyby_errors::Result,
    initial_conditions::{load_initial_states, InitialConditionOptions},
    storage::{RecordedFiles, SnapshotRecorder},
};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outdir: Utf8PathBuf,
    /// Body names in engine order
    pub bodies: Vec<String>,
    /// Optional forces the engine accepted
    pub active_forces: Vec<ForceModel>,
    /// Number of integration steps after the initial state
    pub steps: usize,
    pub snapshots: usize,
    pub final_time: f64,
    /// Conservation drift between the first and the last step
    pub drift: ConservationDrift,
    pub files: RecordedFiles,
}

/// Forces requested by the physics section, in registration order.
fn requested_forces(config: &RunConfig) -> Vec<ForceModel> {
    let mut forces = Vec::new();
    if config.physics.gr {
        forces.push(ForceModel::GeneralRelativity { c: C_AU_PER_YR });
    }
    if config.physics.solar_j2 {
        forces.push(ForceModel::SolarOblateness {
            j2: config.physics.j2_value,
            radius: R_SUN_AU,
        });
    }
    forces
}

/// Run a simulation with the bundled [`WisdomHolman`] engine.
pub fn run_simulation(config: &RunConfig) -> Result<RunSummary> {
    let mut engine = WisdomHolman::new(GRAV_CONSTANT, config.run.dt_yr);
    run_with_engine(config, &mut engine)
}

/// Run a simulation on a caller-provided, empty engine.
///
/// The configuration is validated before the engine is touched.
pub fn run_with_engine<E: PhysicsEngine + ?Sized>(
    config: &RunConfig,
    engine: &mut E,
) -> Result<RunSummary> {
    config.validate()?;
    let run = &config.run;

    let seeds = Seeds::new(run.seed_master);
    let mut rng = StdRng::seed_from_u64(seeds.derive(0));

    let mut active_forces = Vec::new();
    for force in requested_forces(config) {
        if try_add_force(engine, force)? {
            tracing::info!("Registered {force}");
            active_forces.push(force);
        }
    }

    let options = InitialConditionOptions {
        smoke_stub: run.smoke_stub,
        restrict_to_default: true,
        jitter: DEFAULT_JITTER_AU,
    };
    let states = load_initial_states(&config.io.catalog, &options, &mut rng)?;
    let bodies: Vec<String> = states.iter().map(|s| s.name.clone()).collect();
    for state in &states {
        engine.add_body(state.mass, state.position, state.velocity);
    }
    engine.move_to_com();

    let mut recorder = SnapshotRecorder::new(&config.io.outdir)?;
    let baseline = ConservationBaseline::capture(engine);

    let dt = run.dt_yr;
    let steps = (run.duration_yr / dt).floor() as usize;
    let every = run.output_every_steps;
    tracing::info!(
        "Starting integration: {} bodies, duration={:.3e} yr, steps={steps}",
        bodies.len(),
        run.duration_yr
    );

    let t0 = engine.time();
    for i in 0..=steps {
        engine.integrate_to(t0 + i as f64 * dt)?;

        if i % every == 0 {
            let elements = compute_elements(engine, &bodies, 0)?;
            let diagnostics = Diagnostics::new(engine);
            recorder.record_snapshot(
                engine.time(),
                &elements,
                diagnostics.energy(),
                &diagnostics.angular_momentum(),
            );
            tracing::debug!("Snapshot at t = {:.6} yr", engine.time());
        }
    }

    let files = recorder.finalize()?;
    let drift = baseline.drift(engine);
    tracing::info!(
        "Run complete: relative energy drift {:.3e}. Output in {}",
        drift.relative_energy,
        recorder.outdir()
    );

    Ok(RunSummary {
        outdir: recorder.outdir().to_owned(),
        bodies,
        active_forces,
        steps,
        snapshots: recorder.len(),
        final_time: engine.time(),
        drift,
        files,
    })
}

#[cfg(test)]
mod driver_test {
    use super::*;
    use crate::flyby_errors::FlybyError;

    #[test]
    fn test_requested_forces() {
        let mut config = RunConfig::new(1.0, 0.01);
        assert_eq!(requested_forces(&config).len(), 2);

        config.physics.gr = false;
        config.physics.j2_value = 1e-7;
        assert_eq!(
            requested_forces(&config),
            vec![ForceModel::SolarOblateness {
                j2: 1e-7,
                radius: R_SUN_AU
            }]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RunConfig::new(1.0, -0.01);
        assert!(matches!(
            run_simulation(&config),
            Err(FlybyError::InvalidConfig(_))
        ));

        let mut engine = WisdomHolman::new(GRAV_CONSTANT, 0.01);
        assert!(matches!(
            run_with_engine(&config, &mut engine),
            Err(FlybyError::InvalidConfig(_))
        ));
        assert!(engine.particles().is_empty());
    }
}

//! # Initial conditions
//!
//! Turn a J2000 osculating-element catalogue into heliocentric Cartesian states
//! ready to be handed to a [`PhysicsEngine`](crate::engine::PhysicsEngine).
//!
//! Conventions
//! -----------
//! * Units: AU, AU/yr, Msun.
//! * The Sun sits at the origin with zero velocity. Every other body is placed with
//!   `μ = G·(1 + m)` around a unit-mass Sun.
//! * The Moon row is geocentric: it is converted with `μ = G·(m_earth + m_moon)` and
//!   translated by the Earth's heliocentric state.
//! * A micro-jitter (±2 cm by default) is added independently to each position
//!   component of every non-Sun body, drawn from the caller's RNG.
//!
//! If no catalogue is available, [`load_initial_states`] falls back to the
//! Sun + Earth circular-orbit stub of [`two_body_stub`].
use std::collections::HashMap;

use camino::Utf8Path;
use nalgebra::Vector3;
use rand::Rng;

use crate::{
    constants::{
        AstronomicalUnit, SolarMass, DEFAULT_BODIES, DPI, EARTH, EARTH_MASS, GRAV_CONSTANT, MOON,
        SUN,
    },
    flyby_errors::{FlybyError, Result},
    orbit_type::state_vector::{elements_to_state, StateVector},
};

pub mod catalog_reader;

pub use catalog_reader::{load_catalog, CatalogRow};

/// Initial state of one body, heliocentric.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub name: String,
    pub mass: SolarMass,
    /// AU
    pub position: Vector3<f64>,
    /// AU/yr
    pub velocity: Vector3<f64>,
}

/// How [`load_initial_states`] builds the body list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialConditionOptions {
    /// Ignore the catalogue and return [`two_body_stub`].
    pub smoke_stub: bool,
    /// Keep only the bodies of [`default_body_list`].
    pub restrict_to_default: bool,
    /// Position jitter amplitude per axis (AU).
    pub jitter: AstronomicalUnit,
}

impl Default for InitialConditionOptions {
    fn default() -> Self {
        InitialConditionOptions {
            smoke_stub: false,
            restrict_to_default: true,
            jitter: crate::constants::DEFAULT_JITTER_AU,
        }
    }
}

/// Canonical names of a full run: Sun, 8 planets, Moon, Pluto, 4 MBAs, 6 KBOs.
pub fn default_body_list() -> Vec<&'static str> {
    DEFAULT_BODIES.to_vec()
}

/// Sun plus an Earth-mass body on a circular 1 AU orbit.
pub fn two_body_stub() -> Vec<BodyState> {
    vec![
        BodyState {
            name: SUN.to_string(),
            mass: 1.0,
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        },
        BodyState {
            name: EARTH.to_string(),
            mass: EARTH_MASS,
            position: Vector3::new(1.0, 0.0, 0.0),
            velocity: Vector3::new(0.0, DPI, 0.0),
        },
    ]
}

/// Reject rows that [`elements_to_state`] cannot place: `a > 0`, `0 ≤ e < 1`, finite values.
fn check_elliptic(row: &CatalogRow) -> Result<()> {
    let values = [
        row.semi_major_axis,
        row.eccentricity,
        row.inclination,
        row.ascending_node_longitude,
        row.periapsis_argument,
        row.mean_anomaly,
        row.mass,
    ];
    let reason = if values.iter().any(|v| !v.is_finite()) {
        "non-finite value".to_string()
    } else if !(0.0..1.0).contains(&row.eccentricity) {
        format!("e = {} is outside [0, 1)", row.eccentricity)
    } else if row.semi_major_axis <= 0.0 {
        format!("a = {} AU is not positive", row.semi_major_axis)
    } else {
        return Ok(());
    };

    Err(FlybyError::InvalidCatalogRow {
        body: row.name.clone(),
        reason,
    })
}

fn row_state(row: &CatalogRow, mu: f64) -> StateVector {
    elements_to_state(
        row.semi_major_axis,
        row.eccentricity,
        row.inclination.to_radians(),
        row.ascending_node_longitude.to_radians(),
        row.periapsis_argument.to_radians(),
        row.mean_anomaly.to_radians(),
        mu,
    )
}

/// Convert catalogue rows to heliocentric body states.
///
/// Arguments
/// ---------
/// * `rows`: catalogue rows, in the order they should appear in the simulation.
/// * `filter`: optional list of names to keep.
/// * `jitter`: per-axis uniform position offset amplitude (AU), `0` disables it.
/// * `rng`: source of the jitter draws.
///
/// Return
/// ------
/// * One [`BodyState`] per kept row, catalogue order preserved.
///
/// Errors
/// ------
/// * [`FlybyError::MissingPrimary`] if the Moon is kept but the Earth is not.
/// * [`FlybyError::InvalidCatalogRow`] if a kept non-Sun row is not a bound orbit.
pub fn build_body_states(
    rows: &[CatalogRow],
    filter: Option<&[&str]>,
    jitter: AstronomicalUnit,
    rng: &mut impl Rng,
) -> Result<Vec<BodyState>> {
    let kept: Vec<&CatalogRow> = rows
        .iter()
        .filter(|row| filter.map_or(true, |names| names.contains(&row.name.as_str())))
        .collect();

    for row in kept.iter().filter(|row| row.name != SUN) {
        check_elliptic(row)?;
    }

    let earth_row = kept.iter().find(|row| row.name == EARTH);

    // heliocentric states of everything but satellites
    let mut states: HashMap<&str, StateVector> = HashMap::new();
    for row in kept.iter().filter(|row| row.name != MOON && row.name != SUN) {
        let mu = GRAV_CONSTANT * (1.0 + row.mass);
        states.insert(row.name.as_str(), row_state(row, mu));
    }

    if let Some(moon) = kept.iter().find(|row| row.name == MOON) {
        let earth = earth_row.ok_or_else(|| FlybyError::MissingPrimary {
            body: MOON.to_string(),
            primary: EARTH.to_string(),
        })?;
        let mu = GRAV_CONSTANT * (earth.mass + moon.mass);
        let geocentric = row_state(moon, mu);
        let earth_state = states[EARTH];
        states.insert(MOON, geocentric.offset_by(&earth_state));
    }

    let bodies = kept
        .into_iter()
        .map(|row| {
            if row.name == SUN {
                return BodyState {
                    name: row.name.clone(),
                    mass: row.mass,
                    position: Vector3::zeros(),
                    velocity: Vector3::zeros(),
                };
            }

            let state = states[row.name.as_str()];
            let mut position = state.position;
            if jitter > 0.0 {
                for k in 0..3 {
                    position[k] += rng.random_range(-jitter..=jitter);
                }
            }
            BodyState {
                name: row.name.clone(),
                mass: row.mass,
                position,
                velocity: state.velocity,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!("Built {} initial body states", bodies.len());
    Ok(bodies)
}

/// Load the initial states of a run.
///
/// * `options.smoke_stub` → [`two_body_stub`].
/// * missing catalogue file → [`two_body_stub`], logged at `info` level.
/// * otherwise [`load_catalog`] followed by [`build_body_states`].
pub fn load_initial_states(
    path: &Utf8Path,
    options: &InitialConditionOptions,
    rng: &mut impl Rng,
) -> Result<Vec<BodyState>> {
    if options.smoke_stub {
        tracing::info!("Smoke run requested: using the Sun + Earth stub");
        return Ok(two_body_stub());
    }
    if !path.exists() {
        tracing::info!("No element catalogue at {path}: using the Sun + Earth stub");
        return Ok(two_body_stub());
    }

    let rows = load_catalog(path)?;
    tracing::info!("Loaded {} catalogue rows from {path}", rows.len());

    let default_list = default_body_list();
    let filter = options.restrict_to_default.then_some(default_list.as_slice());
    build_body_states(&rows, filter, options.jitter, rng)
}

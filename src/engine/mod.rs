//! # Integration engine interface
//!
//! The driver never integrates equations of motion itself: it talks to a
//! [`PhysicsEngine`], a small capability interface exposing
//!
//! - body insertion ([`PhysicsEngine::add_body`]),
//! - advancement to an **absolute** time ([`PhysicsEngine::integrate_to`]),
//! - read access to the live particles ([`PhysicsEngine::particles`]),
//! - conserved-quantity queries ([`PhysicsEngine::energy`], [`PhysicsEngine::angular_momentum`]),
//! - optional force registration ([`PhysicsEngine::add_force`]), which may be refused
//!   with [`FlybyError::OptionalForceUnavailable`].
//!
//! Any integrator can be plugged in behind this trait. The crate ships one:
//! [`whfast::WisdomHolman`], a fixed-step symplectic mapping in Jacobi coordinates.
use nalgebra::Vector3;
use std::fmt;

use crate::flyby_errors::{FlybyError, Result};

pub(crate) mod forces;

/// Wisdom–Holman symplectic integrator.
pub mod whfast;

/// Live state of one body inside an engine (inertial frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Mass (Msun)
    pub mass: f64,
    /// Position (AU)
    pub position: Vector3<f64>,
    /// Velocity (AU/yr)
    pub velocity: Vector3<f64>,
}

/// Optional physical effect on top of point-mass Newtonian gravity.
///
/// Both effects are sourced by particle 0, assumed to be the Sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceModel {
    /// Post-Newtonian correction as a velocity-independent potential
    /// `Φ = −3 (G·M)² / (c²·r²)`, reproducing the perihelion precession.
    GeneralRelativity {
        /// Speed of light in AU/yr
        c: f64,
    },
    /// Quadrupole (J2) field of the rotating Sun, symmetry axis along the reference Z.
    SolarOblateness {
        /// Second zonal harmonic
        j2: f64,
        /// Equatorial radius (AU)
        radius: f64,
    },
}

/// Discriminant of [`ForceModel`], used by engines to advertise what they support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForceKind {
    GeneralRelativity,
    SolarOblateness,
}

impl ForceModel {
    pub fn kind(&self) -> ForceKind {
        match self {
            ForceModel::GeneralRelativity { .. } => ForceKind::GeneralRelativity,
            ForceModel::SolarOblateness { .. } => ForceKind::SolarOblateness,
        }
    }
}

impl fmt::Display for ForceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceModel::GeneralRelativity { c } => write!(f, "gr (c = {c} AU/yr)"),
            ForceModel::SolarOblateness { j2, radius } => {
                write!(f, "gravitational_harmonics (J2 = {j2:e}, R = {radius} AU)")
            }
        }
    }
}

/// Capability interface of an N-body integration engine.
///
/// Engines own the authoritative mutable state once bodies are handed over.
/// All queries reflect the live state at call time.
pub trait PhysicsEngine {
    /// Append a body to the simulation.
    fn add_body(&mut self, mass: f64, position: Vector3<f64>, velocity: Vector3<f64>);

    /// Advance the simulation to the absolute time `t` (yr).
    fn integrate_to(&mut self, t: f64) -> Result<()>;

    /// Current simulation time (yr).
    fn time(&self) -> f64;

    /// Live particles, in insertion order.
    fn particles(&self) -> &[Particle];

    /// Gravitational constant in the engine's units.
    fn gravitational_constant(&self) -> f64;

    /// Total energy, including the potentials of registered optional forces.
    fn energy(&self) -> f64;

    /// Total angular momentum vector `Σ m·(r × v)`.
    fn angular_momentum(&self) -> Vector3<f64>;

    /// Shift positions and velocities to the centre-of-mass frame.
    fn move_to_com(&mut self);

    /// Register an optional force.
    ///
    /// Errors
    /// ------
    /// * [`FlybyError::OptionalForceUnavailable`] if the engine cannot provide it.
    fn add_force(&mut self, force: ForceModel) -> Result<()>;
}

/// Register an optional force, downgrading unavailability to a warning.
///
/// Return
/// ------
/// * `Ok(true)` if the force is active, `Ok(false)` if the engine refused it.
/// * Any other error is propagated.
pub fn try_add_force<E: PhysicsEngine + ?Sized>(engine: &mut E, force: ForceModel) -> Result<bool> {
    match engine.add_force(force) {
        Ok(()) => Ok(true),
        Err(FlybyError::OptionalForceUnavailable(f)) => {
            tracing::warn!("{f} not available in this engine; continuing without it");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

//! N-body setup, orbital element conversion and run recording for long Solar System
//! integrations.
//!
//! Units throughout: AU, year, solar mass (`G = 4π²`).
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod driver;
pub mod engine;
pub mod flyby_errors;
pub mod initial_conditions;
pub mod kepler;
pub mod logging;
pub mod orbit_type;
pub mod ref_system;
pub mod storage;

pub use config::RunConfig;
pub use driver::{run_simulation, RunSummary};
pub use flyby_errors::{FlybyError, Result};

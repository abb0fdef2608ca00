//! # Run configuration
//!
//! A run is described by a YAML document with four sections:
//!
//! ```yaml
//! run:
//!   duration_yr: 1000.0
//!   dt_yr: 0.01
//!   output_every_steps: 100   # default
//!   seed_master: 20250808     # default
//!   smoke_stub: false         # default
//! physics:
//!   gr: true                  # default
//!   solar_j2: true            # default
//!   j2_value: 2.2e-7          # default
//! io:
//!   outdir: outputs/run                   # default
//!   catalog: data/elements_j2000.csv      # default
//! logging:
//!   level: info               # default
//! ```
//!
//! Only `run.duration_yr` and `run.dt_yr` are mandatory.
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::{
    constants::{Year, J2_SUN_DEFAULT},
    flyby_errors::{FlybyError, Result},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub io: IoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunSection {
    pub duration_yr: Year,
    pub dt_yr: Year,
    #[serde(default = "default_output_every_steps")]
    pub output_every_steps: usize,
    #[serde(default = "default_seed_master")]
    pub seed_master: u64,
    #[serde(default)]
    pub smoke_stub: bool,
}

/// Optional physics switches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// General-relativistic correction
    pub gr: bool,
    /// Solar quadrupole
    pub solar_j2: bool,
    pub j2_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub outdir: Utf8PathBuf,
    /// J2000 element catalogue; the Sun + Earth stub is used when it does not exist
    pub catalog: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub level: String,
}

fn default_output_every_steps() -> usize {
    100
}

fn default_seed_master() -> u64 {
    20_250_808
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gr: true,
            solar_j2: true,
            j2_value: J2_SUN_DEFAULT,
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            outdir: Utf8PathBuf::from("outputs/run"),
            catalog: Utf8PathBuf::from("data/elements_j2000.csv"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl RunConfig {
    /// Configuration of a run with the given duration and step, every other field defaulted.
    pub fn new(duration_yr: Year, dt_yr: Year) -> Self {
        RunConfig {
            run: RunSection {
                duration_yr,
                dt_yr,
                output_every_steps: default_output_every_steps(),
                seed_master: default_seed_master(),
                smoke_stub: false,
            },
            physics: PhysicsConfig::default(),
            io: IoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: &Utf8Path) -> Result<Self> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let config: RunConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric fields.
    ///
    /// Errors
    /// ------
    /// * [`FlybyError::InvalidConfig`] for a non-positive step, a negative duration or a
    ///   zero sampling interval.
    pub fn validate(&self) -> Result<()> {
        let run = &self.run;
        if !(run.dt_yr.is_finite() && run.dt_yr > 0.0) {
            return Err(FlybyError::InvalidConfig(format!(
                "run.dt_yr must be positive, got {}",
                run.dt_yr
            )));
        }
        if !(run.duration_yr.is_finite() && run.duration_yr >= 0.0) {
            return Err(FlybyError::InvalidConfig(format!(
                "run.duration_yr must be non-negative, got {}",
                run.duration_yr
            )));
        }
        if run.output_every_steps == 0 {
            return Err(FlybyError::InvalidConfig(
                "run.output_every_steps must be at least 1".to_string(),
            ));
        }
        if self.physics.solar_j2 && !self.physics.j2_value.is_finite() {
            return Err(FlybyError::InvalidConfig(format!(
                "physics.j2_value must be finite, got {}",
                self.physics.j2_value
            )));
        }
        Ok(())
    }
}

/// Deterministic sub-seeds derived from a master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeds {
    pub master: u64,
}

impl Seeds {
    pub fn new(master: u64) -> Self {
        Seeds { master }
    }

    /// `(master + k + 1664525) mod (2³¹ − 1)`
    pub fn derive(&self, k: u64) -> u64 {
        const MODULUS: u64 = (1 << 31) - 1;
        (self.master % MODULUS + k % MODULUS + 1_664_525) % MODULUS
    }
}

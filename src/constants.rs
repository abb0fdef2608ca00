//! # Constants and type definitions for solar_flyby
//!
//! This module centralizes the **physical constants**, **numerical thresholds** and
//! **type aliases** shared by the element converter, the initial-condition loader
//! and the integration engine.
//!
//! ## Units
//!
//! The whole crate works in the canonical heliocentric system:
//!
//! - length: **AU**
//! - time: **year** (Julian year of 365.25 days)
//! - mass: **solar mass**
//!
//! In these units the gravitational constant is `G = 4π²`, so a massless body on a
//! circular orbit at 1 AU has a period of exactly one year.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Gravitational constant in AU³ / (yr² · Msun)
pub const GRAV_CONSTANT: f64 = DPI * DPI;

/// Gravitational parameter of a one solar mass body, AU³ / yr²
pub const MU_SUN: f64 = GRAV_CONSTANT;

/// Speed of light in AU / yr
pub const C_AU_PER_YR: f64 = 63_239.726_3;

/// Solar equatorial radius in AU
pub const R_SUN_AU: f64 = 0.004_650_47;

/// Typical solar J2 coefficient
pub const J2_SUN_DEFAULT: f64 = 2.2e-7;

/// Astronomical Unit in meters (IAU 2012)
pub const AU_METERS: f64 = 149_597_870_700.0;

/// One day expressed in years
pub const DAY: f64 = 1.0 / 365.25;

/// Default amplitude of the positional jitter: 2 cm, in AU
pub const DEFAULT_JITTER_AU: f64 = 0.02 / AU_METERS;

/// Mass of the Earth in solar masses, used by the two-body stub
pub const EARTH_MASS: f64 = 3.003e-6;

// -------------------------------------------------------------------------------------------------
// Numerical thresholds
// -------------------------------------------------------------------------------------------------

/// Floor used for degenerate vectors and guarded divisions
pub const EPS: f64 = 1e-12;

/// Half-width of the eccentricity band treated as parabolic
pub const PARABOLIC_BAND: f64 = 1e-10;

/// Maximum number of Newton iterations for the elliptic Kepler equation
pub const KEPLER_MAX_ITER: usize = 50;

/// Step size below which the elliptic Kepler iteration is considered converged
pub const KEPLER_TOLERANCE: f64 = 1e-14;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in astronomical units
pub type AstronomicalUnit = f64;
/// Time in years
pub type Year = f64;
/// Mass in solar masses
pub type SolarMass = f64;

// -------------------------------------------------------------------------------------------------
// Body identifiers
// -------------------------------------------------------------------------------------------------

/// Name of the central star in the catalogue
pub const SUN: &str = "Sun";
/// Name of the Moon's primary
pub const EARTH: &str = "Earth";
/// Name of the only catalogued satellite
pub const MOON: &str = "Moon";

/// Canonical set of bodies included in a full Solar System run:
/// Sun, the eight planets, the Moon, Pluto, four large main-belt asteroids and six
/// trans-Neptunian objects.
pub const DEFAULT_BODIES: [&str; 21] = [
    // Sun & planets
    "Sun", "Mercury", "Venus", "Earth", "Moon", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune",
    // Dwarfs / MBAs
    "Pluto", "Ceres", "Vesta", "Pallas", "Hygiea",
    // KBOs
    "Eris", "Haumea", "Makemake", "Quaoar", "Gonggong", "Sedna",
];

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_unit_system() {
        // one AU circular orbit around one solar mass has a one year period
        let n = (MU_SUN / 1.0_f64.powi(3)).sqrt();
        assert!((DPI / n - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_jitter_is_two_centimeters() {
        assert!((DEFAULT_JITTER_AU * AU_METERS - 0.02).abs() < 1e-15);
    }
}

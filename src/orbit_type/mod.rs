//! # Orbital state representations
//!
//! This module gathers the two representations the crate converts between:
//!
//! - [`state_vector`](crate::orbit_type::state_vector): Cartesian position and velocity
//!   relative to a central body, and the element → state direction
//!   ([`elements_to_state`](crate::orbit_type::state_vector::elements_to_state)).
//! - [`osculating_element`](crate::orbit_type::osculating_element): osculating
//!   Keplerian elements `(a, e, i, Ω, ω, M)` with the derived quantities
//!   `(n, P, ϖ, f)`, and the state → element direction
//!   ([`state_to_elements`](crate::orbit_type::osculating_element::state_to_elements)).
//!
//! ## Typical workflow
//!
//! ```rust, no_run
//! use nalgebra::Vector3;
//! use solar_flyby::constants::MU_SUN;
//! use solar_flyby::orbit_type::osculating_element::state_to_elements;
//!
//! let r = Vector3::new(1.0, 0.0, 0.0);
//! let v = Vector3::new(0.0, std::f64::consts::TAU, 0.0);
//!
//! let elems = state_to_elements(&r, &v, MU_SUN).unwrap();
//! println!("{elems}");
//! ```
//!
//! ## Degeneracies
//!
//! - **Circular orbits (`e → 0`)**: ω and f are undefined and set to `0.0`.
//! - **Equatorial orbits (`i → 0`)**: Ω is undefined and set to `0.0`; ω is then
//!   measured directly from the reference X axis.
//! - **Parabolic orbits (`e → 1`)**: `a` may be infinite, `n` and `P` are NaN.
use std::fmt;

/// Osculating Keplerian elements and the state → element conversion.
pub mod osculating_element;

/// Cartesian state vectors and the element → state conversion.
pub mod state_vector;

/// Conic section an osculating orbit belongs to.
///
/// The regime is decided on the eccentricity with a narrow band around `e = 1`
/// (see [`PARABOLIC_BAND`](crate::constants::PARABOLIC_BAND)) treated as parabolic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitRegime {
    Elliptic,
    Parabolic,
    Hyperbolic,
}

impl OrbitRegime {
    /// Classify an eccentricity.
    pub fn from_eccentricity(eccentricity: f64) -> Self {
        use crate::constants::PARABOLIC_BAND;

        if eccentricity < 1.0 - PARABOLIC_BAND {
            OrbitRegime::Elliptic
        } else if eccentricity > 1.0 + PARABOLIC_BAND {
            OrbitRegime::Hyperbolic
        } else {
            OrbitRegime::Parabolic
        }
    }
}

impl fmt::Display for OrbitRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrbitRegime::Elliptic => "elliptic",
            OrbitRegime::Parabolic => "parabolic",
            OrbitRegime::Hyperbolic => "hyperbolic",
        };
        write!(f, "{s}")
    }
}

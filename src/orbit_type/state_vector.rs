use nalgebra::Vector3;

use crate::{
    kepler::solve_kepler_equation,
    orbit_type::osculating_element::OsculatingElements,
    ref_system::perifocal_to_reference,
};

/// Cartesian state relative to a central body.
///
/// Units
/// -----
/// * `position`: AU
/// * `velocity`: AU / yr
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Translate this state by the state of its primary.
    ///
    /// Used to move a satellite from its primary-centred frame into the frame the
    /// primary itself is expressed in.
    pub fn offset_by(&self, primary: &StateVector) -> StateVector {
        StateVector {
            position: self.position + primary.position,
            velocity: self.velocity + primary.velocity,
        }
    }
}

/// Convert elliptic Keplerian elements to a Cartesian state vector.
///
/// Kepler's equation is solved with [`solve_kepler_equation`]; the perifocal
/// position and velocity
///
/// ```text
/// r_pf = ( a(cos E − e),  a√(1−e²) sin E, 0 )
/// v_pf = ( −sin E,        √(1−e²) cos E,  0 ) · n·a / (1 − e cos E)
/// ```
///
/// are then rotated to the reference frame with `R_z(Ω) R_x(i) R_z(ω)`.
///
/// Arguments
/// ---------
/// * `semi_major_axis`: a (AU), must be positive.
/// * `eccentricity`: e, `0 ≤ e < 1`.
/// * `inclination`, `ascending_node_longitude`, `periapsis_argument`, `mean_anomaly`:
///   i, Ω, ω, M (radians).
/// * `mu`: gravitational parameter of the two-body problem (AU³/yr²).
///
/// Return
/// ------
/// * The [`StateVector`] at the given mean anomaly. If the Kepler iteration does not
///   converge, the best estimate is used (a warning is logged by the solver).
pub fn elements_to_state(
    semi_major_axis: f64,
    eccentricity: f64,
    inclination: f64,
    ascending_node_longitude: f64,
    periapsis_argument: f64,
    mean_anomaly: f64,
    mu: f64,
) -> StateVector {
    let solution = solve_kepler_equation(mean_anomaly, eccentricity);
    let (sin_e, cos_e) = solution.eccentric_anomaly.sin_cos();

    let a = semi_major_axis;
    let sqrt_one_minus_e2 = (1.0 - eccentricity * eccentricity).sqrt();

    let position_pf = Vector3::new(a * (cos_e - eccentricity), a * sqrt_one_minus_e2 * sin_e, 0.0);

    let mean_motion = (mu / a.powi(3)).sqrt();
    let v_factor = mean_motion * a / (1.0 - eccentricity * cos_e);
    let velocity_pf = Vector3::new(-sin_e, sqrt_one_minus_e2 * cos_e, 0.0) * v_factor;

    let rot = perifocal_to_reference(ascending_node_longitude, inclination, periapsis_argument);

    StateVector {
        position: rot * position_pf,
        velocity: rot * velocity_pf,
    }
}

impl OsculatingElements {
    /// Cartesian state of an elliptic element set.
    ///
    /// See [`elements_to_state`].
    pub fn to_state_vector(&self, mu: f64) -> StateVector {
        elements_to_state(
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
            self.mean_anomaly,
            mu,
        )
    }
}

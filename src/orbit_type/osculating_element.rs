//! # Osculating Keplerian elements
//!
//! This module defines [`OsculatingElements`] and [`state_to_elements`], the
//! conversion from a Cartesian state relative to a central body to the
//! instantaneous two-body orbit matching it.
//!
//! ## Provided quantities
//!
//! | field                      | symbol | range / unit                                |
//! |----------------------------|--------|---------------------------------------------|
//! | `semi_major_axis`          | a      | AU; `> 0` elliptic, `< 0` hyperbolic, `+∞` |
//! | `eccentricity`             | e      | `≥ 0`                                       |
//! | `inclination`              | i      | `[0, π]`                                    |
//! | `ascending_node_longitude` | Ω      | `[0, 2π)`                                   |
//! | `periapsis_argument`       | ω      | `[0, 2π)`                                   |
//! | `mean_anomaly`             | M      | `[0, 2π)`                                   |
//! | `mean_motion`              | n      | rad/yr, NaN for parabolic orbits            |
//! | `period`                   | P      | yr, NaN for non-elliptic orbits             |
//! | `periapsis_longitude`      | ϖ      | `[0, 2π)`                                   |
//! | `true_anomaly`             | f      | `[0, 2π)`                                   |
//!
//! ## Numerical guards
//!
//! Every inverse cosine is fed a clamped argument, degenerate node / eccentricity
//! vectors fall back to conventional zero angles, and near-zero denominators are
//! floored with [`EPS`] instead of raising. Only a vanishing position vector is an
//! error ([`FlybyError::DegenerateOrbit`]).
use nalgebra::Vector3;
use std::fmt;

use crate::{
    constants::{DPI, EPS},
    flyby_errors::{FlybyError, Result},
    kepler::principal_angle,
    orbit_type::OrbitRegime,
};

/// Osculating two-body elements of a body relative to its central mass.
///
/// Computed fresh at each sampling instant, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsculatingElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
    pub period: f64,
    pub periapsis_longitude: f64,
    pub true_anomaly: f64,
    pub regime: OrbitRegime,
}

#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Convert a Cartesian state to osculating Keplerian elements.
///
/// Arguments
/// ---------
/// * `position`: position relative to the central body (AU).
/// * `velocity`: velocity relative to the central body (AU/yr).
/// * `mu`: gravitational parameter `G·(m_central + m_body)` (AU³/yr²), `> 0`.
///
/// Return
/// ------
/// * The [`OsculatingElements`], with every angle in its canonical range.
///
/// Errors
/// ------
/// * [`FlybyError::DegenerateOrbit`] if `|position| < 1e-12`.
///
/// See also
/// --------
/// * [`elements_to_state`](crate::orbit_type::state_vector::elements_to_state) – inverse mapping for elliptic orbits.
pub fn state_to_elements(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    mu: f64,
) -> Result<OsculatingElements> {
    let r_norm = position.norm();
    if r_norm < EPS {
        return Err(FlybyError::DegenerateOrbit {
            position_norm: r_norm,
        });
    }
    let v_norm = velocity.norm();

    let angular_momentum = position.cross(velocity);
    let h_norm = angular_momentum.norm();

    let node_vec = Vector3::z().cross(&angular_momentum);
    let n_norm = node_vec.norm();

    let ecc_vec = velocity.cross(&angular_momentum) / mu - position / r_norm;
    let ecc = ecc_vec.norm();

    // specific orbital energy
    let energy = 0.5 * v_norm.powi(2) - mu / r_norm;
    let sma = if energy.abs() > EPS {
        -mu / (2.0 * energy)
    } else {
        f64::INFINITY
    };

    let inclination = if h_norm < EPS {
        0.0
    } else {
        (angular_momentum.z / h_norm).clamp(-1.0, 1.0).acos()
    };

    let node = if n_norm < EPS {
        0.0
    } else {
        principal_angle(node_vec.y.atan2(node_vec.x))
    };

    let radial_velocity = position.dot(velocity);

    let (true_anomaly, argper) = if ecc > EPS {
        let cosf = (ecc_vec.dot(position) / (ecc * r_norm)).clamp(-1.0, 1.0);
        let sinf = sign(radial_velocity) * (1.0 - cosf * cosf).max(0.0).sqrt();
        let true_anomaly = principal_angle(sinf.atan2(cosf));

        let argper = if n_norm < EPS {
            ecc_vec.y.atan2(ecc_vec.x)
        } else {
            let cosw = (node_vec.dot(&ecc_vec) / (n_norm * ecc)).clamp(-1.0, 1.0);
            let sinw = node_vec.cross(&ecc_vec).dot(&angular_momentum)
                / (n_norm * ecc * h_norm + EPS);
            sinw.atan2(cosw)
        };
        (true_anomaly, principal_angle(argper))
    } else {
        (0.0, 0.0)
    };

    let regime = OrbitRegime::from_eccentricity(ecc);

    let (mean_anomaly, mean_motion, period) = match regime {
        OrbitRegime::Elliptic => {
            let (sinf, cosf) = true_anomaly.sin_cos();
            let denom = 1.0 + ecc * cosf;
            let cos_e = ((ecc + cosf) / denom).clamp(-1.0, 1.0);
            let sin_e = (1.0 - ecc * ecc).max(0.0).sqrt() * sinf / (denom + EPS);
            let ecc_anom = sin_e.atan2(cos_e);

            let mean_anomaly = ecc_anom - ecc * ecc_anom.sin();
            let mean_motion = (mu / sma.powi(3)).sqrt();
            (mean_anomaly, mean_motion, DPI / mean_motion)
        }
        OrbitRegime::Hyperbolic => {
            let a_abs = sma.abs();
            let cosh_h = ((r_norm / a_abs + 1.0) / ecc.max(1.0 + EPS)).max(1.0);
            let mut hyp_anom = cosh_h.acosh();
            if radial_velocity < 0.0 {
                hyp_anom = -hyp_anom;
            }

            let mean_anomaly = ecc * hyp_anom.sinh() - hyp_anom;
            let mean_motion = (mu / a_abs.powi(3)).sqrt();
            (mean_anomaly, mean_motion, f64::NAN)
        }
        OrbitRegime::Parabolic => {
            // Barker's equation
            let d = (0.5 * true_anomaly).tan();
            (d + d.powi(3) / 3.0, f64::NAN, f64::NAN)
        }
    };

    Ok(OsculatingElements {
        semi_major_axis: sma,
        eccentricity: ecc,
        inclination,
        ascending_node_longitude: node,
        periapsis_argument: argper,
        mean_anomaly: principal_angle(mean_anomaly),
        mean_motion,
        period,
        periapsis_longitude: principal_angle(node + argper),
        true_anomaly,
        regime,
    })
}

impl fmt::Display for OsculatingElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rad_to_deg = 180.0 / std::f64::consts::PI;
        writeln!(f, "Osculating Elements ({})", self.regime)?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(
            f,
            "  a   (semi-major axis)       = {:.6} AU",
            self.semi_major_axis
        )?;
        writeln!(
            f,
            "  e   (eccentricity)          = {:.6}",
            self.eccentricity
        )?;
        writeln!(
            f,
            "  i   (inclination)           = {:.6} rad ({:.6}°)",
            self.inclination,
            self.inclination * rad_to_deg
        )?;
        writeln!(
            f,
            "  Ω   (longitude of node)     = {:.6} rad ({:.6}°)",
            self.ascending_node_longitude,
            self.ascending_node_longitude * rad_to_deg
        )?;
        writeln!(
            f,
            "  ω   (argument of periapsis) = {:.6} rad ({:.6}°)",
            self.periapsis_argument,
            self.periapsis_argument * rad_to_deg
        )?;
        writeln!(
            f,
            "  M   (mean anomaly)          = {:.6} rad ({:.6}°)",
            self.mean_anomaly,
            self.mean_anomaly * rad_to_deg
        )?;
        writeln!(
            f,
            "  f   (true anomaly)          = {:.6} rad ({:.6}°)",
            self.true_anomaly,
            self.true_anomaly * rad_to_deg
        )?;
        writeln!(f, "  n   (mean motion)           = {:.6} rad/yr", self.mean_motion)?;
        write!(f, "  P   (period)                = {:.6} yr", self.period)
    }
}

#[cfg(test)]
pub(crate) mod osculating_element_test {
    use super::*;
    use crate::constants::MU_SUN;
    use crate::orbit_type::state_vector::elements_to_state;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    pub(crate) fn assert_angles_normalized(elems: &OsculatingElements) {
        for angle in [
            elems.ascending_node_longitude,
            elems.periapsis_argument,
            elems.mean_anomaly,
            elems.periapsis_longitude,
            elems.true_anomaly,
        ] {
            assert!((0.0..DPI).contains(&angle), "angle {angle} out of [0, 2π)");
        }
        assert!((0.0..=PI).contains(&elems.inclination));
    }

    #[test]
    fn test_elements_circular() {
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, DPI, 0.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();

        assert!((elems.semi_major_axis - 1.0).abs() < 1e-6);
        assert!(elems.eccentricity < 1e-6);
        assert_eq!(elems.inclination, 0.0);
        assert_eq!(elems.ascending_node_longitude, 0.0);
        assert_eq!(elems.regime, OrbitRegime::Elliptic);
        assert_relative_eq!(elems.period, 1.0, epsilon = 1e-12);
        assert_angles_normalized(&elems);
    }

    #[test]
    fn test_degenerate_position() {
        let r = Vector3::new(0.0, 0.0, 0.0);
        let v = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(
            state_to_elements(&r, &v, MU_SUN),
            Err(FlybyError::DegenerateOrbit { position_norm: 0.0 })
        );
    }

    #[test]
    fn test_inclined_eccentric_round_trip() {
        let (a, e, i, node, argper, mean) = (2.7, 0.25, 0.3, 1.2, 4.0, 5.5);
        let state = elements_to_state(a, e, i, node, argper, mean, MU_SUN);
        let elems = state_to_elements(&state.position, &state.velocity, MU_SUN).unwrap();

        assert_relative_eq!(elems.semi_major_axis, a, max_relative = 1e-10);
        assert_relative_eq!(elems.eccentricity, e, epsilon = 1e-10);
        assert_relative_eq!(elems.inclination, i, epsilon = 1e-10);
        assert_relative_eq!(elems.ascending_node_longitude, node, epsilon = 1e-9);
        assert_relative_eq!(elems.periapsis_argument, argper, epsilon = 1e-9);
        assert_relative_eq!(elems.mean_anomaly, mean, epsilon = 1e-9);
        assert_relative_eq!(elems.periapsis_longitude, principal_angle(node + argper), epsilon = 1e-9);
    }

    #[test]
    fn test_equatorial_eccentric_uses_eccentricity_vector() {
        // periapsis along +y in the reference plane
        let state = elements_to_state(1.0, 0.5, 0.0, 0.0, PI / 2.0, 0.0, MU_SUN);
        let elems = state_to_elements(&state.position, &state.velocity, MU_SUN).unwrap();
        assert_eq!(elems.ascending_node_longitude, 0.0);
        assert_relative_eq!(elems.periapsis_argument, PI / 2.0, epsilon = 1e-10);
        // at periapsis; rounding may land just below 2π
        let f = elems.true_anomaly;
        assert!(f < 1e-7 || f > DPI - 1e-7);
    }

    #[test]
    fn test_hyperbolic_branch() {
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, 10.0, 1.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();

        assert_eq!(elems.regime, OrbitRegime::Hyperbolic);
        assert!(elems.semi_major_axis < 0.0);
        assert!(elems.eccentricity > 1.0);
        assert!(elems.period.is_nan());
        assert!(elems.mean_motion > 0.0);
        assert_angles_normalized(&elems);
    }

    #[test]
    fn test_hyperbolic_inbound_mean_anomaly_sign() {
        let r = Vector3::new(3.0, 1.0, 0.0);
        let v = Vector3::new(-9.0, 1.0, 0.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();
        assert_eq!(elems.regime, OrbitRegime::Hyperbolic);
        // inbound: true anomaly in (π, 2π), mean anomaly wrapped from a negative value
        assert!(elems.true_anomaly > PI);
        assert_angles_normalized(&elems);
    }

    #[test]
    fn test_parabolic_branch() {
        // escape speed at 1 AU
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, (2.0 * MU_SUN).sqrt(), 0.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();

        assert_eq!(elems.regime, OrbitRegime::Parabolic);
        assert!(elems.semi_major_axis.is_infinite());
        assert!(elems.mean_motion.is_nan());
        assert!(elems.period.is_nan());
        // at periapsis: f = 0 and Barker's M = 0
        assert!(elems.mean_anomaly < 1e-6 || elems.mean_anomaly > DPI - 1e-6);
    }

    #[test]
    fn test_retrograde_inclination() {
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, -DPI, 0.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();
        assert_relative_eq!(elems.inclination, PI, epsilon = 1e-12);
        assert_angles_normalized(&elems);
    }

    #[test]
    fn test_display() {
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, DPI, 0.0);
        let elems = state_to_elements(&r, &v, MU_SUN).unwrap();
        let output = format!("{elems}");
        assert!(output.starts_with("Osculating Elements (elliptic)"));
        assert!(output.contains("a   (semi-major axis)       = 1.000000 AU"));
    }
}

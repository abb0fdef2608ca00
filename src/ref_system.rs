//! Frame rotations between the perifocal frame of an orbit and the reference frame.
//!
//! The reference frame is the one the catalogue elements are expressed in (ecliptic
//! J2000 for the shipped catalogue). The perifocal frame has its X axis toward
//! periapsis, its Z axis along the orbital angular momentum.
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::Radian;

/// Cartesian axis a rotation is taken about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Rotation matrix of angle `alpha` about a coordinate axis.
///
/// The rotation is applied to the vector in a fixed frame (active rotation):
/// `rotmt(π/2, Axis::Z) · x̂ = ŷ`.
///
/// # See also
/// * [`perifocal_to_reference`] – the 3-1-3 composition used for orbits
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation from the perifocal frame to the reference frame.
///
/// Builds the classical 3-1-3 sequence `R = R_z(Ω) · R_x(i) · R_z(ω)`.
///
/// Arguments
/// ---------
/// * `ascending_node_longitude`: Ω (radians).
/// * `inclination`: i (radians).
/// * `periapsis_argument`: ω (radians).
pub fn perifocal_to_reference(
    ascending_node_longitude: Radian,
    inclination: Radian,
    periapsis_argument: Radian,
) -> Matrix3<f64> {
    rotmt(ascending_node_longitude, Axis::Z)
        * rotmt(inclination, Axis::X)
        * rotmt(periapsis_argument, Axis::Z)
}

#![allow(dead_code)]

use std::io::Write;

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use solar_flyby::{
    constants::{EARTH_MASS, GRAV_CONSTANT},
    engine::{whfast::WisdomHolman, PhysicsEngine},
    orbit_type::{osculating_element::OsculatingElements, state_vector::elements_to_state},
};

pub fn assert_elements_close(
    actual: &OsculatingElements,
    expected: &OsculatingElements,
    epsilon: f64,
) {
    assert_eq!(actual.regime, expected.regime);
    assert_relative_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.eccentricity,
        expected.eccentricity,
        epsilon = epsilon
    );
    assert_relative_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert_relative_eq!(
        actual.ascending_node_longitude,
        expected.ascending_node_longitude,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.periapsis_argument,
        expected.periapsis_argument,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.mean_anomaly,
        expected.mean_anomaly,
        epsilon = epsilon
    );
}

/// Sun + Earth-like planet (a = 1, e = 0.0167) in the centre-of-mass frame.
pub fn earth_like_engine(dt: f64) -> WisdomHolman {
    let mut engine = WisdomHolman::new(GRAV_CONSTANT, dt);
    let state = elements_to_state(
        1.0,
        0.0167,
        0.0,
        0.0,
        0.0,
        0.0,
        GRAV_CONSTANT * (1.0 + EARTH_MASS),
    );
    engine.add_body(1.0, Default::default(), Default::default());
    engine.add_body(EARTH_MASS, state.position, state.velocity);
    engine.move_to_com();
    engine
}

/// Write `content` to `name` inside a fresh temporary directory.
pub fn write_temp_file(name: &str, content: &str) -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

pub const SMALL_CATALOG: &str = "\
name,a_AU,e,i_deg,Omega_deg,omega_deg,M_deg,m_Msun
Sun,0,0,0,0,0,0,1.0
Earth,1.00000261,0.01671123,0.00001531,-11.26064,102.94719,100.46457,3.003489e-6
Moon,0.00256955,0.0549,5.145,125.08,318.15,135.27,3.694303e-8
Mars,1.52371034,0.09339410,1.84969142,49.55953891,286.4968315,19.39019754,3.227154e-7
Jupiter,5.20288700,0.04838624,1.30439695,100.47390909,273.8671,19.66796068,9.547919e-4
Phobos,0.0000627,0.0151,1.093,16.946,157.116,91.059,5.4e-15
";
